//! Reads the line-oriented animation text format into an [AnimationSequence].
//!
//! A file is a mix of two kinds of line, told apart by their first
//! whitespace-separated token:
//!
//! - **metadata**, when the first token is not a number. These are
//!   `key=value` pairs that switch on optional per-joint columns or set the
//!   point aspect ratio:
//!
//!   ```text
//!   sizeData=true
//!   colorData=T
//!   shapeData=false
//!   luminanceData=true
//!   pointAspectRatio=1.33
//!   ```
//!
//! - **data rows**, when the first token is a number. The first token is the
//!   frame time in seconds, followed by one chunk of columns per joint and an
//!   optional trailing frame luminance:
//!
//!   ```text
//!   <time> (<x> <y> [<extra>...])+ [<luminance>]
//!   ```
//!
//! Every chunk has `2 + n` columns, where `n` is the number of optional
//! columns switched on. Extra columns hold a color `(r,g,b)`, a size
//! `size<float>`, or a shape name (`DOT`, `CROSS`, `SQUARE`, `DIAMOND`), in any
//! order. `-` fills any slot that has no data, and an `x` or `y` of `-` makes
//! the whole joint blank for that frame.
//!
//! The parser is lenient. A chunk whose location can't be read
//! ends the row, and the first number from that point on is taken as the
//! frame luminance. A row whose column count has drifted is therefore read
//! on a best-effort basis rather than rejected; a corrupt coordinate is
//! indistinguishable from the start of the trailing luminance.

use crate::animation_frame::AnimationFrame;
use crate::animation_point::{AnimationPoint, Color, Point, Shape};
use crate::animation_sequence::AnimationSequence;

use log::{debug, info, trace, warn};
use nom::{
    bytes::complete::{tag, take_till1, take_while_m_n},
    character::complete::{char, digit0, multispace0},
    combinator::{all_consuming, map, map_opt, map_res, opt, recognize, rest},
    number::complete::{double, float},
    sequence::{pair, preceded, separated_pair, tuple},
    Finish, IResult,
};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

const SIZE_DATA_KEY: &str = "sizedata";
const COLOR_DATA_KEY: &str = "colordata";
const LUMINANCE_DATA_KEY: &str = "luminancedata";
const SHAPE_DATA_KEY: &str = "shapedata";
const ASPECT_RATIO_KEY: &str = "pointaspectratio";

/// The placeholder for "no data" in any slot.
const PLACEHOLDER: &str = "-";

/// Selects where luminance lives in a data file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    /// Luminance is per frame, read from the end of each row. It never adds
    /// a per-joint column.
    #[default]
    Point,
    /// Luminance is per joint. `luminanceData=true` adds one column to every
    /// joint, holding a bare number.
    Dot,
}

/// The optional per-joint columns a file declares in its metadata.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DataColumns {
    /// `sizeData`
    pub size: bool,
    /// `colorData`
    pub color: bool,
    /// `luminanceData`
    pub luminance: bool,
    /// `shapeData`
    pub shape: bool,
}

impl DataColumns {
    /// The number of tokens every joint occupies in a data row.
    pub fn columns_per_joint(&self, variant: Variant) -> usize {
        2 + usize::from(self.size)
            + usize::from(self.color)
            + usize::from(self.shape)
            + usize::from(variant == Variant::Dot && self.luminance)
    }
}

/// Errors that stop a file from being parsed at all. Problems within a file
/// are logged and recovered from, never returned.
#[derive(Debug)]
pub enum ParseError {
    /// The animation file does not exist.
    NotFound(PathBuf),

    /// Reading the animation failed.
    Io(io::Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::NotFound(path) => {
                write!(f, "animation file not found: {}", path.display())
            }
            ParseError::Io(error) => write!(f, "animation file reading error: {}", error),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::NotFound(_) => None,
            ParseError::Io(error) => Some(error),
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Parses `path` with the default [Variant], see [AnimationParser::parse_file].
pub fn parse_file(
    path: impl AsRef<Path>,
    aspect_ratio: Option<f32>,
) -> Result<AnimationSequence, ParseError> {
    AnimationParser::new()
        .aspect_ratio(aspect_ratio)
        .parse_file(path)
}

/// A configured parser. Cheap to build; holds no state between parses.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct AnimationParser {
    variant: Variant,
    aspect_override: Option<f32>,
}

/// Mutable state carried from line to line.
struct ParseState {
    columns: DataColumns,
    aspect: f32,
    frames: Vec<AnimationFrame>,
}

/// The outcome of reading one joint's chunk.
enum Chunk {
    /// A joint, and how many tokens it used.
    Joint(AnimationPoint, usize),
    /// No joint here; the rest of the row is trailing data.
    Trailing,
}

impl AnimationParser {
    /// A parser for the [Variant::Point] layout with no aspect override.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets where luminance is read from.
    pub fn variant(self, variant: Variant) -> Self {
        AnimationParser { variant, ..self }
    }

    /// Forces the point aspect ratio, ignoring any `pointAspectRatio` in the
    /// file. Non-positive values count as no override.
    pub fn aspect_ratio(self, aspect_ratio: Option<f32>) -> Self {
        AnimationParser {
            aspect_override: aspect_ratio.filter(|a| *a > 0.0),
            ..self
        }
    }

    /// Parses the file at `path`. The sequence is named after the file name.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<AnimationSequence, ParseError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|error| match error.kind() {
            io::ErrorKind::NotFound => ParseError::NotFound(path.to_path_buf()),
            _ => ParseError::Io(error),
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.parse_reader(name, BufReader::new(file))
    }

    /// Parses every line of `reader`.
    pub fn parse_reader(
        &self,
        name: impl Into<String>,
        reader: impl BufRead,
    ) -> Result<AnimationSequence, ParseError> {
        let mut state = self.start();
        for line in reader.lines() {
            self.parse_line(&mut state, &line?);
        }
        Ok(self.finish(name.into(), state))
    }

    /// Parses in-memory text. Can't fail, every line is recovered from.
    pub fn parse_str(&self, name: impl Into<String>, text: &str) -> AnimationSequence {
        let mut state = self.start();
        for line in text.lines() {
            self.parse_line(&mut state, line);
        }
        self.finish(name.into(), state)
    }

    fn start(&self) -> ParseState {
        ParseState {
            columns: DataColumns::default(),
            aspect: self.aspect_override.unwrap_or(1.0),
            frames: Vec::new(),
        }
    }

    fn finish(&self, name: String, state: ParseState) -> AnimationSequence {
        let sequence = AnimationSequence::new(name, state.frames, state.aspect)
            .with_layout(state.columns, self.variant);
        info!(
            "{} : parsed {} frames of {} joints (aspect {}).",
            sequence.source_name(),
            sequence.num_frames(),
            sequence.joint_count(),
            sequence.point_aspect()
        );
        sequence
    }

    fn parse_line(&self, state: &mut ParseState, line: &str) {
        trace!("{}", line);

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = tokens.first() else {
            return;
        };

        match time_token(first) {
            Some(seconds) => {
                let frame = self.parse_row(state, seconds, &tokens[1..]);
                state.frames.push(frame);
            }
            None => self.apply_metadata(state, line.trim()),
        }
    }

    fn apply_metadata(&self, state: &mut ParseState, line: &str) {
        let Ok((_, (key, value))) = key_value(line).finish() else {
            warn!("Skipping malformed metadata line `{}`", line);
            return;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        let flag = value.contains(|c: char| c == 't' || c == 'T');

        if key.contains(SIZE_DATA_KEY) {
            state.columns.size = flag;
        } else if key.contains(COLOR_DATA_KEY) {
            state.columns.color = flag;
        } else if key.contains(LUMINANCE_DATA_KEY) {
            state.columns.luminance = flag;
        } else if key.contains(SHAPE_DATA_KEY) {
            state.columns.shape = flag;
        } else if key.contains(ASPECT_RATIO_KEY) {
            if self.aspect_override.is_some() {
                debug!("Aspect ratio overridden, ignoring `{}`", line);
                return;
            }
            match value.parse::<f32>() {
                Ok(aspect) if aspect > 0.0 => state.aspect = aspect,
                _ => warn!("Skipping invalid aspect ratio `{}`", line),
            }
        } else {
            warn!("Skipping unrecognized metadata line `{}`", line);
        }
    }

    /// Reads one data row, `tokens` being everything after the time.
    fn parse_row(&self, state: &ParseState, seconds: f32, tokens: &[&str]) -> AnimationFrame {
        let per_joint = state.columns.columns_per_joint(self.variant);
        let mut points = Vec::new();
        let mut luminance = None;
        let mut pos = 0;

        while pos < tokens.len() {
            match self.parse_joint(state, &tokens[pos..], per_joint) {
                Chunk::Joint(point, consumed) => {
                    points.push(point);
                    pos += consumed;
                }
                Chunk::Trailing => {
                    luminance = tokens[pos..].iter().find_map(|t| float_token(t));
                    debug!(
                        "Row at {}s ends after {} joints, luminance {:?}",
                        seconds,
                        points.len(),
                        luminance
                    );
                    break;
                }
            }
        }

        AnimationFrame::from_seconds(seconds, points, luminance)
    }

    /// Reads the joint starting at `tokens[0]`.
    fn parse_joint(&self, state: &ParseState, tokens: &[&str], per_joint: usize) -> Chunk {
        let columns = state.columns;
        let x_token = tokens[0];
        let Some(&y_token) = tokens.get(1) else {
            return Chunk::Trailing;
        };

        // blanks still occupy a full chunk so later joints stay aligned
        if x_token == PLACEHOLDER || y_token == PLACEHOLDER {
            return Chunk::Joint(AnimationPoint::blank(), per_joint.min(tokens.len()));
        }

        let (Some(x), Some(y)) = (float_token(x_token), float_token(y_token)) else {
            return Chunk::Trailing;
        };
        let location = Point::new(x, y / f64::from(state.aspect));

        let mut color = None;
        let mut size = None;
        let mut shape = None;
        let mut luminance = None;

        // extra tokens are concatenated until they match, so `(255, 0, 0)`
        // and `size 2` may be split over several tokens
        let mut pending = String::new();
        let mut dangling = false;
        let mut cols = 2;
        let mut idx = 2;

        while cols < per_joint {
            let Some(&token) = tokens.get(idx) else {
                break;
            };
            idx += 1;

            if token == PLACEHOLDER {
                cols += 1;
                continue;
            }

            if shape.is_none() {
                if let Ok(s) = token.parse::<Shape>() {
                    shape = Some(s);
                    cols += 1;
                    continue;
                }
            }

            if self.variant == Variant::Dot && columns.luminance && luminance.is_none() && !dangling
            {
                if let Some(lum) = float_token(token) {
                    luminance = Some(lum);
                    cols += 1;
                    continue;
                }
            }

            pending.push_str(token);
            dangling = true;

            if columns.color && color.is_none() {
                if let Some(c) = find(&pending, color_pattern) {
                    color = Some(c);
                    cols += 1;
                    dangling = false;
                }
            }

            if columns.size && size.is_none() {
                if let Some(s) = find(&pending, size_pattern) {
                    size = Some(s);
                    cols += 1;
                    dangling = false;
                }
            }
        }

        let point = AnimationPoint::new(Some(location), color, size, shape.unwrap_or_default())
            .with_luminance(luminance);
        Chunk::Joint(point, idx)
    }
}

/// A whole token that is a frame time. Times are single precision.
fn time_token(token: &str) -> Option<f32> {
    all_consuming(float::<&str, nom::error::Error<&str>>)(token).finish().ok().map(|(_, t)| t)
}

/// A whole token that is a floating-point number.
fn float_token(token: &str) -> Option<f64> {
    number(token).finish().ok().map(|(_, n)| n)
}

fn number(s: &str) -> IResult<&str, f64> {
    all_consuming(double)(s)
}

fn key_value(s: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(take_till1(|c: char| c == '='), char('='), rest)(s)
}

fn color_component(s: &str) -> IResult<&str, f64> {
    map_res(take_while_m_n(1, 3, |c: char| c.is_ascii_digit()), |d: &str| {
        d.parse::<f64>()
    })(s)
}

/// `(r,g,b)`, the parentheses being optional.
fn color_pattern(s: &str) -> IResult<&str, Color> {
    map(
        tuple((
            opt(char('(')),
            color_component,
            preceded(pair(char(','), multispace0), color_component),
            preceded(pair(char(','), multispace0), color_component),
            opt(char(')')),
        )),
        |(_, r, g, b, _)| Color::new(r, g, b),
    )(s)
}

/// `size<float>`
fn size_pattern(s: &str) -> IResult<&str, f64> {
    preceded(
        pair(tag("size"), multispace0),
        map_opt(recognize(tuple((digit0, opt(char('.')), digit0))), |n: &str| {
            n.parse::<f64>().ok()
        }),
    )(s)
}

/// The first match of `parser` anywhere in `text`.
fn find<'a, O>(text: &'a str, mut parser: impl FnMut(&'a str) -> IResult<&'a str, O>) -> Option<O> {
    text.char_indices()
        .find_map(|(i, _)| parser(&text[i..]).ok().map(|(_, o)| o))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn parse(text: &str) -> AnimationSequence {
        AnimationParser::new().parse_str("test.txt", text)
    }

    fn joint(seq: &AnimationSequence, frame: usize, joint: usize) -> AnimationPoint {
        seq.frame_at_index(frame).unwrap().joint_locations()[joint].clone()
    }

    #[test]
    fn plain_rows_interpolate() {
        let seq = parse("0.0 1.0 2.0\n1.0 3.0 4.0\n");
        assert_eq!(seq.num_frames(), 2);
        assert_eq!(seq.frame_at_index(0).unwrap().time_millis(), 0);
        assert_eq!(seq.frame_at_index(1).unwrap().time_millis(), 1000);

        let mid = seq.frame_at_time(500).unwrap();
        assert_eq!(mid.joint_locations()[0].location(), Some(Point::new(2.0, 3.0)));
    }

    #[test]
    fn row_times_truncate_like_single_precision() {
        let seq = parse("0.033 1 1\n0.7 2 2\n");
        let times: Vec<i64> = seq.frames().iter().map(|f| f.time_millis()).collect();
        assert_eq!(times, vec![32, 699]);
        assert_eq!(seq.total_animation_time(), 699);
    }

    #[test]
    fn placeholder_makes_blank_joint() {
        let seq = parse("0.5 1.0 - \n");
        let frame = seq.frame_at_index(0).unwrap();
        assert_eq!(frame.time_millis(), 500);
        assert_eq!(frame.joint_locations()[0].location(), None);
    }

    #[test]
    fn color_column() {
        let seq = parse("colorData=true\n0.0 1.0 2.0 (255,0,0)\n");
        assert_eq!(
            joint(&seq, 0, 0).color(),
            Some(Color::new(255.0, 0.0, 0.0))
        );
        assert!(seq.columns().color);
    }

    #[test]
    fn size_columns_keep_alignment() {
        let seq = parse("sizeData=T\n0.0 1 2 size1.5 3 4 - 5 6 size2 0.8\n");
        let frame = seq.frame_at_index(0).unwrap();
        assert_eq!(frame.joint_locations().len(), 3);
        assert_eq!(joint(&seq, 0, 0).size(), Some(1.5));
        assert_eq!(joint(&seq, 0, 1).location(), Some(Point::new(3.0, 4.0)));
        assert_eq!(joint(&seq, 0, 1).size(), None);
        assert_eq!(joint(&seq, 0, 2).size(), Some(2.0));
        assert_eq!(frame.luminance(), Some(0.8));
    }

    #[test]
    fn blank_joint_consumes_full_chunk() {
        let seq = parse("colorData=t\nsizeData=t\n0.0 - - (1,2,3) size2 7 8 - size3\n");
        assert_eq!(joint(&seq, 0, 0), AnimationPoint::blank());
        let second = joint(&seq, 0, 1);
        assert_eq!(second.location(), Some(Point::new(7.0, 8.0)));
        assert_eq!(second.color(), None);
        assert_eq!(second.size(), Some(3.0));
    }

    #[test]
    fn split_tokens_are_concatenated() {
        let seq = parse("colorData=true\nsizeData=true\n0.0 1 2 (10, 20, 30) size 4\n");
        let p = joint(&seq, 0, 0);
        assert_eq!(p.color(), Some(Color::new(10.0, 20.0, 30.0)));
        assert_eq!(p.size(), Some(4.0));
        assert_eq!(seq.frame_at_index(0).unwrap().joint_locations().len(), 1);
    }

    #[test]
    fn shapes_in_any_slot() {
        let seq = parse("shapeData=true\ncolorData=true\n0 1 1 cross (1,1,1) 2 2 (9,9,9) Diamond\n");
        assert_eq!(joint(&seq, 0, 0).shape(), Shape::Cross);
        assert_eq!(joint(&seq, 0, 1).shape(), Shape::Diamond);
        assert_eq!(joint(&seq, 0, 1).color(), Some(Color::new(9.0, 9.0, 9.0)));
    }

    #[test]
    fn trailing_luminance_after_markers() {
        let seq = parse("0.1 1 2 3 4 0.25 PIT\n0.2 1 2 3 4 0.5\n");
        let f0 = seq.frame_at_index(0).unwrap();
        assert_eq!(f0.joint_locations().len(), 2);
        assert_eq!(f0.luminance(), Some(0.25));
        let f1 = seq.frame_at_index(1).unwrap();
        assert_eq!(f1.joint_locations().len(), 2);
        assert_eq!(f1.luminance(), Some(0.5));
    }

    #[test]
    fn metadata_keys_ignore_case_and_junk() {
        let seq = parse("SIZEDATA = True\n# a comment\nbogus\n0 1 2 size3\n");
        assert!(seq.columns().size);
        assert_eq!(joint(&seq, 0, 0).size(), Some(3.0));
    }

    #[test]
    fn false_flags_add_no_columns() {
        let seq = parse("sizeData=false\ncolorData=F\n0 1 2 3 4\n");
        assert_eq!(seq.frame_at_index(0).unwrap().joint_locations().len(), 2);
    }

    #[test]
    fn luminance_flag_is_frame_level_for_point_variant() {
        let seq = parse("luminanceData=true\n0 1 2 3 4 0.7\n");
        let f = seq.frame_at_index(0).unwrap();
        assert_eq!(f.joint_locations().len(), 2);
        assert_eq!(f.luminance(), Some(0.7));
    }

    #[test]
    fn dot_variant_reads_point_luminance() {
        let seq = AnimationParser::new()
            .variant(Variant::Dot)
            .parse_str("dots", "luminanceData=true\n0 1 2 0.5 3 4 -\n");
        assert_eq!(seq.variant(), Variant::Dot);
        let f = seq.frame_at_index(0).unwrap();
        assert_eq!(f.joint_locations().len(), 2);
        assert_eq!(f.joint_locations()[0].luminance(), Some(0.5));
        assert_eq!(f.joint_locations()[1].luminance(), None);
        assert_eq!(f.luminance(), None);
    }

    #[test]
    fn aspect_ratio_from_file_and_override() {
        let text = "pointAspectRatio=2\n0 1 4\n";
        let seq = parse(text);
        assert_eq!(seq.point_aspect(), 2.0);
        assert_eq!(joint(&seq, 0, 0).location(), Some(Point::new(1.0, 2.0)));

        let seq = AnimationParser::new()
            .aspect_ratio(Some(4.0))
            .parse_str("over", text);
        assert_eq!(seq.point_aspect(), 4.0);
        assert_eq!(joint(&seq, 0, 0).location(), Some(Point::new(1.0, 1.0)));

        let seq = parse("pointAspectRatio=0\n0 1 4\n");
        assert_eq!(seq.point_aspect(), 1.0);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let seq = parse("\n0 1 1\n   \n1 2 2\n");
        assert_eq!(seq.num_frames(), 2);
    }

    #[test]
    fn parsed_times_are_monotonic() {
        let seq = parse("0.2 1 1\n0.1 2 2\n0.3 3 3\n");
        assert!(seq
            .frames()
            .windows(2)
            .all(|w| w[0].time_millis() <= w[1].time_millis()));
    }

    #[test]
    fn reader_and_file_sources() {
        let seq = AnimationParser::new()
            .parse_reader("cursor", Cursor::new("0 1 1\n1 2 2\n"))
            .unwrap();
        assert_eq!(seq.source_name(), "cursor");
        assert_eq!(seq.total_animation_time(), 1000);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "colorData=true").unwrap();
        writeln!(file, "0.0 0 0 (1,2,3)").unwrap();
        writeln!(file, "0.5 2 2 (3,2,1)").unwrap();
        let seq = parse_file(file.path(), None).unwrap();
        let expected_name = file.path().file_name().unwrap().to_string_lossy();
        assert_eq!(seq.source_name(), expected_name);
        assert_eq!(seq.num_frames(), 2);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        match parse_file(&path, None) {
            Err(ParseError::NotFound(p)) => assert_eq!(p, path),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn patterns() {
        assert_eq!(find("xx(1,22,255)", color_pattern), Some(Color::new(1.0, 22.0, 255.0)));
        assert_eq!(find("4,5,6", color_pattern), Some(Color::new(4.0, 5.0, 6.0)));
        assert_eq!(find("(1,2)", color_pattern), None);
        assert_eq!(find("size0.5", size_pattern), Some(0.5));
        assert_eq!(find("size", size_pattern), None);
        assert_eq!(find("size.", size_pattern), None);
        assert_eq!(float_token("-"), None);
        assert_eq!(float_token("1.5e1"), Some(15.0));
        assert_eq!(float_token("1.5x"), None);
        assert_eq!(time_token("0.25"), Some(0.25f32));
        assert_eq!(time_token("size"), None);
    }
}
