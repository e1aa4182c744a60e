//! An [AnimationSequence] is the parsed form of one animation file: an ordered
//! list of [AnimationFrame]s that can be sampled at any time between the first
//! and last frame.
//!
//! Sampling between two recorded frames builds a brand new frame by blending
//! each joint's attributes, see [crate::interpolation] for the rules. The
//! sequence also knows its bounding box (squared off and padded, for setting
//! up a projection) and its strike time, the moment the first joint is at its
//! lowest point.

use crate::animation_frame::AnimationFrame;
use crate::animation_parser::{DataColumns, Variant};
use crate::animation_point::{AnimationPoint, Point};
use crate::interpolation::{blend, blend_shape};

use log::warn;
use std::{fmt, sync::OnceLock};

/// Padding added to each of the four sides of the extents.
pub const EXTENT_BUFFER: f64 = 0.75;

/// Bounds of a sequence. `(x, y)` is the LOWER LEFT corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extents {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Extents {
    /// The centre of the box.
    pub fn center(&self) -> Point {
        Point::new(self.x + 0.5 * self.width, self.y + 0.5 * self.height)
    }
}

/// Returned when asking for a frame that isn't there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// The requested index was not in `0..len`.
    FrameOutOfRange {
        /// The index asked for
        index: usize,
        /// The number of frames in the sequence
        len: usize,
    },
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SequenceError::FrameOutOfRange { index, len } => write!(
                f,
                "frame number {} out of range, must be between 0 and {}",
                index, len
            ),
        }
    }
}

impl std::error::Error for SequenceError {}

/// Results of the one-time scan over every located point.
#[derive(Debug, Clone, Copy, Default)]
struct ExtentScan {
    extents: Option<Extents>,
    strike_time: Option<i64>,
}

/// A time-sorted sequence of frames. Immutable once built, so it can be
/// shared freely between the parser's cache and any number of renderers.
#[derive(Debug, Clone)]
pub struct AnimationSequence {
    source: String,
    frames: Vec<AnimationFrame>,
    point_aspect: f32,
    columns: DataColumns,
    variant: Variant,
    scan: OnceLock<ExtentScan>,
}

impl AnimationSequence {
    /// Builds a sequence from frames in any order. Frames are stable-sorted by
    /// time, and frames with fewer joints than the widest frame are padded
    /// with blank joints so every frame has the same joint count.
    pub fn new(source: impl Into<String>, mut frames: Vec<AnimationFrame>, point_aspect: f32) -> Self {
        let source = source.into();

        if frames
            .windows(2)
            .any(|w| w[0].time_millis() > w[1].time_millis())
        {
            warn!("{} : frames out of time order, sorting.", source);
            frames.sort_by_key(|f| f.time_millis());
        }

        let joints = frames
            .iter()
            .map(|f| f.joint_locations().len())
            .max()
            .unwrap_or(0);
        for frame in frames.iter_mut() {
            frame.pad_to(joints);
        }

        AnimationSequence {
            source,
            frames,
            point_aspect,
            columns: DataColumns::default(),
            variant: Variant::default(),
            scan: OnceLock::new(),
        }
    }

    /// Records the column layout and variant the sequence was parsed with.
    pub fn with_layout(self, columns: DataColumns, variant: Variant) -> Self {
        AnimationSequence {
            columns,
            variant,
            ..self
        }
    }

    /// The name of the file this sequence was read from.
    pub fn source_name(&self) -> &str {
        &self.source
    }

    /// The aspect ratio the y coordinates were divided by when parsing.
    pub fn point_aspect(&self) -> f32 {
        self.point_aspect
    }

    /// Which optional per-joint columns the source declared.
    pub fn columns(&self) -> DataColumns {
        self.columns
    }

    #[allow(missing_docs)]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    #[allow(missing_docs)]
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// The number of joints in every frame.
    pub fn joint_count(&self) -> usize {
        self.frames
            .first()
            .map_or(0, |f| f.joint_locations().len())
    }

    /// All recorded frames, in time order.
    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    /// The recorded frame at `index`.
    pub fn frame_at_index(&self, index: usize) -> Result<&AnimationFrame, SequenceError> {
        self.frames.get(index).ok_or(SequenceError::FrameOutOfRange {
            index,
            len: self.frames.len(),
        })
    }

    /// A frame for `time` milliseconds after the start of the animation,
    /// interpolated if `time` falls between two recorded frames.
    ///
    /// Returns `None` before the first frame or after the last one; there is
    /// no extrapolation. A time that lands exactly on a recorded frame returns
    /// a copy of that frame.
    pub fn frame_at_time(&self, time: i64) -> Option<AnimationFrame> {
        let first = self.frames.first()?;
        let last = self.frames.last()?;
        if time < first.time_millis() || time > last.time_millis() {
            return None;
        }

        // first frame at or after `time`
        let idx = self.frames.partition_point(|f| f.time_millis() < time);
        let frame2 = &self.frames[idx];
        if frame2.time_millis() == time {
            return Some(frame2.clone());
        }

        // `time` is strictly after frames[0], so idx >= 1
        let frame1 = &self.frames[idx - 1];
        Some(Self::interpolate(frame1, frame2, time))
    }

    /// Blends two frames into a new frame at `time`, which must lie strictly
    /// between their times.
    fn interpolate(frame1: &AnimationFrame, frame2: &AnimationFrame, time: i64) -> AnimationFrame {
        // in f64, extreme times would overflow i64
        let start = frame1.time_millis() as f64;
        let alpha = (time as f64 - start) / (frame2.time_millis() as f64 - start);

        let luminance = blend(frame1.luminance(), frame2.luminance(), alpha);

        let points = frame1
            .joint_locations()
            .iter()
            .zip(frame2.joint_locations())
            .map(|(dot1, dot2)| {
                AnimationPoint::new(
                    blend(dot1.location(), dot2.location(), alpha),
                    blend(dot1.color(), dot2.color(), alpha),
                    blend(dot1.size(), dot2.size(), alpha),
                    blend_shape(dot1.shape(), dot2.shape(), alpha),
                )
                .with_luminance(blend(dot1.luminance(), dot2.luminance(), alpha))
            })
            .collect();

        AnimationFrame::new(time, points, luminance)
    }

    /// The time of the last frame, or 0 for an empty sequence.
    pub fn total_animation_time(&self) -> i64 {
        self.frames.last().map_or(0, |f| f.time_millis())
    }

    /// The time stamp of the frame where the first joint is lowest, or 0 if
    /// the first joint never has a location.
    pub fn strike_time(&self) -> i64 {
        self.scan().strike_time.unwrap_or(0)
    }

    /// The squared, padded bounding box of every located point, or `None` if
    /// no frame has a located point.
    pub fn extents(&self) -> Option<Extents> {
        self.scan().extents
    }

    fn scan(&self) -> &ExtentScan {
        self.scan.get_or_init(|| scan_extents(&self.frames))
    }
}

/// Finds the min/max of every located point, and the lowest frame of the
/// first joint, then squares the box about its centre and pads it.
fn scan_extents(frames: &[AnimationFrame]) -> ExtentScan {
    let mut min = Point::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    let mut lowest: Option<(f64, i64)> = None;
    let mut located = false;

    for frame in frames {
        for (i, dot) in frame.joint_locations().iter().enumerate() {
            let Some(loc) = dot.location() else {
                continue;
            };
            located = true;

            min.x = min.x.min(loc.x);
            min.y = min.y.min(loc.y);
            max.x = max.x.max(loc.x);
            max.y = max.y.max(loc.y);

            // only the first joint can mark the strike
            if i == 0 && lowest.map_or(true, |(y, _)| loc.y < y) {
                lowest = Some((loc.y, frame.time_millis()));
            }
        }
    }

    if !located {
        return ExtentScan::default();
    }

    let mut extents = Extents {
        x: min.x,
        y: min.y,
        width: max.x - min.x,
        height: max.y - min.y,
    };

    if extents.width > extents.height {
        let half_diff = (extents.width - extents.height) * 0.5;
        extents.height = extents.width;
        extents.y -= half_diff;
    } else {
        let half_diff = (extents.height - extents.width) * 0.5;
        extents.width = extents.height;
        extents.x -= half_diff;
    }

    extents.width += 2.0 * EXTENT_BUFFER;
    extents.height += 2.0 * EXTENT_BUFFER;
    extents.x -= EXTENT_BUFFER;
    extents.y -= EXTENT_BUFFER;

    ExtentScan {
        extents: Some(extents),
        strike_time: lowest.map(|(_, time)| time),
    }
}
