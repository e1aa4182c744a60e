//! The value types that make up one joint of one frame: a location, an
//! optional color and size, a drawable [Shape], and (for the [Dot] variant)
//! a per-point luminance.
//!
//! Every attribute is optional on its own. An absent value means "no data in
//! this frame" and is resolved against the neighbouring frame during
//! interpolation, it never means zero.
//!
//! [Dot]: crate::animation_parser::Variant::Dot

use std::{fmt, str::FromStr};

/// A location in animation space. `y` has already been divided by the
/// sequence's point aspect ratio.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[allow(missing_docs)]
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2},{:.2})", self.x, self.y)
    }
}

/// An RGB triple on the 0-255 scale used by the data files.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    #[allow(missing_docs)]
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Color { r, g, b }
    }

    /// Scales every component by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Color {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.r, self.g, self.b)
    }
}

/// The shapes a joint can be drawn as.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Shape {
    /// A filled disk
    #[default]
    Dot,
    /// A plus sign
    Cross,
    /// An axis-aligned filled square
    Square,
    /// A square rotated by 45 degrees
    Diamond,
}

impl Shape {
    /// All shapes, in declaration order.
    pub const ALL: [Shape; 4] = [Shape::Dot, Shape::Cross, Shape::Square, Shape::Diamond];

    /// The upper-case name used in data files.
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Dot => "DOT",
            Shape::Cross => "CROSS",
            Shape::Square => "SQUARE",
            Shape::Diamond => "DIAMOND",
        }
    }
}

/// Returned when a token does not name a [Shape].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownShape(pub String);

impl fmt::Display for UnknownShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown shape `{}`", self.0)
    }
}

impl std::error::Error for UnknownShape {}

impl FromStr for Shape {
    type Err = UnknownShape;

    /// Shape names are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Shape::ALL
            .into_iter()
            .find(|shape| shape.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownShape(s.to_owned()))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One joint at one frame. Immutable once built.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct AnimationPoint {
    location: Option<Point>,
    color: Option<Color>,
    size: Option<f64>,
    shape: Shape,
    luminance: Option<f64>,
}

impl AnimationPoint {
    /// Builds a point without per-point luminance.
    pub fn new(
        location: Option<Point>,
        color: Option<Color>,
        size: Option<f64>,
        shape: Shape,
    ) -> Self {
        AnimationPoint {
            location,
            color,
            size,
            shape,
            luminance: None,
        }
    }

    /// A point at `location` with every other attribute absent.
    pub fn at(location: Point) -> Self {
        AnimationPoint {
            location: Some(location),
            ..Default::default()
        }
    }

    /// A placeholder joint that carries no data this frame.
    pub fn blank() -> Self {
        AnimationPoint::default()
    }

    /// Attaches a per-point luminance.
    pub fn with_luminance(self, luminance: Option<f64>) -> Self {
        AnimationPoint { luminance, ..self }
    }

    #[allow(missing_docs)]
    pub fn location(&self) -> Option<Point> {
        self.location
    }

    #[allow(missing_docs)]
    pub fn color(&self) -> Option<Color> {
        self.color
    }

    #[allow(missing_docs)]
    pub fn size(&self) -> Option<f64> {
        self.size
    }

    #[allow(missing_docs)]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Per-point luminance, only ever present for the Dot variant.
    pub fn luminance(&self) -> Option<f64> {
        self.luminance
    }
}

impl fmt::Display for AnimationPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn or_null<T: fmt::Display>(v: Option<T>) -> String {
            v.map_or_else(|| "null".to_owned(), |v| v.to_string())
        }

        write!(
            f,
            "AnimationPoint: location: {}, color: {}, size: {}, shape: {}",
            or_null(self.location),
            or_null(self.color),
            or_null(self.size.map(|s| format!("{:.2}", s))),
            self.shape
        )?;
        if let Some(lum) = self.luminance {
            write!(f, ", luminance: {:.2}", lum)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_names_ignore_case() {
        assert_eq!("cross".parse::<Shape>(), Ok(Shape::Cross));
        assert_eq!("Diamond".parse::<Shape>(), Ok(Shape::Diamond));
        assert_eq!("SQUARE".parse::<Shape>(), Ok(Shape::Square));
        assert!("circle".parse::<Shape>().is_err());
    }

    #[test]
    fn blank_point_defaults_to_dot() {
        let p = AnimationPoint::blank();
        assert_eq!(p.location(), None);
        assert_eq!(p.color(), None);
        assert_eq!(p.size(), None);
        assert_eq!(p.shape(), Shape::Dot);
    }

    #[test]
    fn description_marks_missing_values() {
        let p = AnimationPoint::new(Some(Point::new(1.0, 2.5)), None, Some(1.5), Shape::Cross);
        assert_eq!(
            p.to_string(),
            "AnimationPoint: location: (1.00,2.50), color: null, size: 1.50, shape: CROSS"
        );
    }
}
