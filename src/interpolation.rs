//! Blending rules used when a frame is requested between two recorded
//! frames.

use crate::animation_point::{Color, Point, Shape};

/// Linear interpolation towards `other`. `alpha == 0` gives `self`,
/// `alpha == 1` gives `other`.
pub trait Lerp {
    #[allow(missing_docs)]
    fn lerp(&self, other: &Self, alpha: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(&self, other: &Self, alpha: f64) -> Self {
        alpha * other + (1.0 - alpha) * self
    }
}

impl Lerp for Point {
    fn lerp(&self, other: &Self, alpha: f64) -> Self {
        Point {
            x: self.x.lerp(&other.x, alpha),
            y: self.y.lerp(&other.y, alpha),
        }
    }
}

impl Lerp for Color {
    fn lerp(&self, other: &Self, alpha: f64) -> Self {
        Color {
            r: self.r.lerp(&other.r, alpha),
            g: self.g.lerp(&other.g, alpha),
            b: self.b.lerp(&other.b, alpha),
        }
    }
}

/// Blends two optional values.
///
/// With both present the result is their lerp. With either one missing the
/// result is absent, unless `alpha > 0.5`, in which case it is whatever the
/// second frame holds (which may itself be absent).
pub fn blend<T: Lerp + Copy>(first: Option<T>, second: Option<T>, alpha: f64) -> Option<T> {
    match (first, second) {
        (Some(a), Some(b)) => Some(a.lerp(&b, alpha)),
        _ if alpha > 0.5 => second,
        _ => None,
    }
}

/// Shapes switch to the second frame's shape from the midpoint on.
pub fn blend_shape(first: Shape, second: Shape, alpha: f64) -> Shape {
    if first != second && alpha >= 0.5 {
        second
    } else {
        first
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints_and_midpoint() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        assert_eq!(a.lerp(&b, 0.5), Point::new(2.0, 3.0));
    }

    #[test]
    fn color_lerps_per_component() {
        let a = Color::new(0.0, 100.0, 255.0);
        let b = Color::new(255.0, 100.0, 0.0);
        assert_eq!(a.lerp(&b, 0.5), Color::new(127.5, 100.0, 127.5));
    }

    #[test]
    fn missing_value_biases_to_second_frame() {
        let b = Some(Point::new(5.0, 5.0));
        assert_eq!(blend(None, b, 0.3), None);
        assert_eq!(blend(None, b, 0.5), None);
        assert_eq!(blend(None, b, 0.7), b);

        let a = Some(2.0);
        assert_eq!(blend(a, None, 0.3), None);
        assert_eq!(blend(a, None, 0.7), None);
        assert_eq!(blend::<f64>(None, None, 0.9), None);
    }

    #[test]
    fn shape_flips_at_midpoint() {
        assert_eq!(blend_shape(Shape::Dot, Shape::Cross, 0.49), Shape::Dot);
        assert_eq!(blend_shape(Shape::Dot, Shape::Cross, 0.5), Shape::Cross);
        assert_eq!(blend_shape(Shape::Square, Shape::Square, 0.9), Shape::Square);
    }
}
