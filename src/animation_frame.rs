//! One timestamped sample of every joint.

use crate::animation_point::AnimationPoint;

/// A frame of animation: the time it should be shown at, relative to the
/// start of the animation, and one [AnimationPoint] per joint. Joint identity
/// is the index into the point list.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationFrame {
    time: i64,
    points: Vec<AnimationPoint>,
    luminance: Option<f64>,
}

impl AnimationFrame {
    /// Builds a frame from a time in seconds, as it appears in data files.
    /// Data file times are single precision; the time is widened, scaled to
    /// milliseconds, and truncated, so `0.033` lands on 32ms.
    pub fn from_seconds(seconds: f32, points: Vec<AnimationPoint>, luminance: Option<f64>) -> Self {
        Self::new((1000.0 * f64::from(seconds)) as i64, points, luminance)
    }

    /// Builds a frame from a time in milliseconds.
    pub fn new(time_millis: i64, points: Vec<AnimationPoint>, luminance: Option<f64>) -> Self {
        AnimationFrame {
            time: time_millis,
            points,
            luminance,
        }
    }

    /// The time this frame should be shown after the animation starts.
    pub fn time_millis(&self) -> i64 {
        self.time
    }

    /// The ordered joints of this frame.
    pub fn joint_locations(&self) -> &[AnimationPoint] {
        &self.points
    }

    /// Frame-level luminance.
    pub fn luminance(&self) -> Option<f64> {
        self.luminance
    }

    /// Pads the point list with blank joints up to `joints`.
    pub(crate) fn pad_to(&mut self, joints: usize) {
        if self.points.len() < joints {
            self.points.resize_with(joints, AnimationPoint::blank);
        }
    }
}
