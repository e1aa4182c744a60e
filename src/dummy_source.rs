//! Synthetic recordings, for demos and tests that shouldn't depend on data
//! files.
//!
//! The generated motion is a mallet strike: joint 0 is the mallet head, which
//! swings down to a single lowest point halfway through and back up again.
//! The remaining joints trail up and to the right of it like an arm. The
//! recording is written out in the animation text format and read back with
//! the ordinary parser, so it exercises the same path as a file would.

use crate::animation_parser::AnimationParser;
use crate::animation_sequence::AnimationSequence;

use log::warn;
use rand::prelude::*;
use std::f64::consts::PI;

/// Jitter above this is clamped; it is far past anything useful.
const MAX_NOISE: f64 = 1.0e6;

/// Builds a synthetic [AnimationSequence].
#[derive(Debug, Clone, PartialEq)]
pub struct DummySequence {
    num_points: usize,
    frames: usize,
    frame_period_ms: u64,
    noise: f64,
    name: String,
}

impl Default for DummySequence {
    fn default() -> Self {
        DummySequence {
            num_points: 5,
            frames: 61,
            frame_period_ms: 33,
            noise: 0.0,
            name: "dummy-strike".to_string(),
        }
    }
}

impl DummySequence {
    #[allow(missing_docs)]
    pub fn builder() -> Self {
        Self::default()
    }

    /// Joints per frame, including the mallet head. At least 1.
    pub fn num_points(mut self, num_points: usize) -> Self {
        self.num_points = num_points.max(1);
        self
    }

    /// Number of frames. At least 1.
    pub fn frames(mut self, frames: usize) -> Self {
        self.frames = frames.max(1);
        self
    }

    #[allow(missing_docs)]
    pub fn frame_period_ms(mut self, frame_period_ms: u64) -> Self {
        self.frame_period_ms = frame_period_ms;
        self
    }

    /// Maximum jitter added to each arm joint coordinate. The mallet head is
    /// never jittered, so the strike stays where it is.
    /// Non-finite noise is ignored.
    pub fn noise(mut self, noise: f64) -> Self {
        if noise.is_finite() {
            self.noise = noise.abs().min(MAX_NOISE);
        } else {
            warn!("Ignoring non-finite noise {}", noise);
            self.noise = 0.0;
        }
        self
    }

    /// The source name given to the parsed sequence.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The index of the frame with the lowest mallet head.
    pub fn strike_frame(&self) -> usize {
        (self.frames - 1) / 2
    }

    /// The recording in the animation text format.
    pub fn text(&self) -> String {
        let mut rng = thread_rng();
        let mut text = String::from("colorData=true\nsizeData=true\n");
        let last = (self.frames - 1).max(1) as f64;
        let strike = self.strike_frame() as f64;

        for frame in 0..self.frames {
            let seconds = (frame as u64 * self.frame_period_ms) as f64 / 1000.0;
            // 1 at the ends, 0 at the strike frame
            let phase = if frame as f64 <= strike {
                frame as f64 / strike.max(1.0)
            } else {
                1.0 + (frame as f64 - strike) / (last - strike).max(1.0)
            };
            let head_y = 1.0 - (PI * 0.5 * phase).sin();
            let head_x = 0.25 * (PI * 0.5 * phase).cos();

            text.push_str(&format!(
                "{:.3} {:.4} {:.4} (255,140,0) size1.5",
                seconds, head_x, head_y
            ));

            for joint in 1..self.num_points {
                let jx = head_x + 0.4 * joint as f64 + rng.gen_range(-self.noise..=self.noise);
                let jy = head_y + 0.6 * joint as f64 + rng.gen_range(-self.noise..=self.noise);
                text.push_str(&format!(" {:.4} {:.4} - -", jx, jy));
            }
            text.push('\n');
        }

        text
    }

    /// Generates the recording and parses it with `parser`.
    pub fn build_with(&self, parser: &AnimationParser) -> AnimationSequence {
        parser.parse_str(self.name.clone(), &self.text())
    }

    /// Generates the recording and parses it with a default parser.
    pub fn build(&self) -> AnimationSequence {
        self.build_with(&AnimationParser::new())
    }
}
