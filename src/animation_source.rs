//! What a renderer needs to know to draw an animation: the sequence itself
//! and how to draw it.

use crate::animation_sequence::AnimationSequence;
use crate::config::PlaybackConfig;

use std::sync::Arc;

/// Anything that can be handed to an
/// [AnimationRenderer](crate::renderer::AnimationRenderer).
pub trait AnimationSource {
    /// The sequence to play.
    fn animation_sequence(&self) -> &AnimationSequence;
    /// How many joints, from the first, to draw.
    fn num_points(&self) -> usize;
    /// Radius of a size 1.0 joint.
    fn disk_radius(&self) -> f32;
    /// Whether joints are joined by a line.
    fn is_connected(&self) -> bool;
}

/// A shared sequence paired with the settings it should be played with.
#[derive(Debug, Clone)]
pub struct AnimationStimulus {
    sequence: Arc<AnimationSequence>,
    num_points: usize,
    disk_radius: f32,
    connect_dots: bool,
}

impl AnimationStimulus {
    #[allow(missing_docs)]
    pub fn new(sequence: Arc<AnimationSequence>, config: &PlaybackConfig) -> Self {
        AnimationStimulus {
            sequence,
            num_points: config.num_points,
            disk_radius: config.disk_radius,
            connect_dots: config.connect_dots,
        }
    }

    /// The shared handle to the sequence.
    pub fn sequence(&self) -> &Arc<AnimationSequence> {
        &self.sequence
    }
}

impl AnimationSource for AnimationStimulus {
    fn animation_sequence(&self) -> &AnimationSequence {
        &self.sequence
    }

    fn num_points(&self) -> usize {
        self.num_points
    }

    fn disk_radius(&self) -> f32 {
        self.disk_radius
    }

    fn is_connected(&self) -> bool {
        self.connect_dots
    }
}
