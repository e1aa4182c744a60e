//! The terminal front end: a braille canvas that an
//! [AnimationRenderer](crate::renderer::AnimationRenderer) draws into.

mod error;
mod player;

pub use error::GuiError;
pub use player::{play, CanvasSurface, PlaybackReport};
