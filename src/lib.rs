//! PointLight plays point-light animations: recordings of a moving body
//! reduced to a handful of joints, drawn as dots on a dark background.
//!
//! A recording is a plain text file of timestamped rows (see
//! [animation_parser] for the format). It is parsed once into an immutable
//! [AnimationSequence](animation_sequence::AnimationSequence), which can then
//! be sampled at any millisecond, with frames in between recorded ones
//! interpolated. Sequences are shared between trials through a
//! [SequenceCache](sequence_cache::SequenceCache).
//!
//! Drawing is kept behind the [DrawSurface](renderer::DrawSurface) trait. The
//! [AnimationRenderer](renderer::AnimationRenderer) works out which frame to
//! show and how, and the [gui] module provides a terminal canvas for it. For
//! audio-visual trials, [stimulus_timing] works out start delays so that the
//! moment of impact in an animation lines up with the onset of a sound.

#![warn(missing_docs)]
pub mod animation_frame;
pub mod animation_parser;
pub mod animation_point;
pub mod animation_sequence;
pub mod animation_source;
pub mod args;
pub mod config;
pub mod dummy_source;
pub mod gui;
pub mod interpolation;
pub mod renderer;
pub mod sequence_cache;
pub mod stimulus_timing;
pub mod trigger;
