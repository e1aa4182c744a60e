//! Lines an animation up with a sound so the strike lands on the sound's
//! onset.
//!
//! A sound clip has an *inherent delay*: the time from the start of the clip
//! to the audible event. An animation has its strike time. Whichever of the
//! two takes longer to reach its event starts first, and the other is held
//! back by the difference (plus any deliberate offset).

use crate::animation_sequence::AnimationSequence;

use hound::{Error as HoundError, WavReader};
use log::{debug, info};
use std::{fmt, path::Path};

/// Start delays for one animation/media pairing, in ms.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StimulusTiming {
    animation_delay: i64,
    media_delay: i64,
    media_object_count: usize,
}

impl StimulusTiming {
    /// Works out the delays for `sequence` against a media clip.
    ///
    /// A positive `timing_offset_ms` moves the sound later relative to the
    /// strike. When either object is missing or has zero duration both delays
    /// are 0.
    pub fn new(
        sequence: Option<&AnimationSequence>,
        media_duration_ms: i64,
        inherent_media_delay_ms: i64,
        timing_offset_ms: i64,
    ) -> Self {
        let animation = sequence.filter(|s| s.total_animation_time() > 0);
        let has_media = media_duration_ms > 0;
        let media_object_count = usize::from(animation.is_some()) + usize::from(has_media);

        let Some(animation) = animation.filter(|_| has_media) else {
            debug!("{} media object(s), no alignment needed", media_object_count);
            return StimulusTiming {
                media_object_count,
                ..Default::default()
            };
        };

        let strike = animation.strike_time();
        let (animation_delay, media_delay) =
            if strike > inherent_media_delay_ms - timing_offset_ms {
                (0, strike - inherent_media_delay_ms + timing_offset_ms)
            } else {
                (inherent_media_delay_ms - strike - timing_offset_ms, 0)
            };

        info!(
            "{} : strike at {}ms, animation delay {}ms, media delay {}ms",
            animation.source_name(),
            strike,
            animation_delay,
            media_delay
        );

        StimulusTiming {
            animation_delay,
            media_delay,
            media_object_count,
        }
    }

    /// How long to wait before starting the animation.
    pub fn animation_delay(&self) -> i64 {
        self.animation_delay
    }

    /// How long to wait before starting the media.
    pub fn media_delay(&self) -> i64 {
        self.media_delay
    }

    /// How many of the two objects are actually present (0, 1 or 2).
    pub fn media_object_count(&self) -> usize {
        self.media_object_count
    }
}

/// Errors from probing a media file.
#[derive(Debug)]
pub enum MediaError {
    /// Returned when the file can't be opened or isn't a WAV file.
    HoundError(HoundError),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::HoundError(error) => write!(f, "hound error: {}", error),
        }
    }
}

impl std::error::Error for MediaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MediaError::HoundError(error) => Some(error),
        }
    }
}

impl From<HoundError> for MediaError {
    fn from(value: HoundError) -> Self {
        Self::HoundError(value)
    }
}

/// What the aligner needs to know about a sound clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaClip {
    duration_ms: i64,
    sample_rate: u32,
    channels: u16,
}

impl MediaClip {
    /// Reads the header of the WAV file at `path`.
    pub fn from_wav(path: impl AsRef<Path>) -> Result<Self, MediaError> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();

        // `duration` counts samples per channel
        let duration_ms = i64::from(reader.duration()) * 1000 / i64::from(spec.sample_rate.max(1));

        Ok(MediaClip {
            duration_ms,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        })
    }

    #[allow(missing_docs)]
    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    #[allow(missing_docs)]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[allow(missing_docs)]
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation_parser::AnimationParser;
    use hound::{SampleFormat, WavSpec, WavWriter};

    /// Strike at 400ms, runs to 1000ms.
    fn strike_sequence() -> AnimationSequence {
        AnimationParser::new().parse_str("strike", "0 0 3\n0.4 0 0\n1 0 3\n")
    }

    #[test]
    fn media_waits_for_a_late_strike() {
        let seq = strike_sequence();
        assert_eq!(seq.strike_time(), 400);

        let timing = StimulusTiming::new(Some(&seq), 2000, 100, 0);
        assert_eq!(timing.animation_delay(), 0);
        assert_eq!(timing.media_delay(), 300);
        assert_eq!(timing.media_object_count(), 2);

        let offset = StimulusTiming::new(Some(&seq), 2000, 100, 50);
        assert_eq!(offset.media_delay(), 350);
    }

    #[test]
    fn animation_waits_for_a_late_sound() {
        let seq = strike_sequence();
        let timing = StimulusTiming::new(Some(&seq), 2000, 500, 20);
        assert_eq!(timing.animation_delay(), 80);
        assert_eq!(timing.media_delay(), 0);

        // strike == inherent - offset goes the same way
        let even = StimulusTiming::new(Some(&seq), 2000, 400, 0);
        assert_eq!((even.animation_delay(), even.media_delay()), (0, 0));
    }

    #[test]
    fn missing_objects_need_no_delay() {
        let seq = strike_sequence();
        let no_media = StimulusTiming::new(Some(&seq), 0, 100, 0);
        assert_eq!(no_media, StimulusTiming {
            animation_delay: 0,
            media_delay: 0,
            media_object_count: 1,
        });

        let still = AnimationParser::new().parse_str("still", "0 1 1\n");
        let no_animation = StimulusTiming::new(Some(&still), 2000, 100, 0);
        assert_eq!(no_animation.media_object_count(), 1);
        assert_eq!(no_animation.media_delay(), 0);

        assert_eq!(StimulusTiming::new(None, 0, 0, 0).media_object_count(), 0);
    }

    #[test]
    fn wav_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tap.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..22050 {
            writer.write_sample(0i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let clip = MediaClip::from_wav(&path).unwrap();
        assert_eq!(clip.duration_ms(), 500);
        assert_eq!(clip.channels(), 2);
        assert_eq!(clip.sample_rate(), 44100);
    }

    #[test]
    fn not_a_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, "not audio").unwrap();
        assert!(matches!(
            MediaClip::from_wav(&path),
            Err(MediaError::HoundError(_))
        ));
    }
}
