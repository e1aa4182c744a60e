//! Playback settings, read from a [ron] file. Every field is optional in the
//! file and falls back to its default:
//!
//! ```text
//! (
//!     disk_radius: 0.3,
//!     connect_dots: false,
//!     num_points: 13,
//!     aspect_ratio: Some(1.33),
//!     refresh_period_ms: 16,
//!     variant: Point,
//! )
//! ```

use crate::animation_parser::{AnimationParser, Variant};

use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt, fs, io, path::Path};

/// How an animation is drawn and paced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Radius of a size 1.0 joint, in animation units
    pub disk_radius: f32,
    /// Draw a line through the joints in order
    pub connect_dots: bool,
    /// Only the first `num_points` joints are drawn
    pub num_points: usize,
    /// Overrides `pointAspectRatio` in animation files
    pub aspect_ratio: Option<f32>,
    /// Time between display ticks
    pub refresh_period_ms: u64,
    /// Where luminance lives in animation files
    pub variant: Variant,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            disk_radius: 0.3,
            connect_dots: false,
            num_points: usize::MAX,
            aspect_ratio: None,
            refresh_period_ms: 16,
            variant: Variant::Point,
        }
    }
}

/// Errors from reading or writing a [PlaybackConfig].
#[derive(Debug)]
pub enum ConfigError {
    /// Returned when the config file can't be read.
    IoError(io::Error),

    /// Returned when serializing the config fails.
    RonError(ron::Error),

    /// Returned when the config file isn't valid.
    RonSpannedError(ron::de::SpannedError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            ConfigError::IoError(error) => Cow::from(format!("io error: {}", error)),
            ConfigError::RonError(error) => Cow::from(format!("ron error: {}", error)),
            ConfigError::RonSpannedError(error) => {
                Cow::from(format!("ron spanning error: {}", error))
            }
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for ConfigError {}

impl PlaybackConfig {
    /// Reads a config from the file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(ConfigError::IoError)?;
        Self::from_ron(&text)
    }

    /// Reads a config from RON text.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        ron::de::from_str(text).map_err(ConfigError::RonSpannedError)
    }

    /// Writes the config as pretty RON.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(ConfigError::RonError)
    }

    /// A parser set up for this config's variant and aspect ratio.
    pub fn parser(&self) -> AnimationParser {
        AnimationParser::new()
            .variant(self.variant)
            .aspect_ratio(self.aspect_ratio)
    }
}
