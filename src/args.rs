//! Commandline argument parser using clap for the `pointlight` tool

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Top-level arguments.
#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
pub struct PointLightArgs {
    #[command(subcommand)]
    /// What to do with the animation
    pub command: CommandTask,

    /// Playback configuration file, in RON
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Point aspect ratio, overriding both the config and the animation file
    #[arg(short = 'a', long = "aspect", global = true)]
    pub aspect: Option<f32>,
}

#[allow(missing_docs)]
#[derive(Debug, Subcommand, Clone)]
pub enum CommandTask {
    /// Summarise an animation file
    #[command(about)]
    Info(InfoCommand),

    /// Print the interpolated frame at a point in time
    #[command(about)]
    Frame(FrameCommand),

    /// Work out start delays that line a strike up with a sound
    #[command(about)]
    Align(AlignCommand),

    /// Play an animation in the terminal
    #[command(about)]
    Play(PlayCommand),

    /// Play a generated mallet strike in the terminal
    #[command(about)]
    Demo(DemoCommand),

    /// Print the effective playback configuration
    #[command(about)]
    Config,
}

#[allow(missing_docs)]
#[derive(Debug, Args, Clone)]
pub struct InfoCommand {
    /// Animation file to read
    pub file: PathBuf,
}

#[allow(missing_docs)]
#[derive(Debug, Args, Clone)]
pub struct FrameCommand {
    /// Animation file to read
    pub file: PathBuf,

    /// Time since the start of the animation, in ms
    #[arg(short = 't', long = "time")]
    pub time: i64,
}

#[allow(missing_docs)]
#[derive(Debug, Args, Clone)]
pub struct AlignCommand {
    /// Animation file to read
    pub file: PathBuf,

    /// WAV file holding the sound
    #[arg(short = 'w', long = "audio")]
    pub audio: PathBuf,

    /// Time from the start of the sound to its onset, in ms
    #[arg(short = 'm', long = "media-delay", default_value_t = 0)]
    pub media_delay: i64,

    /// Extra delay of the sound relative to the strike, in ms
    #[arg(short = 'o', long = "offset", default_value_t = 0, allow_hyphen_values = true)]
    pub offset: i64,
}

#[allow(missing_docs)]
#[derive(Debug, Args, Clone)]
pub struct PlayCommand {
    /// Animation file to play
    pub file: PathBuf,

    #[command(flatten)]
    pub display: DisplayArgs,
}

#[allow(missing_docs)]
#[derive(Debug, Args, Clone)]
pub struct DemoCommand {
    /// Joints in the generated recording
    #[arg(short = 'p', long = "points", default_value_t = 5)]
    pub points: usize,

    /// Frames in the generated recording
    #[arg(short = 'f', long = "frames", default_value_t = 61)]
    pub frames: usize,

    /// Maximum jitter of the arm joints
    #[arg(short = 'n', long = "noise", default_value_t = 0.02)]
    pub noise: f64,

    #[command(flatten)]
    pub display: DisplayArgs,
}

/// Display settings that override the config file.
#[derive(Debug, Args, Clone)]
pub struct DisplayArgs {
    /// Draw a line through the joints
    #[arg(long = "connect")]
    pub connect: bool,

    /// Only draw the first N joints
    #[arg(long = "num-points")]
    pub num_points: Option<usize>,

    /// Radius of a size 1.0 joint
    #[arg(long = "radius")]
    pub radius: Option<f32>,
}
