//! Command line front end for inspecting, aligning, and playing point-light
//! animations.

use clap::Parser;
use pointlight::{
    animation_sequence::AnimationSequence,
    animation_source::AnimationStimulus,
    args::{CommandTask, DisplayArgs, PointLightArgs},
    config::PlaybackConfig,
    dummy_source::DummySequence,
    gui,
    sequence_cache::SequenceCache,
    stimulus_timing::{MediaClip, StimulusTiming},
};

use log::{debug, info};
use std::{error::Error, path::Path, sync::Arc};

// Example:
// cargo run --bin pointlight -- --aspect 1.33 play walk.txt --connect
// cargo run --bin pointlight -- align tap.txt --audio tap.wav --media-delay 120

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = PointLightArgs::parse();

    let mut config = match &args.config {
        Some(path) => PlaybackConfig::from_path(path)?,
        None => PlaybackConfig::default(),
    };
    if args.aspect.is_some() {
        config.aspect_ratio = args.aspect;
    }
    debug!("Effective config: {:?}", config);

    let cache = SequenceCache::new(config.parser());

    match args.command {
        CommandTask::Info(cmd) => {
            let seq = load(&cache, &cmd.file, &config)?;
            print_info(&seq);
        }

        CommandTask::Frame(cmd) => {
            let seq = load(&cache, &cmd.file, &config)?;
            match seq.frame_at_time(cmd.time) {
                Some(frame) => {
                    println!("{} at {}ms", seq.source_name(), frame.time_millis());
                    if let Some(luminance) = frame.luminance() {
                        println!("  luminance : {:.2}", luminance);
                    }
                    for (i, point) in frame.joint_locations().iter().enumerate() {
                        println!("  {:>3} : {}", i, point);
                    }
                }
                None => println!(
                    "{} has no frame at {}ms (runs 0..={}ms)",
                    seq.source_name(),
                    cmd.time,
                    seq.total_animation_time()
                ),
            }
        }

        CommandTask::Align(cmd) => {
            let seq = load(&cache, &cmd.file, &config)?;
            let clip = MediaClip::from_wav(&cmd.audio)?;
            let timing = StimulusTiming::new(
                Some(seq.as_ref()),
                clip.duration_ms(),
                cmd.media_delay,
                cmd.offset,
            );

            println!("animation       : {} ({}ms)", seq.source_name(), seq.total_animation_time());
            println!("strike          : {}ms", seq.strike_time());
            println!("audio           : {} ({}ms)", cmd.audio.display(), clip.duration_ms());
            println!("media objects   : {}", timing.media_object_count());
            println!("animation delay : {}ms", timing.animation_delay());
            println!("media delay     : {}ms", timing.media_delay());
        }

        CommandTask::Play(cmd) => {
            let config = with_display(config, &cmd.display);
            let seq = load(&cache, &cmd.file, &config)?;
            play(seq, &config)?;
        }

        CommandTask::Demo(cmd) => {
            let config = with_display(config, &cmd.display);
            let seq = cache.insert(
                DummySequence::builder()
                    .num_points(cmd.points)
                    .frames(cmd.frames)
                    .noise(cmd.noise)
                    .build_with(&config.parser()),
            );
            play(seq, &config)?;
        }

        CommandTask::Config => {
            println!("{}", config.to_ron_string()?);
        }
    }

    Ok(())
}

fn load(
    cache: &SequenceCache,
    path: &Path,
    config: &PlaybackConfig,
) -> Result<Arc<AnimationSequence>, Box<dyn Error>> {
    Ok(cache.get_or_parse(path, config.aspect_ratio)?)
}

fn with_display(mut config: PlaybackConfig, display: &DisplayArgs) -> PlaybackConfig {
    config.connect_dots |= display.connect;
    if let Some(num_points) = display.num_points {
        config.num_points = num_points;
    }
    if let Some(radius) = display.radius {
        config.disk_radius = radius;
    }
    config
}

fn play(seq: Arc<AnimationSequence>, config: &PlaybackConfig) -> Result<(), Box<dyn Error>> {
    let stimulus = Arc::new(AnimationStimulus::new(seq, config));
    let report = gui::play(stimulus, config)?;
    info!("{:?}", report);
    if report.finished {
        println!("Played to the end in {} ticks", report.ticks);
    } else {
        println!("Stopped after {} ticks", report.ticks);
    }
    Ok(())
}

fn print_info(seq: &AnimationSequence) {
    let columns = seq.columns();
    let names: Vec<&str> = [
        (columns.size, "size"),
        (columns.color, "color"),
        (columns.luminance, "luminance"),
        (columns.shape, "shape"),
    ]
    .into_iter()
    .filter_map(|(on, name)| on.then_some(name))
    .collect();

    println!("{}", seq.source_name());
    println!("  frames       : {}", seq.num_frames());
    println!("  joints       : {}", seq.joint_count());
    println!("  duration     : {}ms", seq.total_animation_time());
    println!("  aspect ratio : {:.2}", seq.point_aspect());
    println!("  variant      : {:?}", seq.variant());
    if names.is_empty() {
        println!("  columns      : none");
    } else {
        println!("  columns      : {}", names.join(" "));
    }
    println!("  strike       : {}ms", seq.strike_time());
    match seq.extents() {
        Some(e) => println!(
            "  extents      : ({:.2}, {:.2}) {:.2} x {:.2}",
            e.x, e.y, e.width, e.height
        ),
        None => println!("  extents      : none"),
    }
}
