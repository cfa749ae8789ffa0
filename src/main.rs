//! flurry-render: play a confetti animation offscreen and write PNG frames.
//!
//! The render pass runs on its own thread, ticking the controller and drawing
//! each frame with the software renderer, while the main thread reports
//! animation events as they arrive.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use crossbeam_channel::Receiver;
use flurry::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "flurry-render")]
#[command(about = "Render confetti animations to PNG frames", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    variant: Variant,

    #[command(flatten)]
    output: OutputArgs,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Args)]
struct OutputArgs {
    /// JSON configuration file for the chosen variant
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Number of frames to render
    #[arg(short, long, default_value_t = 120, global = true)]
    frames: u32,

    /// Frames per second of simulated time
    #[arg(long, default_value_t = 60, global = true)]
    fps: u32,

    /// Directory the PNG frames are written to
    #[arg(short, long, default_value = "frames", global = true)]
    out: PathBuf,

    /// Background color
    #[arg(long, default_value = "#00000000", global = true)]
    background: String,
}

#[derive(Subcommand)]
enum Variant {
    /// Grid fall, optionally blasted out of cannons
    Fall {
        /// Cannon position as `x,y` (repeatable)
        #[arg(long = "cannon", value_parser = parse_point)]
        cannons: Vec<Vec2>,
    },
    /// Radial burst
    Blast {
        /// Blast center as `x,y`
        #[arg(long, value_parser = parse_point)]
        at: Option<Vec2>,
    },
    /// Two staggered endless lanes
    Continuous,
}

fn parse_point(value: &str) -> Result<Vec2, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{value}`"))?;
    let x = x.trim().parse::<f32>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f32>().map_err(|e| e.to_string())?;
    Ok(Vec2::new(x, y))
}

/// Controller plus what the CLI needs to drive it.
struct Playback {
    source: Arc<dyn FrameSource>,
    events: Receiver<AnimationEvent>,
    size: Vec2,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if cli.verbose > 0 {
        log::set_max_level(match cli.verbose {
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    }

    if cli.output.fps == 0 {
        bail!("--fps must be positive");
    }
    let background = Color::from_hex(&cli.output.background).context("invalid --background")?;
    let playback = start(&cli.variant, cli.output.config.as_deref())?;

    std::fs::create_dir_all(&cli.output.out)
        .with_context(|| format!("failed to create {}", cli.output.out.display()))?;

    let frames = cli.output.frames;
    let dt = Duration::from_secs_f64(1.0 / f64::from(cli.output.fps));
    let out = cli.output.out.clone();
    let source = Arc::clone(&playback.source);
    let width = playback.size.x.max(1.0) as u32;
    let height = playback.size.y.max(1.0) as u32;

    let render = thread::Builder::new()
        .name("render".into())
        .spawn(move || render_frames(source.as_ref(), width, height, background, frames, dt, &out))
        .context("failed to spawn render thread")?;

    while !render.is_finished() {
        if let Ok(event) = playback.events.recv_timeout(Duration::from_millis(20)) {
            report(event);
        }
    }
    for event in playback.events.try_iter() {
        report(event);
    }

    let written = match render.join() {
        Ok(result) => result?,
        Err(_) => bail!("render thread panicked"),
    };
    log::info!("wrote {written} frames to {}", cli.output.out.display());
    Ok(())
}

fn report(event: AnimationEvent) {
    match event {
        AnimationEvent::Started => log::info!("animation started"),
        AnimationEvent::Ended { cycle } => log::info!("cycle {cycle} ended"),
    }
}

/// Build the controller for `variant` and make sure it is playing.
fn start(variant: &Variant, config_path: Option<&Path>) -> Result<Playback> {
    match variant {
        Variant::Fall { cannons } => {
            let config = match config_path {
                Some(path) => ConfettiConfig::from_file(path)
                    .with_context(|| format!("failed to load {}", path.display()))?,
                None => ConfettiConfig::new().with_autoplay(false).with_infinite(false),
            };
            let size = config.flakes.container_size();
            let controller = ConfettiController::new(config)?;
            let overrides = (!cannons.is_empty()).then(|| cannons.clone());
            if overrides.is_some() || !controller.is_running() {
                controller.restart(overrides);
            }
            Ok(Playback {
                events: controller.events(),
                source: Arc::new(controller),
                size,
            })
        }
        Variant::Blast { at } => {
            let config = match config_path {
                Some(path) => BlastConfig::from_file(path)
                    .with_context(|| format!("failed to load {}", path.display()))?,
                None => BlastConfig::new(),
            };
            let size = config.flakes.container_size();
            let controller = BlastController::new(config)?;
            if at.is_some() || !controller.is_running() {
                controller.restart(*at);
            }
            Ok(Playback {
                events: controller.events(),
                source: Arc::new(controller),
                size,
            })
        }
        Variant::Continuous => {
            let config = match config_path {
                Some(path) => ConfettiConfig::from_file(path)
                    .with_context(|| format!("failed to load {}", path.display()))?,
                None => ConfettiConfig::new().with_autoplay(false),
            };
            let size = config.flakes.container_size();
            let controller = ContinuousController::new(config)?;
            if !controller.is_running() {
                controller.restart(None);
            }
            Ok(Playback {
                events: controller.events(),
                source: Arc::new(controller),
                size,
            })
        }
    }
}

fn render_frames(
    source: &dyn FrameSource,
    width: u32,
    height: u32,
    background: Color,
    frames: u32,
    dt: Duration,
    out: &Path,
) -> Result<u32> {
    let atlas = source.atlas();
    let mut renderer = SoftwareRenderer::new(width, height).with_background(background);
    let mut batch = FrameBatch::new();

    for frame in 0..frames {
        source.tick(dt);
        batch.clear();
        source.write_frame(&mut batch);
        renderer.clear();
        renderer.draw_batch(&atlas, &batch);

        let path = out.join(format!("frame_{frame:04}.png"));
        renderer
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::trace!("frame {frame}: {} sprites", batch.len());
    }
    Ok(frames)
}
