mod config;
mod macros;

use anyhow::{Context, Result};
use clap::Parser;
use common::PlaybackState;
use engine::video::find_media;
use engine::{SharedVideo, TextureTarget, VideoFactory, VideoSource, VideoTexture};
use std::path::{Path, PathBuf};
use std::sync::{MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Parser)]
#[command(name = "attract-preview")]
#[command(about = "Play attract-mode videos through the playback engine", long_about = None)]
#[command(version)]
struct Cli {
    /// Video files to play in order; items that fail to start are skipped.
    /// An item without an extension is a clip name looked up as
    /// `<name>.mp4`, `.MP4`, `.avi` or `.AVI`.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Config file (defaults to ~/.config/attract/config.toml)
    #[arg(short, long, env = "ATTRACT_CONFIG")]
    config: Option<PathBuf>,

    /// Completions before a video stops looping (0 = forever)
    #[arg(short, long)]
    loops: Option<u32>,

    /// Use the null video source
    #[arg(long)]
    disable_video: bool,

    /// Base directory for relative video paths
    #[arg(short, long)]
    media_root: Option<PathBuf>,

    /// Seconds to show each video (otherwise until its loops finish or Ctrl-C)
    #[arg(short, long, value_parser = parse_seconds)]
    duration: Option<Duration>,

    /// Ticks per second driving update/draw
    #[arg(short, long)]
    tick_rate: Option<u32>,

    /// Write the last displayed frame to a PNG file on exit
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Upload frames to a headless GPU device instead of system memory
    #[cfg(feature = "gpu")]
    #[arg(long)]
    gpu: bool,
}

/// How a single playlist item ended
#[derive(Debug, PartialEq, Eq)]
enum ItemOutcome {
    Finished,
    Stopped,
    Interrupted,
}

fn lock_video(video: &SharedVideo) -> MutexGuard<'_, dyn VideoSource + 'static> {
    video.lock().unwrap_or_else(PoisonError::into_inner)
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|e| format!("not a number of seconds: {}", e))?;
    Duration::try_from_secs_f64(seconds).map_err(|e| format!("invalid duration {}: {}", value, e))
}

/// Turn a playlist item into a file, looking clip names up by extension
fn locate_item(item: &Path, media_root: Option<&Path>) -> PathBuf {
    if item.extension().is_some() {
        return item.to_path_buf();
    }

    let Some(name) = item.file_name().and_then(|name| name.to_str()) else {
        return item.to_path_buf();
    };

    let parent = item.parent().unwrap_or(Path::new(""));
    let dir = match media_root {
        Some(root) if parent.is_relative() => root.join(parent),
        _ => parent.to_path_buf(),
    };

    find_media(&dir, name).unwrap_or_else(|| item.to_path_buf())
}

#[cfg(feature = "gpu")]
async fn texture_target(cli: &Cli) -> Result<TextureTarget> {
    if !cli.gpu {
        return Ok(TextureTarget::Cpu);
    }

    let context = engine::gpu::GpuContext::new()
        .await
        .context("Failed to initialize GPU for video textures")?;
    Ok(TextureTarget::Gpu(std::sync::Arc::new(context)))
}

#[cfg(not(feature = "gpu"))]
async fn texture_target(_cli: &Cli) -> Result<TextureTarget> {
    Ok(TextureTarget::Cpu)
}

fn save_snapshot(video: &dyn VideoSource, path: &Path) -> Result<()> {
    let texture = match video.texture() {
        Some(VideoTexture::Cpu(texture)) => texture,
        #[cfg(feature = "gpu")]
        Some(VideoTexture::Gpu(_)) => anyhow::bail!("Snapshots need a CPU texture (drop --gpu)"),
        None => anyhow::bail!("No frame was decoded"),
    };

    image::save_buffer(
        path,
        &texture.to_rgba(),
        texture.width(),
        texture.height(),
        image::ExtendedColorType::Rgba8,
    )
    .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;

    log::info!(
        "Saved {}x{} snapshot to {}",
        texture.width(),
        texture.height(),
        path.display()
    );
    Ok(())
}

/// Pump update/draw until the item ends, the duration passes or Ctrl-C arrives
async fn run_item(
    video: &SharedVideo,
    tick_rate: u32,
    duration: Option<Duration>,
    shutdown: &mut (impl Future<Output = ()> + Unpin),
) -> ItemOutcome {
    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(tick_rate)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let started = Instant::now();
    let mut last_tick = started;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut *shutdown => return ItemOutcome::Interrupted,
        }

        let now = Instant::now();
        let dt = now.duration_since(last_tick).as_secs_f32();
        last_tick = now;

        {
            let mut video = lock_video(video);
            video.update(dt);
            video.draw();

            if video.state() == PlaybackState::Stopped {
                return ItemOutcome::Stopped;
            }

            if video.reached_end() {
                return ItemOutcome::Finished;
            }
        }

        if duration.is_some_and(|limit| now.duration_since(started) >= limit) {
            return ItemOutcome::Finished;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::Config::default_config_path()?,
    };
    let mut config = config::Config::load_from_path(&config_path)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.general.log_level),
    )
    .init();

    log::info!("Starting attract-preview v{}", env!("CARGO_PKG_VERSION"));
    if config_path.exists() {
        log::info!("Loaded configuration from {}", config_path.display());
    } else {
        log::info!(
            "Config file not found at {}, using defaults",
            config_path.display()
        );
    }

    // Command line overrides the config file
    if let Some(loops) = cli.loops {
        config.video.num_loops = loops;
    }
    if cli.disable_video {
        config.video.enabled = false;
    }
    if let Some(root) = &cli.media_root {
        config.video.media_root = Some(root.clone());
    }
    let tick_rate = cli.tick_rate.unwrap_or(config.preview.tick_rate).clamp(1, 240);
    let duration = cli.duration;

    log::info!(
        "Video: {} (loops: {}, tick rate: {} Hz)",
        if config.video.enabled { "enabled" } else { "disabled" },
        config.video.num_loops,
        tick_rate
    );

    let target = texture_target(&cli).await?;
    let mut factory = VideoFactory::new(config.video.clone()).with_target(target);
    let video = factory.create_video();

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    tokio::pin!(shutdown);

    let mut played = 0usize;
    for item in &cli.paths {
        let path = locate_item(item, config.video.media_root.as_deref());
        if let Err(e) = lock_video(&video).play(&path) {
            log::warn!("Skipping {}: {}", path.display(), e);
            continue;
        }
        played += 1;

        match run_item(&video, tick_rate, duration, &mut shutdown).await {
            ItemOutcome::Finished => log::debug!("Finished showing {}", path.display()),
            ItemOutcome::Stopped => log::warn!("Playback of {} stopped", path.display()),
            ItemOutcome::Interrupted => {
                log::info!("Interrupted, shutting down");
                break;
            }
        }
    }

    let mut video = lock_video(&video);

    if let Some(path) = &cli.snapshot {
        log_and_continue!(save_snapshot(&*video, path), "save snapshot");
    }

    log_and_continue!(video.stop(), "stop video");
    log_and_continue!(video.deinitialize(), "deinitialize video");

    if played == 0 {
        anyhow::bail!("None of the {} video(s) could be played", cli.paths.len());
    }

    log::info!("Played {} of {} video(s)", played, cli.paths.len());
    Ok(())
}
