use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};

use sensor_panel::sources::{demo_profile, DemoSensorSource};
use sensor_panel::{Compositor, FrameLoop, FrameLoopOptions, RendererSettings};
use sensor_panel_core::{AssetCache, FileAssetSource, SensorValueCache};
use sensor_panel_render::CairoSurface;
use sensor_panel_types::Profile;

/// sensor-panel - render a sensor overlay profile to PNG
#[derive(Parser, Debug, Clone)]
#[command(name = "sensor-panel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Profile to render (JSON); the built-in demo profile when omitted
    #[arg(value_name = "PROFILE")]
    profile: Option<PathBuf>,

    /// Where to write the last frame
    #[arg(short = 'o', long = "output", value_name = "PNG", default_value = "panel.png")]
    output: PathBuf,

    /// Number of frames to render before writing the output
    #[arg(short = 'n', long = "frames", default_value = "1")]
    frames: u64,

    /// Override the profile's target frame rate
    #[arg(long = "fps", value_name = "FPS")]
    fps: Option<u32>,

    /// Render with the editor grid and selection outlines
    #[arg(short = 'e', long = "edit")]
    edit: bool,

    /// Hide media overlays on animated images
    #[arg(short = 'p', long = "preview")]
    preview: bool,

    /// Output scale factor
    #[arg(short = 's', long = "scale", default_value = "1.0")]
    scale: f64,

    /// Draw the FPS overlay
    #[arg(long = "show-fps")]
    show_fps: bool,

    /// Renderer settings file (defaults to the config directory)
    #[arg(long = "settings", value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Write the demo profile as JSON to this path and exit
    #[arg(long = "write-demo", value_name = "PATH")]
    write_demo: Option<PathBuf>,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,
}

fn main() {
    let cli = Cli::parse();

    // Level 0 (default): warn only
    // Level 1: info
    // Level 2: debug
    // Level 3+: trace
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("Starting sensor-panel v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn load_settings(cli: &Cli) -> RendererSettings {
    let loaded = match &cli.settings {
        Some(path) => RendererSettings::load_from_path(path),
        None => RendererSettings::load(),
    };
    let mut settings = loaded.unwrap_or_else(|e| {
        warn!("Failed to load renderer settings, using defaults: {:#}", e);
        RendererSettings::default()
    });
    settings.show_fps |= cli.show_fps;
    settings
}

fn load_profile(cli: &Cli) -> Result<Profile> {
    let mut profile = match &cli.profile {
        Some(path) => Profile::from_json_file(path)
            .with_context(|| format!("Failed to load profile {:?}", path))?,
        None => {
            info!("No profile given, rendering the demo profile");
            demo_profile()
        }
    };
    if let Some(fps) = cli.fps {
        profile.target_frame_rate = fps;
    }
    Ok(profile)
}

fn run(cli: Cli) -> Result<()> {
    if let Some(path) = &cli.write_demo {
        let json = serde_json::to_string_pretty(&demo_profile())?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
        println!("Wrote demo profile to {}", path.display());
        return Ok(());
    }

    let settings = load_settings(&cli);
    let profile = load_profile(&cli)?;
    let frames = cli.frames.max(1);
    let scale = if cli.scale > 0.0 { cli.scale } else { 1.0 };
    let width = (profile.width.max(1) as f64 * scale).round() as u32;
    let height = (profile.height.max(1) as f64 * scale).round() as u32;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("sensor-panel-assets")
        .enable_all()
        .build()
        .context("Failed to start asset runtime")?;

    let assets = AssetCache::with_idle_ttl(
        Arc::new(FileAssetSource),
        runtime.handle().clone(),
        settings.asset_idle_ttl(),
    );
    let sensors = Arc::new(SensorValueCache::new(settings.smoothing_ttl()));
    let compositor = Compositor::new(sensors, assets, settings);

    info!(
        "Rendering '{}' ({}x{} at {} fps) for {} frames",
        profile.name,
        width,
        height,
        profile.frame_rate(),
        frames
    );

    let output = cli.output.clone();
    let options = FrameLoopOptions {
        edit_mode: cli.edit,
        preview: cli.preview,
        scale,
        max_frames: Some(frames),
    };
    let frame_loop = FrameLoop::spawn(
        compositor,
        Arc::new(DemoSensorSource::new()),
        profile,
        options,
        move || CairoSurface::new(width, height),
        move |surface: &mut CairoSurface, frame, stats| {
            if stats.failed > 0 {
                warn!("Frame {}: {} items failed to draw", frame, stats.failed);
            }
            if frame == frames {
                surface.write_png(&output)?;
                info!("Wrote {:?}", output);
            }
            Ok(())
        },
    )?;

    let rendered = frame_loop.join()?;
    if rendered < frames {
        warn!("Only {} of {} frames rendered", rendered, frames);
    }
    println!("Rendered {} frames to {}", rendered, cli.output.display());
    Ok(())
}
