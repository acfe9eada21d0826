//! cubeworld - a fixed-size voxel world with capsule physics
//!
//! Headless executable: generates a world, runs a scripted player session
//! and reports what happened.

mod config;
mod driver;

use anyhow::Result;
use clap::Parser;
use config::{SimConfig, DEFAULT_CONFIG_PATH};
use cubeworld_testkit::JsonlSink;
use driver::{spawn_surface, Session};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a headless cubeworld session", long_about = None)]
struct Args {
    /// TOML config file; missing or invalid files fall back to defaults
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Override the terrain seed
    #[arg(long)]
    seed: Option<u64>,
    /// Number of rendered frames to simulate
    #[arg(long, default_value_t = 600)]
    frames: u32,
    /// Frame duration in milliseconds
    #[arg(long, default_value_t = 16.0)]
    frame_ms: f32,
    /// Write a JSONL event log here
    #[arg(long)]
    events: Option<PathBuf>,
    /// Write the effective config to this path and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting cubeworld v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let mut config = SimConfig::load_from_path(&args.config);
    if let Some(seed) = args.seed {
        config.terrain.seed = seed;
    }

    if let Some(path) = args.dump_config.as_deref() {
        config.save_to_path(path)?;
        info!("Wrote config to {}", path.display());
        return Ok(());
    }

    let frame_dt = if args.frame_ms.is_finite() && args.frame_ms > 0.0 {
        args.frame_ms / 1000.0
    } else {
        warn!("--frame-ms must be positive, using 16");
        0.016
    };

    let sink = args.events.as_deref().map(JsonlSink::create).transpose()?;
    let mut session = Session::new(config, sink)?;
    if let Some(surface) = spawn_surface(session.world()) {
        info!(?surface, "spawn column surface");
    }

    session.run_script(args.frames, frame_dt)?;
    let summary = session.finish()?;

    info!(
        seed = summary.seed,
        frames = summary.frames,
        ticks = summary.ticks,
        breaks = summary.breaks,
        places = summary.places,
        jumps = summary.jumps,
        respawns = summary.respawns,
        grounded = summary.grounded,
        "session finished"
    );
    for (kind, live) in &summary.live_counts {
        info!(kind = %kind, live, "batch");
    }
    if summary.invariant_violations > 0 {
        anyhow::bail!(
            "{} render-batch invariant violations after the session",
            summary.invariant_violations
        );
    }
    Ok(())
}
