//! hvc-fusion command-line entry point.
//!
//! Replays a recorded sensor session through the stabilizer and prints every
//! frame in the sensor console layout.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use hvc_fusion::{
    Config, ExecFlags, FramePipeline, ReplayDevice, ResultFormatter, StabilizeFlags, Stabilizer,
    album,
};

#[derive(Parser, Debug)]
#[command(name = "hvc-fusion")]
#[command(about = "Stabilize and fuse HVC sensor results")]
#[command(version)]
struct Cli {
    /// Recorded frames (JSON array)
    #[arg(short, long, global = true, env = "HVC_FUSION_FRAMES")]
    frames: Option<PathBuf>,

    /// Stabilization on or off; overrides the config file
    #[arg(long, global = true, value_enum)]
    stb: Option<Stb>,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "HVC_FUSION_CONFIG")]
    config: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(long, global = true)]
    max_frames: Option<u64>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detection and estimation
    Execute,
    /// Face recognition against the album
    Identify {
        /// Write the device album here after the run
        #[arg(long)]
        save_album: Option<PathBuf>,
    },
    /// Verify faces against one enrolled user
    Verify {
        /// User to verify, 0..=999
        #[arg(long)]
        user_id: i32,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Stb {
    On,
    Off,
}

/// Capabilities and stabilizer functions for one mode.
struct Mode {
    exec: ExecFlags,
    functions: Option<StabilizeFlags>,
}

impl Command {
    fn mode(&self, stabilize: bool) -> Mode {
        match self {
            Command::Execute => Mode {
                exec: ExecFlags::ESTIMATION,
                functions: stabilize.then_some(
                    StabilizeFlags::BODY
                        | StabilizeFlags::FACE
                        | StabilizeFlags::DIRECTION
                        | StabilizeFlags::AGE
                        | StabilizeFlags::GENDER,
                ),
            },
            Command::Identify { .. } if stabilize => Mode {
                exec: ExecFlags::FACE | ExecFlags::DIRECTION | ExecFlags::RECOGNITION,
                functions: Some(
                    StabilizeFlags::FACE | StabilizeFlags::DIRECTION | StabilizeFlags::RECOGNITION,
                ),
            },
            Command::Identify { .. } => Mode {
                exec: ExecFlags::FACE | ExecFlags::RECOGNITION,
                functions: None,
            },
            // Verification is never stabilized
            Command::Verify { .. } => Mode {
                exec: ExecFlags::FACE | ExecFlags::VERIFICATION,
                functions: None,
            },
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(stb) = cli.stb {
        config.stabilization.enabled = matches!(stb, Stb::On);
    }

    let frames = cli.frames.as_ref().context("--frames is required")?;
    let mut device = ReplayDevice::from_file(frames)
        .with_context(|| format!("Failed to load {}", frames.display()))?;

    match &cli.command {
        Command::Identify { .. } => match album::load(&config.album.path) {
            Ok(album) => {
                info!(bytes = album.len(), "Using album {}", config.album.path.display());
                device.load_album(album);
            }
            Err(err) => warn!(%err, "No album loaded from {}", config.album.path.display()),
        },
        Command::Verify { user_id } => {
            if !(0..=999).contains(user_id) {
                bail!("Invalid user ID {user_id}");
            }
            println!("Verify user ID = {user_id}");
        }
        Command::Execute => {}
    }

    let mode = cli.command.mode(config.stabilization.enabled);
    let tracker = match mode.functions {
        Some(functions) => {
            config.tracker.functions = functions;
            let stabilizer = Stabilizer::new(config.tracker.clone())
                .context("Failed to initialize stabilizer")?;
            Some(stabilizer)
        }
        None => None,
    };

    let mut pipeline = FramePipeline::new(device, tracker);
    pipeline
        .configure(&config.device)
        .context("Failed to configure device")?;

    let formatter = ResultFormatter::new();
    let mut skipped = 0;
    while pipeline.device().remaining() > 0
        && cli.max_frames.is_none_or(|max| pipeline.frame_count() < max)
    {
        let fused = pipeline.process_frame(mode.exec)?;
        skipped += fused.report.skipped;
        println!("{}", formatter.render(&fused));
    }

    info!(
        frames = pipeline.frame_count(),
        stabilized = mode.functions.is_some(),
        skipped,
        "Replay finished"
    );

    if let Command::Identify {
        save_album: Some(path),
    } = &cli.command
    {
        match pipeline.device().album() {
            Some(album) => album::save(path, album.as_bytes())
                .with_context(|| format!("Failed to save album to {}", path.display()))?,
            None => warn!("No album to save"),
        }
    }
    Ok(())
}
