use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use tracing::info;

use racing::DynamicsParams;
use racing::sim::{DEFAULT_TICK_HZ, DriveScript, DriveSession};
use racing::track::TrackGeometry;
use racing::track_format::TrackFile;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Track file to use instead of the builtin track
    #[arg(long, global = true)]
    track: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build track geometry and write it as JSON
    Geometry {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Drive a scripted lap start and print telemetry frames as JSON lines
    Drive {
        #[arg(long)]
        tuning: Option<PathBuf>,
        /// Phases like `forward:3,forward+right:2,none:4`
        #[arg(long)]
        script: Option<DriveScript>,
        #[arg(long, default_value_t = DEFAULT_TICK_HZ)]
        hz: u32,
        /// Print a frame every N ticks
        #[arg(long, default_value_t = 6)]
        every: u64,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "racing=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let track_file = load_track(cli.track.as_deref())?;
    let geometry = TrackGeometry::build(&track_file)?;
    info!(
        track = %geometry.name,
        samples = geometry.centerline.len(),
        left_barriers = geometry.left_barriers.len(),
        right_barriers = geometry.right_barriers.len(),
        "track ready"
    );

    match cli.command {
        Commands::Geometry { out } => {
            let record = geometry.to_record();
            let json = serde_json::to_string_pretty(&record)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .wrap_err_with(|| format!("failed to write {}", path.display()))?;
                    info!(path = %path.display(), "wrote geometry");
                }
                None => println!("{json}"),
            }
        }
        Commands::Drive {
            tuning,
            script,
            hz,
            every,
        } => {
            let params = match tuning {
                Some(path) => DynamicsParams::load(&path)?,
                None => DynamicsParams::default(),
            };
            let script = script.unwrap_or_default();
            info!(seconds = script.total_seconds(), hz, "starting drive");

            let mut session = DriveSession::new(params, geometry.start, hz);
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let mut write_error = None;
            let last = session.run(&script, every, |frame| {
                if write_error.is_some() {
                    return;
                }
                let line = serde_json::to_string(frame).map_err(std::io::Error::from);
                if let Err(e) = line.and_then(|line| writeln!(out, "{line}")) {
                    write_error = Some(e);
                }
            });
            if let Some(e) = write_error {
                return Err(e).wrap_err("failed to write telemetry");
            }
            info!(
                ticks = last.tick,
                speed_kmh = last.speed_kmh,
                boost = last.boost,
                "drive finished"
            );
        }
    }

    Ok(())
}

fn load_track(path: Option<&Path>) -> Result<TrackFile> {
    let track = match path {
        Some(path) => TrackFile::load(path)?,
        None => TrackFile::load_builtin()?,
    };
    Ok(track)
}
