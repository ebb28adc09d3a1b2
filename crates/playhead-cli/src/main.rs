//! Playhead CLI - Headless player tooling
//!
//! Features:
//! - Timecode conversion in both directions
//! - Start-time parsing (durations, timecodes, query strings)
//! - Buffered range display math
//! - Scripted session replay against a simulated media element
//! - Keyboard shortcut listing

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

/// Playhead CLI - Video player logic toolkit
#[derive(Parser)]
#[command(name = "playhead")]
#[command(version)]
#[command(about = "Headless video player state and timecode toolkit", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Player configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert seconds to a timecode
    Timecode {
        /// Time in seconds
        #[arg(allow_hyphen_values = true)]
        seconds: f64,

        /// Frames per second (defaults to the configured frame rate)
        #[arg(short = 'r', long)]
        frame_rate: Option<f64>,
    },

    /// Convert a timecode to seconds
    Seconds {
        /// Timecode such as 01:02:03:04
        timecode: String,

        #[arg(short = 'r', long)]
        frame_rate: Option<f64>,
    },

    /// Parse a start time into milliseconds
    StartTime {
        /// Duration ("1m30s"), timecode ("0:01:30:00"), or query string with --query
        value: String,

        #[arg(short = 'r', long)]
        frame_rate: Option<f64>,

        /// Treat the value as a query string and read its `t` parameter
        #[arg(short, long)]
        query: bool,
    },

    /// Compute buffered sections as percentages of the duration
    Buffered {
        /// Media duration in seconds
        duration: f64,

        /// Buffered ranges as start:end pairs in seconds
        ranges: Vec<String>,
    },

    /// Replay a scripted session against a simulated media element
    Replay {
        /// Script file (JSON)
        script: PathBuf,
    },

    /// List keyboard shortcuts
    Shortcuts,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    playhead_core::init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Timecode { seconds, frame_rate } => {
            commands::timecode(seconds, frame_rate.unwrap_or(config.frame_rate), &cli.format)?;
        }
        Commands::Seconds { timecode, frame_rate } => {
            commands::seconds(&timecode, frame_rate.unwrap_or(config.frame_rate), &cli.format)?;
        }
        Commands::StartTime { value, frame_rate, query } => {
            let frame_rate = frame_rate.unwrap_or(config.frame_rate);
            commands::start_time(&value, frame_rate, query, &cli.format)?;
        }
        Commands::Buffered { duration, ranges } => {
            commands::buffered(duration, &ranges, &cli.format)?;
        }
        Commands::Replay { script } => {
            commands::replay(&script, config, &cli.format)?;
        }
        Commands::Shortcuts => {
            commands::shortcuts(&cli.format)?;
        }
    }

    Ok(())
}
