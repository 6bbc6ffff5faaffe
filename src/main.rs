//! # Main: CLI Entry Point
//!
//! `serve` runs the HTTP service; `leaderboard`, `player` and `export` read
//! the data directory directly for operators.
//!
//! ## Global Options
//!
//! - `--config` / `PITCHDARTS_CONFIG`: optional TOML file (see `config`).
//! - `--data-dir` / `PITCHDARTS_DATA_DIR`: store root, default `./data`.
//!
//! Logging: `LOG_FORMAT=json` for JSON lines, otherwise human-readable on
//! stderr. Filter with `RUST_LOG` (default `info`).

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pitchdarts", about = "Two-player pitch-darts session server")]
struct Cli {
    /// TOML config file
    #[arg(long, env = "PITCHDARTS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Directory holding session and player records
    #[arg(long, env = "PITCHDARTS_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Port to listen on (default 5000)
        #[arg(long, env = "PITCHDARTS_PORT")]
        port: Option<u16>,
        /// Remove waiting sessions idle longer than this many seconds
        #[arg(long, env = "PITCHDARTS_IDLE_TIMEOUT_SECS")]
        idle_timeout_secs: Option<u64>,
        /// Base URL of the stats provider for /games and /live
        #[arg(long, env = "PITCHDARTS_SCHEDULE_URL")]
        schedule_url: Option<String>,
        /// Serve a built frontend from this directory
        #[arg(long)]
        static_dir: Option<PathBuf>,
        /// Keep everything in memory (nothing survives a restart)
        #[arg(long)]
        in_memory: bool,
    },
    /// Print the top players
    Leaderboard {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print one player's record
    Player { id: String },
    /// Dump stored records as JSON
    Export {
        #[arg(long, value_enum)]
        namespace: Option<ExportNamespace>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportNamespace {
    Sessions,
    Players,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();
    let config = cli::resolve_config(&cli)?;

    match &cli.command {
        Commands::Serve { in_memory, .. } => cli::run_serve(&config, *in_memory),
        Commands::Leaderboard { limit } => cli::run_leaderboard(&config, *limit),
        Commands::Player { id } => cli::run_player(&config, id),
        Commands::Export { namespace } => cli::run_export(&config, *namespace),
    }
}
