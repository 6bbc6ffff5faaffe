//! # CLI Execution Functions
//!
//! Subcommand bodies, kept out of `main.rs`. Everything except `serve` reads
//! the store directly and prints to stdout.

use anyhow::{Context, Result};
use pitchdarts::config::{Config, Overrides};
use pitchdarts::db::Database;
use pitchdarts::leaderboard::{Leaderboard, MAX_LIMIT};
use std::sync::Arc;
use tracing::info;

use super::{Cli, Commands, ExportNamespace};

/// Merge the TOML file (if any) with flags and env.
pub fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut overrides = Overrides {
        data_dir: cli.data_dir.clone(),
        ..Default::default()
    };
    if let Commands::Serve {
        port,
        idle_timeout_secs,
        schedule_url,
        static_dir,
        ..
    } = &cli.command
    {
        overrides.port = *port;
        overrides.idle_timeout_secs = *idle_timeout_secs;
        overrides.schedule_url = schedule_url.clone();
        overrides.static_dir = static_dir.clone();
    }
    Config::load(cli.config.as_deref(), &overrides)
}

fn open_store(config: &Config) -> Result<Arc<Database>> {
    let db = Database::open(&config.data_dir)
        .with_context(|| format!("failed to open data dir {}", config.data_dir.display()))?;
    Ok(Arc::new(db))
}

pub fn run_serve(config: &Config, in_memory: bool) -> Result<()> {
    let db = if in_memory {
        info!("using in-memory store, nothing will be persisted");
        Arc::new(Database::in_memory())
    } else {
        open_store(config)?
    };
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(pitchdarts::api::run(config, db))
}

pub fn run_leaderboard(config: &Config, limit: usize) -> Result<()> {
    let board = Leaderboard::new(open_store(config)?);
    let players = board.top_players(limit.clamp(1, MAX_LIMIT))?;
    if players.is_empty() {
        println!("No completed games yet.");
        return Ok(());
    }
    println!(
        "{:>4}  {:<20} {:<20} {:>5} {:>6}",
        "RANK", "ID", "USERNAME", "WINS", "PLAYED"
    );
    for (i, p) in players.iter().enumerate() {
        println!(
            "{:>4}  {:<20} {:<20} {:>5} {:>6}",
            i + 1,
            p.id,
            p.username,
            p.wins,
            p.games_played
        );
    }
    Ok(())
}

pub fn run_player(config: &Config, id: &str) -> Result<()> {
    let board = Leaderboard::new(open_store(config)?);
    let record = board.get_player(id)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// Print the persisted documents, one per namespace.
pub fn run_export(config: &Config, namespace: Option<ExportNamespace>) -> Result<()> {
    let store = open_store(config)?;
    let doc = match namespace {
        Some(ExportNamespace::Sessions) => store.sessions.snapshot()?.to_document()?,
        Some(ExportNamespace::Players) => store.players.snapshot()?.to_document()?,
        None => serde_json::json!({
            "sessions": store.sessions.snapshot()?.to_document()?,
            "players": store.players.snapshot()?.to_document()?,
        }),
    };
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}
