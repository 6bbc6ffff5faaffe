//! Service configuration.
//!
//! Three layers, later ones win: built-in defaults, an optional TOML file
//! (`--config`), then command-line flags and their environment variables.
//!
//! ```toml
//! [server]
//! port = 5000
//! static_dir = "out"
//!
//! [storage]
//! data_dir = "/var/lib/pitchdarts"
//!
//! [sessions]
//! idle_timeout_secs = 3600
//! sweep_interval_secs = 60
//!
//! [schedule]
//! base_url = "https://statsapi.mlb.com"
//! timeout_secs = 10
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_SCHEDULE_URL: &str = "https://statsapi.mlb.com";
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_SCHEDULE_TIMEOUT_SECS: u64 = 10;

// ── TOML file layout ────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub sessions: SessionsSection,
    #[serde(default)]
    pub schedule: ScheduleSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    pub port: Option<u16>,
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionsSection {
    pub idle_timeout_secs: Option<u64>,
    pub sweep_interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleSection {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("invalid config {}", path.display()))
    }
}

// ── Resolved configuration ──────────────────────────────────────

/// Values given on the command line (or via env). `None` means "not set".
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub idle_timeout_secs: Option<u64>,
    pub schedule_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub static_dir: Option<PathBuf>,
    /// Waiting sessions idle longer than this are swept. `None` disables it.
    pub idle_timeout: Option<Duration>,
    pub sweep_interval: Duration,
    pub schedule_url: String,
    pub schedule_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config::resolve(FileConfig::default(), &Overrides::default())
    }
}

impl Config {
    pub fn resolve(file: FileConfig, cli: &Overrides) -> Config {
        let secs = Duration::from_secs;
        Config {
            port: cli.port.or(file.server.port).unwrap_or(DEFAULT_PORT),
            data_dir: cli
                .data_dir
                .clone()
                .or(file.storage.data_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            static_dir: cli.static_dir.clone().or(file.server.static_dir),
            idle_timeout: cli
                .idle_timeout_secs
                .or(file.sessions.idle_timeout_secs)
                .filter(|&s| s > 0)
                .map(secs),
            sweep_interval: secs(
                file.sessions
                    .sweep_interval_secs
                    .filter(|&s| s > 0)
                    .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
            ),
            schedule_url: cli
                .schedule_url
                .clone()
                .or(file.schedule.base_url)
                .unwrap_or_else(|| DEFAULT_SCHEDULE_URL.to_string()),
            schedule_timeout: secs(
                file.schedule
                    .timeout_secs
                    .unwrap_or(DEFAULT_SCHEDULE_TIMEOUT_SECS),
            ),
        }
    }

    /// Read the optional TOML file and apply overrides on top.
    pub fn load(path: Option<&Path>, cli: &Overrides) -> Result<Config> {
        let file = match path {
            Some(p) => FileConfig::load(p)?,
            None => FileConfig::default(),
        };
        Ok(Config::resolve(file, cli))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let c = Config::default();
        assert_eq!(c.port, DEFAULT_PORT);
        assert_eq!(c.data_dir, PathBuf::from("data"));
        assert_eq!(c.idle_timeout, None);
        assert_eq!(c.sweep_interval, Duration::from_secs(60));
        assert_eq!(c.schedule_url, DEFAULT_SCHEDULE_URL);
    }

    #[test]
    fn file_values_override_defaults() {
        let file = FileConfig::from_toml(
            r#"
            [server]
            port = 8080
            [sessions]
            idle_timeout_secs = 600
            [schedule]
            timeout_secs = 3
            "#,
        )
        .unwrap();
        let c = Config::resolve(file, &Overrides::default());
        assert_eq!(c.port, 8080);
        assert_eq!(c.idle_timeout, Some(Duration::from_secs(600)));
        assert_eq!(c.schedule_timeout, Duration::from_secs(3));
    }

    #[test]
    fn flags_override_file() {
        let file = FileConfig::from_toml("[server]\nport = 8080\n[storage]\ndata_dir = \"/srv\"").unwrap();
        let cli = Overrides {
            port: Some(9000),
            ..Default::default()
        };
        let c = Config::resolve(file, &cli);
        assert_eq!(c.port, 9000);
        assert_eq!(c.data_dir, PathBuf::from("/srv"));
    }

    #[test]
    fn zero_idle_timeout_disables_sweep() {
        let cli = Overrides {
            idle_timeout_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(Config::resolve(FileConfig::default(), &cli).idle_timeout, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::from_toml("[server]\nprot = 1").is_err());
        assert!(FileConfig::from_toml("[nonsense]\nx = 1").is_err());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pitchdarts.toml");
        std::fs::write(&path, "[server]\nport = 7777\n").unwrap();
        let c = Config::load(Some(&path), &Overrides::default()).unwrap();
        assert_eq!(c.port, 7777);
        assert!(Config::load(Some(&dir.path().join("missing.toml")), &Overrides::default()).is_err());
    }
}
