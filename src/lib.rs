//! Two-player pitch-darts: turn-based sessions scored against a strike-zone
//! grid, persisted per key, with a win/loss leaderboard and an HTTP API.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod leaderboard;
pub mod manager;
pub mod prom_metrics;
pub mod schedule;
pub mod scoring;
pub mod session;
