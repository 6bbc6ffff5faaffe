//! CLI integration tests using assert_cmd.
//!
//! Data directories are seeded through the library, then read back by the
//! binary.

use assert_cmd::Command;
use pitchdarts::db::Database;
use pitchdarts::leaderboard::{Leaderboard, Participant};
use predicates::prelude::*;
use std::sync::Arc;

#[allow(deprecated)]
fn pitchdarts() -> Command {
    let mut cmd = Command::cargo_bin("pitchdarts").unwrap();
    cmd.env_remove("PITCHDARTS_DATA_DIR")
        .env_remove("PITCHDARTS_CONFIG");
    cmd
}

fn p(id: &str) -> Participant<'_> {
    Participant { id, name: id }
}

fn seeded_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let board = Leaderboard::new(Arc::new(Database::open(dir.path()).unwrap()));
    board.record_result(p("ann"), p("bob"), "ann").unwrap();
    board.record_result(p("ann"), p("cy"), "ann").unwrap();
    board.record_result(p("cy"), p("bob"), "cy").unwrap();
    dir
}

#[test]
fn help_shows_all_subcommands() {
    pitchdarts().arg("--help").assert().success().stdout(
        predicate::str::contains("serve")
            .and(predicate::str::contains("leaderboard"))
            .and(predicate::str::contains("player"))
            .and(predicate::str::contains("export")),
    );
}

#[test]
fn help_serve_shows_args() {
    pitchdarts()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--port")
                .and(predicate::str::contains("--idle-timeout-secs"))
                .and(predicate::str::contains("--schedule-url"))
                .and(predicate::str::contains("--in-memory")),
        );
}

#[test]
fn missing_subcommand_fails() {
    pitchdarts().assert().failure();
}

#[test]
fn leaderboard_on_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    pitchdarts()
        .arg("--data-dir")
        .arg(dir.path())
        .arg("leaderboard")
        .assert()
        .success()
        .stdout(predicate::str::contains("No completed games yet."));
}

#[test]
fn leaderboard_prints_ranked_rows() {
    let dir = seeded_dir();
    let output = pitchdarts()
        .arg("--data-dir")
        .arg(dir.path())
        .args(["leaderboard", "--limit", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("RANK"));
    assert!(lines[1].contains("ann"));
    assert!(lines[2].contains("cy"));
}

#[test]
fn player_prints_record() {
    let dir = seeded_dir();
    pitchdarts()
        .env("PITCHDARTS_DATA_DIR", dir.path())
        .args(["player", "bob"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"gamesPlayed\": 2").and(predicate::str::contains("\"wins\": 0")),
        );
}

#[test]
fn unknown_player_exits_non_zero() {
    let dir = seeded_dir();
    pitchdarts()
        .arg("--data-dir")
        .arg(dir.path())
        .args(["player", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn export_players_document() {
    let dir = seeded_dir();
    let output = pitchdarts()
        .arg("--data-dir")
        .arg(dir.path())
        .args(["export", "--namespace", "players"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["players"]["ann"]["wins"], 2);
    assert!(doc["lastUpdated"].is_string());
}

#[test]
fn export_everything() {
    let dir = seeded_dir();
    let output = pitchdarts()
        .arg("--data-dir")
        .arg(dir.path())
        .arg("export")
        .output()
        .unwrap();
    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(doc["sessions"]["sessions"].as_object().unwrap().is_empty());
    assert_eq!(doc["players"]["players"].as_object().unwrap().len(), 3);
}

#[test]
fn config_file_sets_data_dir() {
    let dir = seeded_dir();
    let cfg_dir = tempfile::tempdir().unwrap();
    let cfg = cfg_dir.path().join("pitchdarts.toml");
    std::fs::write(
        &cfg,
        format!("[storage]\ndata_dir = {:?}\n", dir.path().to_str().unwrap()),
    )
    .unwrap();
    pitchdarts()
        .arg("--config")
        .arg(&cfg)
        .args(["player", "ann"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"wins\": 2"));
}

#[test]
fn config_with_unknown_key_fails() {
    let cfg_dir = tempfile::tempdir().unwrap();
    let cfg = cfg_dir.path().join("bad.toml");
    std::fs::write(&cfg, "[server]\nprot = 5000\n").unwrap();
    pitchdarts()
        .arg("--config")
        .arg(&cfg)
        .arg("leaderboard")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"));
}
