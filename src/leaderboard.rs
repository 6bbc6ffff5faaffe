//! # Leaderboard: Win/Loss Aggregation Across Completed Games
//!
//! One [`PlayerRecord`] per player id, created lazily the first time a game
//! involving that player completes and never deleted. Each upsert runs under
//! the player's key lock, so two games finishing at once for the same player
//! both count.
//!
//! Ranking: most wins first, then fewest games played (the more efficient
//! winner ranks higher), then player id so the order is total.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

use crate::db::Database;
use crate::error::{require, require_id, GameError, Result};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub id: String,
    /// Last-seen display name.
    pub username: String,
    pub wins: u32,
    pub games_played: u32,
    pub last_played: DateTime<Utc>,
}

impl PlayerRecord {
    pub fn new(id: &str, username: &str) -> Self {
        PlayerRecord {
            id: id.to_string(),
            username: username.to_string(),
            wins: 0,
            games_played: 0,
            last_played: Utc::now(),
        }
    }

    pub fn losses(&self) -> u32 {
        self.games_played.saturating_sub(self.wins)
    }
}

fn ranking_order(a: &PlayerRecord, b: &PlayerRecord) -> Ordering {
    b.wins
        .cmp(&a.wins)
        .then(a.games_played.cmp(&b.games_played))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort into leaderboard order and keep the first `limit`.
pub fn rank(mut players: Vec<PlayerRecord>, limit: usize) -> Vec<PlayerRecord> {
    players.sort_by(ranking_order);
    players.truncate(limit);
    players
}

/// One player's side of a finished game.
#[derive(Debug, Clone, Copy)]
pub struct Participant<'a> {
    pub id: &'a str,
    pub name: &'a str,
}

pub struct Leaderboard {
    db: Arc<Database>,
}

impl Leaderboard {
    pub fn new(db: Arc<Database>) -> Self {
        Leaderboard { db }
    }

    /// Count one finished game for both players. `winner_id` matching
    /// neither player is accepted and counts as a loss for both.
    pub fn record_result(
        &self,
        player1: Participant<'_>,
        player2: Participant<'_>,
        winner_id: &str,
    ) -> Result<(PlayerRecord, PlayerRecord)> {
        require_id("player1Id", player1.id)?;
        require("player1Name", player1.name)?;
        require_id("player2Id", player2.id)?;
        require("player2Name", player2.name)?;
        require("winnerId", winner_id)?;
        if player1.id == player2.id {
            return Err(GameError::validation(
                "player1Id and player2Id must be different players",
            ));
        }
        let first = self.update_player(player1, winner_id)?;
        let second = self.update_player(player2, winner_id)?;
        Ok((first, second))
    }

    fn update_player(&self, player: Participant<'_>, winner_id: &str) -> Result<PlayerRecord> {
        let won = player.id == winner_id;
        let record = self.db.upsert_player(player.id, |rec| {
            rec.username = player.name.to_string();
            rec.games_played += 1;
            if won {
                rec.wins += 1;
            }
            rec.last_played = Utc::now();
        })?;
        debug!(
            player_id = %record.id,
            wins = record.wins,
            games_played = record.games_played,
            won,
            "leaderboard updated"
        );
        Ok(record)
    }

    pub fn top_players(&self, limit: usize) -> Result<Vec<PlayerRecord>> {
        Ok(rank(self.db.all_players()?, limit))
    }

    pub fn get_player(&self, id: &str) -> Result<PlayerRecord> {
        self.db
            .get_player(id)?
            .ok_or_else(|| GameError::player_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, wins: u32, games: u32) -> PlayerRecord {
        PlayerRecord {
            wins,
            games_played: games,
            ..PlayerRecord::new(id, id)
        }
    }

    fn board() -> Leaderboard {
        Leaderboard::new(Arc::new(Database::in_memory()))
    }

    fn p<'a>(id: &'a str, name: &'a str) -> Participant<'a> {
        Participant { id, name }
    }

    #[test]
    fn rank_prefers_wins_then_efficiency() {
        let ranked = rank(
            vec![record("a", 5, 10), record("b", 5, 8), record("c", 3, 3)],
            10,
        );
        let order: Vec<_> = ranked.iter().map(|r| (r.wins, r.games_played)).collect();
        assert_eq!(order, vec![(5, 8), (5, 10), (3, 3)]);
    }

    #[test]
    fn rank_breaks_full_ties_by_id_and_truncates() {
        let ranked = rank(
            vec![record("zed", 1, 1), record("amy", 1, 1), record("kim", 0, 4)],
            2,
        );
        let ids: Vec<_> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["amy", "zed"]);
    }

    #[test]
    fn record_result_creates_and_updates_both_players() {
        let lb = board();
        let (a, b) = lb
            .record_result(p("a", "Ann"), p("b", "Bob"), "a")
            .unwrap();
        assert_eq!((a.wins, a.games_played), (1, 1));
        assert_eq!((b.wins, b.games_played), (0, 1));
        assert_eq!(b.losses(), 1);

        lb.record_result(p("b", "Bobby"), p("a", "Ann"), "b").unwrap();
        let bob = lb.get_player("b").unwrap();
        assert_eq!((bob.wins, bob.games_played), (1, 2));
        assert_eq!(bob.username, "Bobby");
    }

    #[test]
    fn unknown_winner_counts_as_loss_for_both() {
        let lb = board();
        lb.record_result(p("a", "Ann"), p("b", "Bob"), "nobody").unwrap();
        assert_eq!(lb.get_player("a").unwrap().wins, 0);
        assert_eq!(lb.get_player("b").unwrap().games_played, 1);
    }

    #[test]
    fn record_result_validates_fields() {
        let lb = board();
        assert!(matches!(
            lb.record_result(p("a", ""), p("b", "Bob"), "a"),
            Err(GameError::Validation(_))
        ));
        assert!(matches!(
            lb.record_result(p("a", "Ann"), p("a", "Ann"), "a"),
            Err(GameError::Validation(_))
        ));
        assert!(lb.top_players(10).unwrap().is_empty());
    }

    #[test]
    fn overlong_ids_are_rejected_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let lb = Leaderboard::new(Arc::new(Database::open(dir.path()).unwrap()));
        let long = "p".repeat(300);
        assert!(matches!(
            lb.record_result(p("c", "Cy"), p(&long, "Long"), "c"),
            Err(GameError::Validation(_))
        ));
        assert!(matches!(lb.get_player("c"), Err(GameError::NotFound { .. })));
        assert!(matches!(lb.get_player(&long), Err(GameError::NotFound { .. })));
        let accented = "é".repeat(50);
        assert!(matches!(lb.get_player(&accented), Err(GameError::NotFound { .. })));
    }

    #[test]
    fn get_player_not_found() {
        let err = board().get_player("ghost").unwrap_err();
        assert!(matches!(err, GameError::NotFound { kind: "player", .. }));
    }

    #[test]
    fn top_players_reads_from_store() {
        let lb = board();
        lb.record_result(p("a", "Ann"), p("b", "Bob"), "a").unwrap();
        lb.record_result(p("a", "Ann"), p("c", "Cy"), "a").unwrap();
        lb.record_result(p("c", "Cy"), p("b", "Bob"), "c").unwrap();
        let top = lb.top_players(2).unwrap();
        let ids: Vec<_> = top.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn record_serializes_camel_case() {
        let json = serde_json::to_value(record("a", 2, 3)).unwrap();
        assert_eq!(json["gamesPlayed"], 3);
        assert!(json.get("lastPlayed").is_some());
    }
}
