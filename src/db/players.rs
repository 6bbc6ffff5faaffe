//! Player-record namespace helpers.

use super::Database;
use crate::error::Result;
use crate::leaderboard::PlayerRecord;

impl Database {
    pub fn get_player(&self, id: &str) -> Result<Option<PlayerRecord>> {
        Ok(self.players.get(id)?)
    }

    /// Create-or-update a record under the player's key lock.
    pub fn upsert_player(&self, id: &str, f: impl FnOnce(&mut PlayerRecord)) -> Result<PlayerRecord> {
        Ok(self
            .players
            .transact(id, || PlayerRecord::new(id, ""), f)?)
    }

    pub fn all_players(&self) -> Result<Vec<PlayerRecord>> {
        Ok(self.players.snapshot()?.entries.into_values().collect())
    }
}
