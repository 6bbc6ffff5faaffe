//! # Session Manager: Lifecycle Orchestration
//!
//! Creates, joins, advances, and completes two-player sessions. All state
//! lives in the [`Database`]; the manager keeps no session cache of its own,
//! so any number of managers over the same store agree on every session.
//!
//! `join` and `throw` run their transition inside
//! [`Database::update_session`], i.e. under the session's key lock for the
//! full read-compute-write. When a throw ends the game, both players are
//! recorded on the [`Leaderboard`] in the same call, after the session lock
//! is released. A session can only complete once, so each game is recorded
//! at most once. If that recording fails the session stays completed, the
//! throw returns the storage error, and an `error!` line carries the ids
//! needed to replay the result through `POST /games/result`.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

use crate::db::Database;
use crate::error::{GameError, Result};
use crate::leaderboard::{Leaderboard, Participant};
use crate::session::{GameSession, SessionStatus};

pub struct SessionManager {
    db: Arc<Database>,
    leaderboard: Leaderboard,
}

impl SessionManager {
    pub fn new(db: Arc<Database>) -> Self {
        SessionManager {
            leaderboard: Leaderboard::new(db.clone()),
            db,
        }
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn create(&self, host_id: &str, host_name: &str, game_type: &str) -> Result<GameSession> {
        let session = GameSession::new(host_id, host_name, game_type, Utc::now())?;
        self.db.insert_session(&session)?;
        info!(session_id = %session.id, host_id = %host_id, game_type = %game_type, "session created");
        Ok(session)
    }

    pub fn join(&self, session_id: &str, guest_id: &str, guest_name: &str) -> Result<GameSession> {
        let (session, ()) = self
            .db
            .update_session(session_id, |s| s.join(guest_id, guest_name, Utc::now()))?;
        info!(session_id = %session_id, guest_id = %guest_id, "session joined");
        Ok(session)
    }

    pub fn throw(
        &self,
        session_id: &str,
        player_id: &str,
        coordinates: [f64; 2],
    ) -> Result<GameSession> {
        let (session, outcome) = self
            .db
            .update_session(session_id, |s| s.throw(player_id, coordinates, Utc::now()))?;
        info!(
            session_id = %session_id,
            player_id = %player_id,
            zone = %outcome.zone,
            points = outcome.zone.points(),
            host = session.game_state.points.host,
            guest = session.game_state.points.guest,
            "throw accepted"
        );

        if let Some(winner_id) = outcome.winner_id.as_deref() {
            info!(session_id = %session_id, winner_id = %winner_id, "game completed");
            self.record_completion(&session, winner_id)?;
        }
        Ok(session)
    }

    fn record_completion(&self, session: &GameSession, winner_id: &str) -> Result<()> {
        let (Some(guest_id), Some(guest_name)) =
            (session.guest_id.as_deref(), session.guest_name.as_deref())
        else {
            return Err(GameError::InvalidState {
                id: session.id.clone(),
                status: session.status.to_string(),
                action: "record result for",
            });
        };
        let host = Participant {
            id: &session.host_id,
            name: &session.host_name,
        };
        let guest = Participant {
            id: guest_id,
            name: guest_name,
        };
        if let Err(e) = self.leaderboard.record_result(host, guest, winner_id) {
            error!(
                session_id = %session.id,
                player1_id = %host.id,
                player1_name = %host.name,
                player2_id = %guest.id,
                player2_name = %guest.name,
                winner_id = %winner_id,
                error = %e,
                "game completed but result not recorded"
            );
            return Err(e);
        }
        Ok(())
    }

    pub fn get_session(&self, session_id: &str) -> Result<GameSession> {
        self.db
            .get_session(session_id)?
            .ok_or_else(|| GameError::session_not_found(session_id))
    }

    /// Sessions waiting for a guest, keyed by id.
    pub fn list_waiting(&self) -> Result<BTreeMap<String, GameSession>> {
        Ok(self
            .db
            .sessions_with_status(&[SessionStatus::Waiting])?
            .entries)
    }

    /// Every session that has not completed, keyed by id.
    pub fn list_open(&self) -> Result<BTreeMap<String, GameSession>> {
        Ok(self
            .db
            .sessions_with_status(&[SessionStatus::Waiting, SessionStatus::Active])?
            .entries)
    }

    /// Remove waiting sessions idle for longer than `max_idle`. Active and
    /// completed sessions are left alone. Returns the number removed.
    pub fn expire_idle(&self, max_idle: chrono::Duration) -> Result<usize> {
        let now = Utc::now();
        let mut removed = 0;
        for (id, session) in self.list_waiting()? {
            if !session.is_stale(now, max_idle) {
                continue;
            }
            // Re-check under the key lock: a guest may have joined meanwhile.
            if self.db.remove_session_if(&id, |s| s.is_stale(now, max_idle))? {
                info!(session_id = %id, host_id = %session.host_id, "expired idle session");
                removed += 1;
            }
        }
        Ok(removed)
    }
}
