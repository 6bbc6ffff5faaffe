//! Session namespace helpers.
//!
//! Sessions are keyed by their UUID. The only writers are `insert_session`
//! (fresh ids, so no contention) and `update_session`, which runs a
//! transition under the session's key lock.

use super::{Database, Snapshot};
use crate::error::{GameError, Result};
use crate::session::{GameSession, SessionStatus};

impl Database {
    pub fn get_session(&self, id: &str) -> Result<Option<GameSession>> {
        Ok(self.sessions.get(id)?)
    }

    pub fn insert_session(&self, session: &GameSession) -> Result<()> {
        Ok(self.sessions.put(&session.id, session)?)
    }

    /// Apply `f` to the stored session under its lock. Fails `NotFound` if
    /// the id is unknown; an error from `f` leaves the stored copy untouched.
    pub fn update_session<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut GameSession) -> Result<R>,
    ) -> Result<(GameSession, R)> {
        self.sessions.update(id, |current| {
            let mut session = current.ok_or_else(|| GameError::session_not_found(id))?;
            let extra = f(&mut session)?;
            Ok((session, extra))
        })
    }

    pub fn sessions_snapshot(&self) -> Result<Snapshot<GameSession>> {
        Ok(self.sessions.snapshot()?)
    }

    /// Sessions whose status is in `statuses`, keyed by id.
    pub fn sessions_with_status(
        &self,
        statuses: &[SessionStatus],
    ) -> Result<Snapshot<GameSession>> {
        let mut snap = self.sessions_snapshot()?;
        snap.entries.retain(|_, s| statuses.contains(&s.status));
        Ok(snap)
    }

    /// Delete a session only if `pred` still holds under its lock.
    pub fn remove_session_if(&self, id: &str, pred: impl FnOnce(&GameSession) -> bool) -> Result<bool> {
        Ok(self.sessions.remove_if(id, pred)?)
    }
}
