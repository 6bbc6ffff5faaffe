//! # Session: Two-Player Turn State Machine
//!
//! A [`GameSession`] moves through `waiting → active → completed`, never
//! backward and never skipping a state. Transition functions take the current
//! session by `&mut` and either apply the whole change or return an error and
//! leave it untouched.
//!
//! | Status | `join` | `throw` |
//! |--------|--------|---------|
//! | waiting | → active | InvalidState |
//! | active | InvalidState | score, flip turn, maybe → completed |
//! | completed | InvalidState | InvalidState |
//!
//! Persistence and locking live in [`crate::db`]; these functions are pure
//! apart from the timestamp they are handed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{require, require_id, GameError, Result};
use crate::scoring::{self, Zone};

/// First side to reach this many points wins.
pub const WIN_THRESHOLD: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Active,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Waiting => "waiting",
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Host,
    Guest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Points {
    pub host: u32,
    pub guest: u32,
}

impl Points {
    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Host => self.host,
            Side::Guest => self.guest,
        }
    }

    fn add(&mut self, side: Side, points: u32) -> u32 {
        let slot = match side {
            Side::Host => &mut self.host,
            Side::Guest => &mut self.guest,
        };
        *slot = slot.saturating_add(points);
        *slot
    }
}

/// The most recent throw, overwritten on every accepted throw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPitch {
    pub player_id: String,
    pub coordinates: [f64; 2],
    pub result: Zone,
    pub points: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub points: Points,
    pub current_pitch: Option<CurrentPitch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub id: String,
    pub host_id: String,
    pub host_name: String,
    pub guest_id: Option<String>,
    pub guest_name: Option<String>,
    pub game_type: String,
    pub status: SessionStatus,
    pub current_turn: String,
    pub game_state: GameState,
    pub winner_id: Option<String>,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// What a single accepted throw did.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrowOutcome {
    pub zone: Zone,
    /// Set when this throw ended the game.
    pub winner_id: Option<String>,
}

impl GameSession {
    /// A fresh waiting session. The id is a random UUID, independent of the
    /// host so rapid creation by one host never collides.
    pub fn new(host_id: &str, host_name: &str, game_type: &str, now: DateTime<Utc>) -> Result<Self> {
        require_id("hostId", host_id)?;
        require("hostName", host_name)?;
        require("gameType", game_type)?;
        Ok(GameSession {
            id: uuid::Uuid::new_v4().to_string(),
            host_id: host_id.to_string(),
            host_name: host_name.to_string(),
            guest_id: None,
            guest_name: None,
            game_type: game_type.to_string(),
            status: SessionStatus::Waiting,
            current_turn: host_id.to_string(),
            game_state: GameState::default(),
            winner_id: None,
            created: now,
            last_updated: now,
        })
    }

    pub fn side_of(&self, player_id: &str) -> Option<Side> {
        if player_id == self.host_id {
            Some(Side::Host)
        } else if self.guest_id.as_deref() == Some(player_id) {
            Some(Side::Guest)
        } else {
            None
        }
    }

    pub fn points(&self) -> Points {
        self.game_state.points
    }

    fn player_id(&self, side: Side) -> Option<&str> {
        match side {
            Side::Host => Some(&self.host_id),
            Side::Guest => self.guest_id.as_deref(),
        }
    }

    fn invalid_state(&self, action: &'static str) -> GameError {
        GameError::InvalidState {
            id: self.id.clone(),
            status: self.status.to_string(),
            action,
        }
    }

    /// Seat a guest and start the game. Only legal while waiting; a second
    /// join on an active session is rejected so nobody can take over a game
    /// in progress.
    pub fn join(&mut self, guest_id: &str, guest_name: &str, now: DateTime<Utc>) -> Result<()> {
        require_id("guestId", guest_id)?;
        require("guestName", guest_name)?;
        match self.status {
            SessionStatus::Waiting => {}
            SessionStatus::Active | SessionStatus::Completed => {
                return Err(self.invalid_state("join"));
            }
        }
        if guest_id == self.host_id {
            return Err(GameError::validation("host cannot join their own session"));
        }
        self.guest_id = Some(guest_id.to_string());
        self.guest_name = Some(guest_name.to_string());
        self.status = SessionStatus::Active;
        self.last_updated = now;
        Ok(())
    }

    /// Score one throw for `player_id` and pass the turn.
    pub fn throw(
        &mut self,
        player_id: &str,
        coordinates: [f64; 2],
        now: DateTime<Utc>,
    ) -> Result<ThrowOutcome> {
        require("playerId", player_id)?;
        if !coordinates.iter().all(|c| c.is_finite()) {
            return Err(GameError::validation(
                "pitchCoordinates must be two finite numbers",
            ));
        }
        match self.status {
            SessionStatus::Active => {}
            SessionStatus::Waiting | SessionStatus::Completed => {
                return Err(self.invalid_state("throw in"));
            }
        }
        if player_id != self.current_turn {
            return Err(GameError::NotYourTurn {
                player: player_id.to_string(),
                expected: self.current_turn.clone(),
            });
        }
        let (side, other) = match self.side_of(player_id) {
            Some(Side::Host) => (Side::Host, Side::Guest),
            Some(Side::Guest) => (Side::Guest, Side::Host),
            // current_turn always names a seated player while active
            None => return Err(self.invalid_state("throw in")),
        };
        let next_turn = match self.player_id(other) {
            Some(id) => id.to_string(),
            None => return Err(self.invalid_state("throw in")),
        };

        let zone = scoring::classify(coordinates[0], coordinates[1]);
        let total = self.game_state.points.add(side, zone.points());
        self.game_state.current_pitch = Some(CurrentPitch {
            player_id: player_id.to_string(),
            coordinates,
            result: zone,
            points: zone.points(),
        });
        self.current_turn = next_turn;
        self.last_updated = now;

        let winner_id = if total >= WIN_THRESHOLD {
            self.status = SessionStatus::Completed;
            self.winner_id = Some(player_id.to_string());
            Some(player_id.to_string())
        } else {
            None
        };
        Ok(ThrowOutcome { zone, winner_id })
    }

    /// Waiting sessions untouched for longer than `max_idle`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_idle: chrono::Duration) -> bool {
        self.status == SessionStatus::Waiting && now - self.last_updated > max_idle
    }
}
