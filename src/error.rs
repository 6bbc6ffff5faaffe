//! Error taxonomy shared by the session engine, the leaderboard, and the API.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    /// Missing or malformed input field.
    #[error("{0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Action not legal in the session's current status.
    #[error("cannot {action} session {id} while it is {status}")]
    InvalidState {
        id: String,
        status: String,
        action: &'static str,
    },

    #[error("not {player}'s turn (waiting on {expected})")]
    NotYourTurn { player: String, expected: String },

    /// Backend I/O or persisted-data corruption. Never defaulted away.
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;

impl GameError {
    pub fn validation(msg: impl Into<String>) -> Self {
        GameError::Validation(msg.into())
    }

    pub fn session_not_found(id: &str) -> Self {
        GameError::NotFound {
            kind: "session",
            id: id.to_string(),
        }
    }

    pub fn player_not_found(id: &str) -> Self {
        GameError::NotFound {
            kind: "player",
            id: id.to_string(),
        }
    }

    /// True for errors the caller can fix by changing its request.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, GameError::Storage(_))
    }
}

/// Reject empty or whitespace-only required fields.
pub fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GameError::validation(format!(
            "Missing required field: {}",
            field
        )));
    }
    Ok(())
}

/// Longest accepted player id. Ids are storage keys, so this keeps even a
/// fully percent-encoded id within the file backend's name limit.
pub const MAX_ID_BYTES: usize = 80;

/// [`require`] plus the id length bound.
pub fn require_id(field: &str, value: &str) -> Result<()> {
    require(field, value)?;
    if value.len() > MAX_ID_BYTES {
        return Err(GameError::validation(format!(
            "{} must be at most {} bytes",
            field, MAX_ID_BYTES
        )));
    }
    Ok(())
}
