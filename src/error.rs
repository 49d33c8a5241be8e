//! Error taxonomy shared by every engine operation.

use thiserror::Error;

/// Kind of record a lookup failed to find.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Entity {
    Event,
    Match,
    Team,
    User,
    Registration,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Entity::Event => "Event",
            Entity::Match => "Match",
            Entity::Team => "Team",
            Entity::User => "User",
            Entity::Registration => "Registration",
        };
        f.write_str(name)
    }
}

/// Failure inside a persistence backend.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum StoreError {
    /// A keyed insert collided with an existing record.
    #[error("duplicate key: {0}")]
    Conflict(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur during tournament operations.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TournamentError {
    /// Referenced event, match, team, user or registration does not exist.
    #[error("{0} not found")]
    NotFound(Entity),
    /// Invalid input or a state precondition that does not hold.
    #[error("{0}")]
    BadRequest(String),
    /// The actor lacks the role, or is not the one entitled to act.
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl TournamentError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        TournamentError::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        TournamentError::Forbidden(message.into())
    }
}
