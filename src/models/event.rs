//! Event, EventStatus and the bracket embedded in an event.

use crate::error::TournamentError;
use crate::models::team::TeamId;
use crate::models::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an event.
pub type EventId = Uuid;

/// Reference to a game title (games themselves live outside the engine).
pub type GameId = Uuid;

/// Lifecycle of an event. Moves forward only; `Cancelled` is reachable from
/// any non-terminal state.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Created, registration not yet open.
    #[default]
    Draft,
    /// Teams may register.
    Open,
    RegistrationClosed,
    /// Bracket generated or start date reached.
    InProgress,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, EventStatus::Completed | EventStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Open => "open",
            EventStatus::RegistrationClosed => "registration_closed",
            EventStatus::InProgress => "in_progress",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pairing in a round. `team2 == None` is a bye and carries its winner
/// from the moment it is created.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketSlot {
    pub team1: TeamId,
    pub team2: Option<TeamId>,
    pub winner: Option<TeamId>,
}

impl BracketSlot {
    pub fn pairing(team1: TeamId, team2: TeamId) -> Self {
        Self {
            team1,
            team2: Some(team2),
            winner: None,
        }
    }

    pub fn bye(team: TeamId) -> Self {
        Self {
            team1: team,
            team2: None,
            winner: Some(team),
        }
    }

    pub fn is_bye(&self) -> bool {
        self.team2.is_none()
    }

    /// Teams occupying the slot, in slot order.
    pub fn teams(&self) -> impl Iterator<Item = TeamId> + '_ {
        std::iter::once(self.team1).chain(self.team2)
    }
}

/// One elimination stage.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Round {
    /// 1-based, contiguous within a bracket.
    pub round_number: u32,
    pub matches: Vec<BracketSlot>,
}

impl Round {
    pub fn new(round_number: u32, matches: Vec<BracketSlot>) -> Self {
        Self {
            round_number,
            matches,
        }
    }

    /// Winners recorded so far, in slot order.
    pub fn winners(&self) -> Vec<TeamId> {
        self.matches.iter().filter_map(|s| s.winner).collect()
    }

    /// Slot for a 1-based match number.
    pub fn slot(&self, match_number: u32) -> Option<&BracketSlot> {
        let idx = usize::try_from(match_number).ok()?.checked_sub(1)?;
        self.matches.get(idx)
    }

    pub fn slot_mut(&mut self, match_number: u32) -> Option<&mut BracketSlot> {
        let idx = usize::try_from(match_number).ok()?.checked_sub(1)?;
        self.matches.get_mut(idx)
    }
}

/// Single-elimination bracket summary embedded in the event for display.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub rounds: Vec<Round>,
}

impl Bracket {
    pub fn new(first_round: Round) -> Self {
        Self {
            rounds: vec![first_round],
        }
    }

    pub fn round(&self, round_number: u32) -> Option<&Round> {
        self.rounds.iter().find(|r| r.round_number == round_number)
    }

    pub fn round_mut(&mut self, round_number: u32) -> Option<&mut Round> {
        self.rounds
            .iter_mut()
            .find(|r| r.round_number == round_number)
    }

    pub fn has_round(&self, round_number: u32) -> bool {
        self.round(round_number).is_some()
    }

    /// Number of the latest round (0 for an empty bracket).
    pub fn last_round_number(&self) -> u32 {
        self.rounds
            .iter()
            .map(|r| r.round_number)
            .max()
            .unwrap_or(0)
    }
}

/// A tournament event: scheduling windows, status and optional bracket.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    /// Team format, e.g. "5v5" or "1v1".
    pub format: String,
    pub game: Option<GameId>,
    pub organizer: UserId,
    pub status: EventStatus,
    pub registration_start_date: Option<DateTime<Utc>>,
    pub registration_end_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub bracket: Option<Bracket>,
}

/// Registration and play windows of an event.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub registration_start_date: Option<DateTime<Utc>>,
    pub registration_end_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Schedule {
    /// Check the windows are ordered: registration opens before it closes,
    /// closes before the event starts, and the event starts before it ends.
    pub fn validate(&self) -> Result<(), TournamentError> {
        if let (Some(open), Some(close)) = (self.registration_start_date, self.registration_end_date) {
            if open > close {
                return Err(TournamentError::bad_request(
                    "Registration must open before it closes",
                ));
            }
        }
        if let (Some(close), Some(start)) = (self.registration_end_date, self.start_date) {
            if close >= start {
                return Err(TournamentError::bad_request(
                    "Registration must end before the event starts",
                ));
            }
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(TournamentError::bad_request(
                    "Event must start before it ends",
                ));
            }
        }
        Ok(())
    }
}

impl Event {
    /// Create a new event in Draft with no schedule and no bracket.
    pub fn new(name: impl Into<String>, format: impl Into<String>, organizer: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            format: format.into(),
            game: None,
            organizer,
            status: EventStatus::Draft,
            registration_start_date: None,
            registration_end_date: None,
            start_date: None,
            end_date: None,
            bracket: None,
        }
    }

    /// Apply a schedule after validating it.
    pub fn with_schedule(mut self, schedule: Schedule) -> Result<Self, TournamentError> {
        schedule.validate()?;
        self.registration_start_date = schedule.registration_start_date;
        self.registration_end_date = schedule.registration_end_date;
        self.start_date = schedule.start_date;
        self.end_date = schedule.end_date;
        Ok(self)
    }

    pub fn schedule(&self) -> Schedule {
        Schedule {
            registration_start_date: self.registration_start_date,
            registration_end_date: self.registration_end_date,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}
