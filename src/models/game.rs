//! Match record: two teams, bracket coordinates, score and status.

use crate::models::event::EventId;
use crate::models::team::TeamId;
use crate::models::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Side of the bracket a match belongs to. Single elimination only has one.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketSide {
    #[default]
    Main,
}

/// Join key between a match and its bracket slot.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct BracketPosition {
    pub round: u32,
    /// 1-based within the round; equals slot index + 1.
    pub match_number: u32,
    #[serde(default)]
    pub bracket_side: BracketSide,
}

impl BracketPosition {
    pub fn new(round: u32, match_number: u32) -> Self {
        Self {
            round,
            match_number,
            bracket_side: BracketSide::Main,
        }
    }
}

/// Per-match state machine.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Upcoming,
    InProgress,
    /// A winner is on the scoreboard, waiting for an admin to confirm.
    PendingValidation,
    Finished,
    Cancelled,
}

impl MatchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Finished | MatchStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Upcoming => "upcoming",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::PendingValidation => "pending_validation",
            MatchStatus::Finished => "finished",
            MatchStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub team1: u32,
    pub team2: u32,
}

impl Score {
    pub fn new(team1: u32, team2: u32) -> Self {
        Self { team1, team2 }
    }

    pub fn is_zero(&self) -> bool {
        self.team1 == 0 && self.team2 == 0
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.team1, self.team2)
    }
}

/// Who confirmed a result, and when.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub user: UserId,
    pub validated_at: DateTime<Utc>,
}

/// A real pairing in the bracket. Byes never get one.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    pub event: EventId,
    pub teams: [TeamId; 2],
    /// Set only in PendingValidation or Finished, and never on a draw.
    pub winner: Option<TeamId>,
    pub bracket_position: BracketPosition,
    pub status: MatchStatus,
    pub score: Score,
    pub scheduled_time: DateTime<Utc>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    /// Append-only. One entry finalizes the match.
    pub validation_log: Vec<Validation>,
}

impl GameMatch {
    pub fn new(
        event: EventId,
        team1: TeamId,
        team2: TeamId,
        position: BracketPosition,
        scheduled_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event,
            teams: [team1, team2],
            winner: None,
            bracket_position: position,
            status: MatchStatus::Upcoming,
            score: Score::default(),
            scheduled_time,
            actual_start_time: None,
            actual_end_time: None,
            validation_log: Vec::new(),
        }
    }

    pub fn team1(&self) -> TeamId {
        self.teams[0]
    }

    pub fn team2(&self) -> TeamId {
        self.teams[1]
    }

    /// The other team, if `team` plays in this match.
    pub fn opponent_of(&self, team: TeamId) -> Option<TeamId> {
        match self.teams {
            [a, b] if a == team => Some(b),
            [a, b] if b == team => Some(a),
            _ => None,
        }
    }

    pub fn loser(&self) -> Option<TeamId> {
        self.winner.and_then(|w| self.opponent_of(w))
    }

    /// Any sign that the match has been played: started, scored or decided.
    pub fn has_been_played(&self) -> bool {
        self.status != MatchStatus::Upcoming || !self.score.is_zero() || self.winner.is_some()
    }

    /// Winner implied by the score: higher wins, a draw has none.
    pub fn leader(&self) -> Option<TeamId> {
        use std::cmp::Ordering;
        match self.score.team1.cmp(&self.score.team2) {
            Ordering::Greater => Some(self.team1()),
            Ordering::Less => Some(self.team2()),
            Ordering::Equal => None,
        }
    }
}
