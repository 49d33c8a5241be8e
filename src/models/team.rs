//! Team and EventRegistration data structures.

use crate::models::event::EventId;
use crate::models::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a team (used in slots, matches and lookups).
pub type TeamId = Uuid;

/// Unique identifier for a registration.
pub type RegistrationId = Uuid;

/// A team entering events.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub captain: UserId,
    pub members: Vec<UserId>,
}

impl Team {
    /// Create a team captained by `captain`, with no other members.
    pub fn new(name: impl Into<String>, captain: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            captain,
            members: Vec::new(),
        }
    }

    /// Captain first, then members, without duplicates.
    pub fn member_ids(&self) -> Vec<UserId> {
        let mut ids = vec![self.captain];
        for m in &self.members {
            if !ids.contains(m) {
                ids.push(*m);
            }
        }
        ids
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl RegistrationStatus {
    /// Pending and accepted registrations take part in bracket generation.
    pub fn is_active(self) -> bool {
        matches!(self, RegistrationStatus::Pending | RegistrationStatus::Accepted)
    }
}

/// A team's entry into an event.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EventRegistration {
    pub id: RegistrationId,
    pub event: EventId,
    pub team: TeamId,
    /// The user who submitted the registration; only they may cancel it.
    pub registered_by: UserId,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
}

impl EventRegistration {
    pub fn new(event: EventId, team: TeamId, registered_by: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            event,
            team,
            registered_by,
            status: RegistrationStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
