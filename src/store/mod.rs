//! Persistence contracts. Consistency is per document only; the event
//! writes used by bracket logic are targeted so concurrent operations touch
//! disjoint fields.

mod memory;

pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::models::{
    Bracket, Event, EventId, EventRegistration, EventStatus, GameMatch, MatchId, RegistrationId,
    Round, Team, TeamId, User, UserId,
};
use async_trait::async_trait;

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn find_event(&self, id: EventId) -> Result<Option<Event>, StoreError>;

    async fn list_events(&self) -> Result<Vec<Event>, StoreError>;

    async fn save_event(&self, event: &Event) -> Result<(), StoreError>;

    /// Set only the status field. Returns false if the event is gone.
    async fn update_status(&self, id: EventId, status: EventStatus) -> Result<bool, StoreError>;

    /// Replace the whole bracket (generation only).
    async fn replace_bracket(&self, id: EventId, bracket: Bracket) -> Result<bool, StoreError>;

    /// Record a slot winner. Returns false if the event, round or slot is
    /// missing.
    async fn set_slot_winner(
        &self,
        id: EventId,
        round: u32,
        match_number: u32,
        winner: TeamId,
    ) -> Result<bool, StoreError>;

    /// Append a round keyed by `(event, round_number)`. Fails with
    /// [`StoreError::Conflict`] if that round already exists.
    async fn insert_round(&self, id: EventId, round: Round) -> Result<(), StoreError>;
}

#[async_trait]
pub trait MatchRepository: Send + Sync {
    async fn find_match(&self, id: MatchId) -> Result<Option<GameMatch>, StoreError>;

    /// Ordered by round, then match number.
    async fn matches_for_event(&self, event: EventId) -> Result<Vec<GameMatch>, StoreError>;

    /// Ordered by match number.
    async fn matches_for_round(&self, event: EventId, round: u32) -> Result<Vec<GameMatch>, StoreError>;

    async fn insert_matches(&self, matches: Vec<GameMatch>) -> Result<(), StoreError>;

    async fn save_match(&self, game: &GameMatch) -> Result<(), StoreError>;

    /// Returns how many were removed.
    async fn delete_matches_for_event(&self, event: EventId) -> Result<usize, StoreError>;
}

#[async_trait]
pub trait TeamRepository: Send + Sync {
    async fn find_team(&self, id: TeamId) -> Result<Option<Team>, StoreError>;

    async fn save_team(&self, team: &Team) -> Result<(), StoreError>;
}

#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    async fn find_registration(&self, id: RegistrationId) -> Result<Option<EventRegistration>, StoreError>;

    /// In creation order.
    async fn registrations_for_event(&self, event: EventId) -> Result<Vec<EventRegistration>, StoreError>;

    async fn save_registration(&self, registration: &EventRegistration) -> Result<(), StoreError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn save_user(&self, user: &User) -> Result<(), StoreError>;
}
