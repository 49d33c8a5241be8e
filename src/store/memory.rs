//! In-process store backing every repository trait.

use super::{EventRepository, MatchRepository, RegistrationRepository, TeamRepository, UserRepository};
use crate::error::StoreError;
use crate::models::{
    Bracket, Event, EventId, EventRegistration, EventStatus, GameMatch, MatchId, RegistrationId,
    Round, Team, TeamId, User, UserId,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    events: RwLock<HashMap<EventId, Event>>,
    matches: RwLock<HashMap<MatchId, GameMatch>>,
    teams: RwLock<HashMap<TeamId, Team>>,
    registrations: RwLock<Vec<EventRegistration>>,
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_matches(matches: &mut [GameMatch]) {
    matches.sort_by_key(|m| (m.bracket_position.round, m.bracket_position.match_number));
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn find_event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        let mut events: Vec<_> = self.events.read().await.values().cloned().collect();
        events.sort_by_key(|e| e.start_date);
        Ok(events)
    }

    async fn save_event(&self, event: &Event) -> Result<(), StoreError> {
        self.events.write().await.insert(event.id, event.clone());
        Ok(())
    }

    async fn update_status(&self, id: EventId, status: EventStatus) -> Result<bool, StoreError> {
        let mut events = self.events.write().await;
        Ok(match events.get_mut(&id) {
            Some(event) => {
                event.status = status;
                true
            }
            None => false,
        })
    }

    async fn replace_bracket(&self, id: EventId, bracket: Bracket) -> Result<bool, StoreError> {
        let mut events = self.events.write().await;
        Ok(match events.get_mut(&id) {
            Some(event) => {
                event.bracket = Some(bracket);
                true
            }
            None => false,
        })
    }

    async fn set_slot_winner(
        &self,
        id: EventId,
        round: u32,
        match_number: u32,
        winner: TeamId,
    ) -> Result<bool, StoreError> {
        let mut events = self.events.write().await;
        let slot = events
            .get_mut(&id)
            .and_then(|e| e.bracket.as_mut())
            .and_then(|b| b.round_mut(round))
            .and_then(|r| r.slot_mut(match_number));
        Ok(match slot {
            Some(slot) => {
                slot.winner = Some(winner);
                true
            }
            None => false,
        })
    }

    async fn insert_round(&self, id: EventId, round: Round) -> Result<(), StoreError> {
        let mut events = self.events.write().await;
        let event = events
            .get_mut(&id)
            .ok_or_else(|| StoreError::Unavailable(format!("event {id} missing")))?;
        let bracket = event.bracket.get_or_insert_with(Bracket::default);
        if bracket.has_round(round.round_number) {
            return Err(StoreError::Conflict(format!(
                "event {id} round {}",
                round.round_number
            )));
        }
        bracket.rounds.push(round);
        bracket.rounds.sort_by_key(|r| r.round_number);
        Ok(())
    }
}

#[async_trait]
impl MatchRepository for MemoryStore {
    async fn find_match(&self, id: MatchId) -> Result<Option<GameMatch>, StoreError> {
        Ok(self.matches.read().await.get(&id).cloned())
    }

    async fn matches_for_event(&self, event: EventId) -> Result<Vec<GameMatch>, StoreError> {
        let mut found: Vec<_> = self
            .matches
            .read()
            .await
            .values()
            .filter(|m| m.event == event)
            .cloned()
            .collect();
        sort_matches(&mut found);
        Ok(found)
    }

    async fn matches_for_round(&self, event: EventId, round: u32) -> Result<Vec<GameMatch>, StoreError> {
        let mut found: Vec<_> = self
            .matches
            .read()
            .await
            .values()
            .filter(|m| m.event == event && m.bracket_position.round == round)
            .cloned()
            .collect();
        sort_matches(&mut found);
        Ok(found)
    }

    async fn insert_matches(&self, matches: Vec<GameMatch>) -> Result<(), StoreError> {
        let mut stored = self.matches.write().await;
        for m in matches {
            stored.insert(m.id, m);
        }
        Ok(())
    }

    async fn save_match(&self, game: &GameMatch) -> Result<(), StoreError> {
        self.matches.write().await.insert(game.id, game.clone());
        Ok(())
    }

    async fn delete_matches_for_event(&self, event: EventId) -> Result<usize, StoreError> {
        let mut stored = self.matches.write().await;
        let before = stored.len();
        stored.retain(|_, m| m.event != event);
        Ok(before - stored.len())
    }
}

#[async_trait]
impl TeamRepository for MemoryStore {
    async fn find_team(&self, id: TeamId) -> Result<Option<Team>, StoreError> {
        Ok(self.teams.read().await.get(&id).cloned())
    }

    async fn save_team(&self, team: &Team) -> Result<(), StoreError> {
        self.teams.write().await.insert(team.id, team.clone());
        Ok(())
    }
}

#[async_trait]
impl RegistrationRepository for MemoryStore {
    async fn find_registration(&self, id: RegistrationId) -> Result<Option<EventRegistration>, StoreError> {
        Ok(self
            .registrations
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn registrations_for_event(&self, event: EventId) -> Result<Vec<EventRegistration>, StoreError> {
        Ok(self
            .registrations
            .read()
            .await
            .iter()
            .filter(|r| r.event == event)
            .cloned()
            .collect())
    }

    async fn save_registration(&self, registration: &EventRegistration) -> Result<(), StoreError> {
        let mut stored = self.registrations.write().await;
        match stored.iter_mut().find(|r| r.id == registration.id) {
            Some(existing) => *existing = registration.clone(),
            None => stored.push(registration.clone()),
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }
}
