//! Dependency bundle every engine operation runs against.

use crate::broadcast::{Broadcaster, EVENT_UPDATED};
use crate::error::{Entity, TournamentError};
use crate::models::{Event, EventId, GameMatch, MatchId, Team, TeamId, User, UserId};
use crate::notify::{InMemoryNotifications, Notification, NotificationPayload, NotificationSink};
use crate::store::{
    EventRepository, MatchRepository, MemoryStore, RegistrationRepository, TeamRepository,
    UserRepository,
};
use std::sync::Arc;

/// Repositories, notification sink and broadcaster, injected once.
#[derive(Clone)]
pub struct Engine {
    pub events: Arc<dyn EventRepository>,
    pub matches: Arc<dyn MatchRepository>,
    pub teams: Arc<dyn TeamRepository>,
    pub registrations: Arc<dyn RegistrationRepository>,
    pub users: Arc<dyn UserRepository>,
    pub notifications: Arc<dyn NotificationSink>,
    pub broadcaster: Broadcaster,
}

impl Engine {
    /// Wire every repository to one store.
    pub fn with_store<S>(
        store: Arc<S>,
        notifications: Arc<dyn NotificationSink>,
        broadcaster: Broadcaster,
    ) -> Self
    where
        S: EventRepository
            + MatchRepository
            + TeamRepository
            + RegistrationRepository
            + UserRepository
            + 'static,
    {
        Self {
            events: store.clone(),
            matches: store.clone(),
            teams: store.clone(),
            registrations: store.clone(),
            users: store,
            notifications,
            broadcaster,
        }
    }

    pub fn in_memory(broadcaster: Broadcaster) -> Self {
        Self::with_store(
            Arc::new(MemoryStore::new()),
            Arc::new(InMemoryNotifications::new()),
            broadcaster,
        )
    }

    pub async fn event(&self, id: EventId) -> Result<Event, TournamentError> {
        self.events
            .find_event(id)
            .await?
            .ok_or(TournamentError::NotFound(Entity::Event))
    }

    pub async fn game(&self, id: MatchId) -> Result<GameMatch, TournamentError> {
        self.matches
            .find_match(id)
            .await?
            .ok_or(TournamentError::NotFound(Entity::Match))
    }

    pub async fn team(&self, id: TeamId) -> Result<Team, TournamentError> {
        self.teams
            .find_team(id)
            .await?
            .ok_or(TournamentError::NotFound(Entity::Team))
    }

    pub async fn user(&self, id: UserId) -> Result<User, TournamentError> {
        self.users
            .find_user(id)
            .await?
            .ok_or(TournamentError::NotFound(Entity::User))
    }

    /// Resolve the actor and require the privileged role.
    pub async fn require_admin(&self, actor: UserId) -> Result<User, TournamentError> {
        let user = self.user(actor).await?;
        if !user.is_privileged() {
            return Err(TournamentError::forbidden("Admin role required"));
        }
        Ok(user)
    }

    /// Send `event:updated` with the event as stored now.
    pub async fn announce_event(&self, id: EventId) {
        match self.events.find_event(id).await {
            Ok(Some(event)) => self.broadcaster.emit_to_all(EVENT_UPDATED, &event),
            Ok(None) => {}
            Err(e) => log::warn!("Skipping broadcast for event {}: {}", id, e),
        }
    }

    /// Best effort; failures are logged.
    pub async fn notify_user(&self, user: UserId, payload: NotificationPayload) {
        let kind = payload.kind;
        if let Err(e) = self
            .notifications
            .create_notification(Notification::new(user, payload))
            .await
        {
            log::warn!("Could not notify user {} ({:?}): {}", user, kind, e);
        }
    }

    /// Notify the captain and every member of a team. Best effort.
    pub async fn notify_team(&self, team: TeamId, payload: NotificationPayload) {
        let team = match self.teams.find_team(team).await {
            Ok(Some(t)) => t,
            Ok(None) => {
                log::warn!("Not notifying missing team {}", team);
                return;
            }
            Err(e) => {
                log::warn!("Not notifying team {}: {}", team, e);
                return;
            }
        };
        for user in team.member_ids() {
            self.notify_user(user, payload.clone()).await;
        }
    }

    /// Display name, falling back to the id when the team is gone.
    pub async fn team_name(&self, team: TeamId) -> String {
        match self.teams.find_team(team).await {
            Ok(Some(t)) => t.name,
            _ => team.to_string(),
        }
    }
}
