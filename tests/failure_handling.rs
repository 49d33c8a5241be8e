//! Operations under failing collaborators: notifications that never arrive
//! and an event store that refuses writes.

mod common;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::Fixture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tournament_bracket_web::notify::{Notification, NotificationSink, NotifyError};
use tournament_bracket_web::store::{EventRepository, MemoryStore};
use tournament_bracket_web::{
    create_event, create_team, generate_bracket, register_team, review_registration,
    update_match_status, update_score, validate_match, Advancement, Bracket, Broadcaster, Engine,
    Event, EventId, EventStatus, MatchStatus, NewEvent, RegistrationStatus, Role, Round,
    StoreError, TeamId, TournamentError, User, UserId,
};

struct RefusingSink;

#[async_trait]
impl NotificationSink for RefusingSink {
    async fn create_notification(&self, _notification: Notification) -> Result<(), NotifyError> {
        Err(NotifyError("mailbox offline".to_string()))
    }

    async fn notifications_for(&self, _user: UserId) -> Vec<Notification> {
        Vec::new()
    }

    async fn purge_before(&self, _cutoff: DateTime<Utc>) -> usize {
        0
    }
}

/// Delegates to a real store; `set_slot_winner` fails while `down` is set.
struct FlakyEvents {
    inner: Arc<dyn EventRepository>,
    down: AtomicBool,
}

#[async_trait]
impl EventRepository for FlakyEvents {
    async fn find_event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        self.inner.find_event(id).await
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        self.inner.list_events().await
    }

    async fn save_event(&self, event: &Event) -> Result<(), StoreError> {
        self.inner.save_event(event).await
    }

    async fn update_status(&self, id: EventId, status: EventStatus) -> Result<bool, StoreError> {
        self.inner.update_status(id, status).await
    }

    async fn replace_bracket(&self, id: EventId, bracket: Bracket) -> Result<bool, StoreError> {
        self.inner.replace_bracket(id, bracket).await
    }

    async fn set_slot_winner(
        &self,
        id: EventId,
        round: u32,
        match_number: u32,
        winner: TeamId,
    ) -> Result<bool, StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("event store down".to_string()));
        }
        self.inner.set_slot_winner(id, round, match_number, winner).await
    }

    async fn insert_round(&self, id: EventId, round: Round) -> Result<(), StoreError> {
        self.inner.insert_round(id, round).await
    }
}

#[tokio::test]
async fn refused_notifications_do_not_fail_bracket_play() {
    let engine = Engine::with_store(
        Arc::new(MemoryStore::new()),
        Arc::new(RefusingSink),
        Broadcaster::new(8),
    );
    let admin = User::new("admin", Role::Admin);
    engine.users.save_user(&admin).await.unwrap();
    let event = create_event(
        &engine,
        admin.id,
        NewEvent {
            name: "Quiet Cup".to_string(),
            format: "1v1".to_string(),
            ..NewEvent::default()
        },
    )
    .await
    .unwrap();
    for name in ["A", "B"] {
        let captain = User::new(format!("{name} captain"), Role::Player);
        engine.users.save_user(&captain).await.unwrap();
        let team = create_team(&engine, captain.id, name, &[]).await.unwrap();
        let registration = register_team(&engine, captain.id, event.id, team.id).await.unwrap();
        review_registration(&engine, admin.id, registration.id, RegistrationStatus::Accepted)
            .await
            .unwrap();
    }

    let view = generate_bracket(&engine, admin.id, event.id).await.unwrap();
    assert_eq!(view.rounds.len(), 1);
    assert_eq!(engine.event(event.id).await.unwrap().status, EventStatus::InProgress);

    let game = engine.matches.matches_for_event(event.id).await.unwrap().remove(0);
    update_match_status(&engine, admin.id, game.id, MatchStatus::InProgress)
        .await
        .unwrap();
    let scored = update_score(&engine, admin.id, game.id, 0, 2).await.unwrap();
    assert_eq!(scored.status, MatchStatus::PendingValidation);
    assert_eq!(engine.game(game.id).await.unwrap().score, scored.score);

    let outcome = validate_match(&engine, admin.id, game.id).await.unwrap();
    assert_eq!(outcome.advancement, Advancement::Champion(game.team2()));
    assert_eq!(engine.game(game.id).await.unwrap().status, MatchStatus::Finished);
    let stored = engine.event(event.id).await.unwrap();
    assert_eq!(stored.status, EventStatus::Completed);
    assert_eq!(stored.bracket.unwrap().rounds[0].matches[0].winner, Some(game.team2()));
}

#[tokio::test]
async fn failed_advancement_leaves_the_match_pending() {
    let f = Fixture::new().await;
    f.teams(&["A", "B"]).await;
    generate_bracket(&f.engine, f.admin, f.event).await.unwrap();
    let game = f.matches().await.remove(0);
    f.start(game.id).await;
    update_score(&f.engine, f.admin, game.id, 4, 1).await.unwrap();

    let flaky = Arc::new(FlakyEvents {
        inner: f.engine.events.clone(),
        down: AtomicBool::new(true),
    });
    let engine = Engine {
        events: flaky.clone(),
        ..f.engine.clone()
    };

    let err = validate_match(&engine, f.admin, game.id).await.unwrap_err();
    assert!(matches!(err, TournamentError::Storage(StoreError::Unavailable(_))));
    let reverted = f.game(game.id).await;
    assert_eq!(reverted.status, MatchStatus::PendingValidation);
    assert!(reverted.validation_log.is_empty());
    assert_eq!(f.engine.event(f.event).await.unwrap().status, EventStatus::InProgress);

    flaky.down.store(false, Ordering::SeqCst);
    let outcome = validate_match(&engine, f.admin, game.id).await.unwrap();
    assert_eq!(outcome.advancement, Advancement::Champion(game.team1()));
    assert_eq!(outcome.game.validation_log.len(), 1);
}
