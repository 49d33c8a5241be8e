//! Shared setup: an engine over the in-memory store, an admin, and an event
//! starting next week.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use std::sync::Arc;
use tournament_bracket_web::logic::ValidationOutcome;
use tournament_bracket_web::notify::InMemoryNotifications;
use tournament_bracket_web::store::MemoryStore;
use tournament_bracket_web::{
    create_event, create_team, register_team, review_registration, update_match_status,
    update_score, validate_match, Broadcaster, Engine, EventId, GameMatch, MatchId, MatchStatus,
    NewEvent, RegistrationStatus, Role, Schedule, TeamId, User, UserId,
};

pub struct Fixture {
    pub engine: Engine,
    pub notifications: Arc<InMemoryNotifications>,
    pub admin: UserId,
    pub event: EventId,
}

impl Fixture {
    pub async fn new() -> Self {
        let now = Utc::now();
        Self::with_schedule(Schedule {
            start_date: Some(now + Duration::days(7)),
            end_date: Some(now + Duration::days(14)),
            ..Schedule::default()
        })
        .await
    }

    pub async fn with_schedule(schedule: Schedule) -> Self {
        let notifications = Arc::new(InMemoryNotifications::new());
        let engine = Engine::with_store(
            Arc::new(MemoryStore::new()),
            notifications.clone(),
            Broadcaster::new(64),
        );
        let admin = User::new("admin", Role::Admin);
        engine.users.save_user(&admin).await.unwrap();
        let event = create_event(
            &engine,
            admin.id,
            NewEvent {
                name: "Spring Cup".to_string(),
                format: "5v5".to_string(),
                game: None,
                schedule,
            },
        )
        .await
        .unwrap();
        Self {
            engine,
            notifications,
            admin: admin.id,
            event: event.id,
        }
    }

    pub async fn user(&self, name: &str, role: Role) -> UserId {
        let user = User::new(name, role);
        self.engine.users.save_user(&user).await.unwrap();
        user.id
    }

    /// A team with its own captain, registered and accepted.
    pub async fn team(&self, name: &str) -> TeamId {
        let captain = self.user(&format!("{name} captain"), Role::Player).await;
        let team = create_team(&self.engine, captain, name, &[]).await.unwrap();
        let registration = register_team(&self.engine, captain, self.event, team.id)
            .await
            .unwrap();
        review_registration(&self.engine, self.admin, registration.id, RegistrationStatus::Accepted)
            .await
            .unwrap();
        team.id
    }

    pub async fn teams(&self, names: &[&str]) -> Vec<TeamId> {
        let mut ids = Vec::new();
        for name in names {
            ids.push(self.team(name).await);
        }
        ids
    }

    pub async fn matches(&self) -> Vec<GameMatch> {
        self.engine.matches.matches_for_event(self.event).await.unwrap()
    }

    pub async fn round_matches(&self, round: u32) -> Vec<GameMatch> {
        self.engine
            .matches
            .matches_for_round(self.event, round)
            .await
            .unwrap()
    }

    pub async fn game(&self, id: MatchId) -> GameMatch {
        self.engine.game(id).await.unwrap()
    }

    pub async fn start(&self, id: MatchId) -> GameMatch {
        update_match_status(&self.engine, self.admin, id, MatchStatus::InProgress)
            .await
            .unwrap()
    }

    /// Start, score and validate a match so that `winner` wins 2-1.
    pub async fn play(&self, id: MatchId, winner: TeamId) -> ValidationOutcome {
        let game = self.start(id).await;
        let (s1, s2) = if game.team1() == winner { (2, 1) } else { (1, 2) };
        update_score(&self.engine, self.admin, id, s1, s2).await.unwrap();
        validate_match(&self.engine, self.admin, id).await.unwrap()
    }
}
