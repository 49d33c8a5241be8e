//! Integration tests for teams and event registrations.

mod common;

use common::Fixture;
use tournament_bracket_web::notify::{NotificationKind, NotificationSink};
use tournament_bracket_web::{
    cancel_registration, create_team, generate_bracket, register_team, review_registration,
    Entity, RegistrationStatus, Role, TournamentError,
};
use uuid::Uuid;

#[tokio::test]
async fn team_captain_leads_a_deduplicated_roster() {
    let f = Fixture::new().await;
    let captain = f.user("cap", Role::Player).await;
    let mate = f.user("mate", Role::Player).await;

    let team = create_team(&f.engine, captain, "  Wolves ", &[mate, captain, mate])
        .await
        .unwrap();
    assert_eq!(team.name, "Wolves");
    assert_eq!(team.captain, captain);
    assert_eq!(team.members, vec![mate]);
    assert_eq!(team.member_ids(), vec![captain, mate]);

    assert!(matches!(
        create_team(&f.engine, captain, "Ghosts", &[Uuid::new_v4()]).await,
        Err(TournamentError::NotFound(Entity::User))
    ));
    assert!(matches!(
        create_team(&f.engine, captain, "", &[]).await,
        Err(TournamentError::BadRequest(_))
    ));
}

#[tokio::test]
async fn only_the_captain_registers_and_only_once() {
    let f = Fixture::new().await;
    let captain = f.user("cap", Role::Player).await;
    let mate = f.user("mate", Role::Player).await;
    let team = create_team(&f.engine, captain, "Wolves", &[mate]).await.unwrap();

    assert!(matches!(
        register_team(&f.engine, mate, f.event, team.id).await,
        Err(TournamentError::Forbidden(_))
    ));
    let registration = register_team(&f.engine, captain, f.event, team.id).await.unwrap();
    assert_eq!(registration.status, RegistrationStatus::Pending);
    assert_eq!(registration.registered_by, captain);
    assert!(matches!(
        register_team(&f.engine, captain, f.event, team.id).await,
        Err(TournamentError::BadRequest(_))
    ));

    // Withdrawing frees the slot for a new registration.
    cancel_registration(&f.engine, captain, registration.id).await.unwrap();
    register_team(&f.engine, captain, f.event, team.id).await.unwrap();
    let all = f.engine.registrations.registrations_for_event(f.event).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn registration_closes_once_the_bracket_exists() {
    let f = Fixture::new().await;
    f.teams(&["A", "B"]).await;
    generate_bracket(&f.engine, f.admin, f.event).await.unwrap();

    let captain = f.user("late", Role::Player).await;
    let team = create_team(&f.engine, captain, "Late", &[]).await.unwrap();
    assert!(matches!(
        register_team(&f.engine, captain, f.event, team.id).await,
        Err(TournamentError::BadRequest(_))
    ));
}

#[tokio::test]
async fn only_the_registrant_can_cancel() {
    let f = Fixture::new().await;
    let captain = f.user("cap", Role::Player).await;
    let team = create_team(&f.engine, captain, "Wolves", &[]).await.unwrap();
    let registration = register_team(&f.engine, captain, f.event, team.id).await.unwrap();

    let other = f.user("other", Role::Player).await;
    assert!(matches!(
        cancel_registration(&f.engine, other, registration.id).await,
        Err(TournamentError::Forbidden(_))
    ));
    assert!(matches!(
        cancel_registration(&f.engine, f.admin, registration.id).await,
        Err(TournamentError::Forbidden(_))
    ));

    let cancelled = cancel_registration(&f.engine, captain, registration.id).await.unwrap();
    assert_eq!(cancelled.status, RegistrationStatus::Cancelled);
    assert!(matches!(
        cancel_registration(&f.engine, captain, registration.id).await,
        Err(TournamentError::BadRequest(_))
    ));
    assert!(matches!(
        cancel_registration(&f.engine, captain, Uuid::new_v4()).await,
        Err(TournamentError::NotFound(Entity::Registration))
    ));
}

#[tokio::test]
async fn review_accepts_or_rejects_pending_registrations() {
    let f = Fixture::new().await;
    let captain = f.user("cap", Role::Player).await;
    let team = create_team(&f.engine, captain, "Wolves", &[]).await.unwrap();
    let registration = register_team(&f.engine, captain, f.event, team.id).await.unwrap();

    assert!(matches!(
        review_registration(&f.engine, captain, registration.id, RegistrationStatus::Accepted).await,
        Err(TournamentError::Forbidden(_))
    ));
    assert!(matches!(
        review_registration(&f.engine, f.admin, registration.id, RegistrationStatus::Cancelled).await,
        Err(TournamentError::BadRequest(_))
    ));

    let rejected =
        review_registration(&f.engine, f.admin, registration.id, RegistrationStatus::Rejected)
            .await
            .unwrap();
    assert_eq!(rejected.status, RegistrationStatus::Rejected);
    assert!(matches!(
        review_registration(&f.engine, f.admin, registration.id, RegistrationStatus::Accepted).await,
        Err(TournamentError::BadRequest(_))
    ));

    let inbox = f.notifications.notifications_for(captain).await;
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].payload.kind, NotificationKind::RegistrationReviewed);
    assert!(inbox[0].payload.message.contains("rejected"));
}

#[tokio::test]
async fn rejected_teams_are_left_out_of_the_bracket() {
    let f = Fixture::new().await;
    let teams = f.teams(&["A", "B"]).await;
    let captain = f.user("cap", Role::Player).await;
    let team = create_team(&f.engine, captain, "Rejected", &[]).await.unwrap();
    let registration = register_team(&f.engine, captain, f.event, team.id).await.unwrap();
    review_registration(&f.engine, f.admin, registration.id, RegistrationStatus::Rejected)
        .await
        .unwrap();

    let view = generate_bracket(&f.engine, f.admin, f.event).await.unwrap();
    assert_eq!(view.rounds[0].matches.len(), 1);
    let slot = &view.rounds[0].matches[0];
    let seeded = [slot.team1.id, slot.team2.as_ref().unwrap().id];
    assert!(seeded.contains(&teams[0]) && seeded.contains(&teams[1]));
}
