//! Integration tests for date-driven event status and event management.

mod common;

use chrono::{DateTime, Duration, TimeZone, Utc};
use common::Fixture;
use tournament_bracket_web::logic::{next_status, sync_event_status_at};
use tournament_bracket_web::{
    cancel_event, create_event, generate_bracket, get_event, list_events, EventStatus, NewEvent,
    Role, Schedule, TournamentError,
};

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
}

/// Registration 1st-5th, event 10th-12th of March.
fn march() -> Schedule {
    Schedule {
        registration_start_date: Some(at(1)),
        registration_end_date: Some(at(5)),
        start_date: Some(at(10)),
        end_date: Some(at(12)),
    }
}

#[test]
fn status_follows_the_calendar() {
    use EventStatus::*;
    let s = march();
    assert_eq!(next_status(at(1) - Duration::days(1), &s, Draft, false), None);
    assert_eq!(next_status(at(3), &s, Draft, false), Some(Open));
    assert_eq!(next_status(at(7), &s, Open, false), Some(RegistrationClosed));
    assert_eq!(next_status(at(7), &s, RegistrationClosed, false), None);
    assert_eq!(next_status(at(11), &s, RegistrationClosed, false), Some(InProgress));
    assert_eq!(next_status(at(11), &s, InProgress, false), None);
    assert_eq!(next_status(at(13), &s, InProgress, false), Some(Completed));
}

#[test]
fn finished_bracket_wins_over_dates() {
    use EventStatus::*;
    let s = march();
    assert_eq!(next_status(at(3), &s, InProgress, true), Some(Completed));
    assert_eq!(next_status(at(3), &s, Completed, true), None);
}

#[test]
fn terminal_events_never_move() {
    use EventStatus::*;
    let s = march();
    for now in [at(3), at(7), at(11), at(20)] {
        assert_eq!(next_status(now, &s, Cancelled, false), None);
        assert_eq!(next_status(now, &s, Completed, false), None);
    }
}

#[test]
fn rules_with_missing_dates_do_not_fire() {
    use EventStatus::*;
    let only_start = Schedule {
        start_date: Some(at(10)),
        ..Schedule::default()
    };
    assert_eq!(next_status(at(11), &only_start, Draft, false), None);
    assert_eq!(next_status(at(11), &Schedule::default(), Open, false), None);
}

#[test]
fn a_draft_event_skips_straight_to_in_progress() {
    assert_eq!(
        next_status(at(11), &march(), EventStatus::Draft, false),
        Some(EventStatus::InProgress)
    );
}

#[test]
fn windows_must_be_ordered() {
    let mut s = march();
    s.registration_end_date = Some(at(10));
    assert!(s.validate().is_err());

    let mut s = march();
    s.end_date = Some(at(9));
    assert!(s.validate().is_err());

    let mut s = march();
    s.registration_start_date = Some(at(6));
    assert!(s.validate().is_err());

    assert!(march().validate().is_ok());
    assert!(Schedule::default().validate().is_ok());
}

#[tokio::test]
async fn sync_walks_an_event_through_its_calendar() {
    let f = Fixture::with_schedule(march()).await;
    let mut seen = Vec::new();
    for day in [2, 3, 7, 8, 11, 13, 14] {
        seen.push(sync_event_status_at(&f.engine, f.event, at(day)).await.unwrap().status);
    }
    use EventStatus::*;
    assert_eq!(
        seen,
        vec![Open, Open, RegistrationClosed, RegistrationClosed, InProgress, Completed, Completed]
    );
    assert_eq!(f.engine.event(f.event).await.unwrap().status, Completed);
}

#[tokio::test]
async fn sync_does_not_start_before_the_start_date() {
    let f = Fixture::with_schedule(march()).await;
    sync_event_status_at(&f.engine, f.event, at(3)).await.unwrap();
    let event = sync_event_status_at(&f.engine, f.event, at(9)).await.unwrap();
    assert_eq!(event.status, EventStatus::RegistrationClosed);
}

#[tokio::test]
async fn a_running_bracket_is_not_completed_early() {
    let f = Fixture::new().await;
    f.teams(&["A", "B", "C", "D"]).await;
    generate_bracket(&f.engine, f.admin, f.event).await.unwrap();
    let first = f.round_matches(1).await.remove(0);
    f.play(first.id, first.team1()).await;

    let event = get_event(&f.engine, f.event).await.unwrap();
    assert_eq!(event.status, EventStatus::InProgress);
}

#[tokio::test]
async fn events_can_be_created_by_admins_only() {
    let f = Fixture::new().await;
    let player = f.user("player", Role::Player).await;
    let input = NewEvent {
        name: "Autumn Open".to_string(),
        format: "1v1".to_string(),
        ..NewEvent::default()
    };
    assert!(matches!(
        create_event(&f.engine, player, input.clone()).await,
        Err(TournamentError::Forbidden(_))
    ));

    let event = create_event(&f.engine, f.admin, input).await.unwrap();
    assert_eq!(event.status, EventStatus::Draft);
    assert!(event.bracket.is_none());
    assert_eq!(event.organizer, f.admin);
    assert_eq!(list_events(&f.engine).await.unwrap().len(), 2);
}

#[tokio::test]
async fn invalid_event_input_is_rejected() {
    let f = Fixture::new().await;
    let blank = NewEvent {
        name: "   ".to_string(),
        ..NewEvent::default()
    };
    assert!(matches!(
        create_event(&f.engine, f.admin, blank).await,
        Err(TournamentError::BadRequest(_))
    ));

    let mut schedule = march();
    schedule.start_date = Some(at(13));
    let backwards = NewEvent {
        name: "Backwards".to_string(),
        schedule,
        ..NewEvent::default()
    };
    assert!(matches!(
        create_event(&f.engine, f.admin, backwards).await,
        Err(TournamentError::BadRequest(_))
    ));
}

#[tokio::test]
async fn cancelled_events_stay_cancelled() {
    let f = Fixture::with_schedule(march()).await;
    let cancelled = cancel_event(&f.engine, f.admin, f.event).await.unwrap();
    assert_eq!(cancelled.status, EventStatus::Cancelled);

    let event = sync_event_status_at(&f.engine, f.event, at(11)).await.unwrap();
    assert_eq!(event.status, EventStatus::Cancelled);
    assert!(matches!(
        cancel_event(&f.engine, f.admin, f.event).await,
        Err(TournamentError::BadRequest(_))
    ));
}

#[tokio::test]
async fn terminal_events_refuse_a_new_bracket() {
    let f = Fixture::new().await;
    f.teams(&["A", "B"]).await;
    cancel_event(&f.engine, f.admin, f.event).await.unwrap();
    assert!(matches!(
        generate_bracket(&f.engine, f.admin, f.event).await,
        Err(TournamentError::BadRequest(_))
    ));
}

#[tokio::test]
async fn status_changes_are_broadcast() {
    let f = Fixture::with_schedule(march()).await;
    let mut rx = f.engine.broadcaster.subscribe();
    sync_event_status_at(&f.engine, f.event, at(3)).await.unwrap();

    let message = rx.recv().await.unwrap();
    assert_eq!(message.event, tournament_bracket_web::EVENT_UPDATED);
    assert_eq!(message.payload["status"], "open");
    assert_eq!(message.payload["id"], f.event.to_string());
}
