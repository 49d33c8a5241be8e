//! Event status reconciliation from dates and match completion.

use crate::engine::Engine;
use crate::error::TournamentError;
use crate::models::{Event, EventId, EventStatus, GameMatch, MatchStatus, Schedule};
use chrono::{DateTime, Utc};

/// True when the event has a bracket and every one of its (at least one)
/// matches is finished. The latest round must also be a decided final, so
/// the gap between a round being inserted and its matches being stored is
/// not mistaken for the end of the tournament.
pub fn bracket_finished(event: &Event, matches: &[GameMatch]) -> bool {
    let Some(bracket) = event.bracket.as_ref() else {
        return false;
    };
    let final_decided = bracket
        .round(bracket.last_round_number())
        .is_some_and(|r| r.matches.len() == 1 && r.matches[0].winner.is_some());
    final_decided
        && !matches.is_empty()
        && matches.iter().all(|m| m.status == MatchStatus::Finished)
}

/// Status the event should move to, if any. First matching rule wins:
///
/// 1. bracket finished → completed
/// 2. past end date → completed
/// 3. between start and end → in progress
/// 4. between registration end and start, while open → registration closed
/// 5. inside the registration window, while draft → open
///
/// A rule whose dates are unset never fires.
pub fn next_status(
    now: DateTime<Utc>,
    schedule: &Schedule,
    status: EventStatus,
    bracket_finished: bool,
) -> Option<EventStatus> {
    use EventStatus::*;

    if bracket_finished && !status.is_terminal() {
        return Some(Completed);
    }
    if schedule.end_date.is_some_and(|end| end < now) && !status.is_terminal() {
        return Some(Completed);
    }
    if let (Some(start), Some(end)) = (schedule.start_date, schedule.end_date) {
        if start <= now && now <= end && !matches!(status, InProgress | Completed | Cancelled) {
            return Some(InProgress);
        }
    }
    if let (Some(close), Some(start)) = (schedule.registration_end_date, schedule.start_date) {
        if close < now && now < start && status == Open {
            return Some(RegistrationClosed);
        }
    }
    if let (Some(open), Some(close)) = (schedule.registration_start_date, schedule.registration_end_date) {
        if open <= now && now <= close && status == Draft {
            return Some(Open);
        }
    }
    None
}

/// Load the event, apply at most one status transition, persist and
/// broadcast it. Returns the event as it stands afterwards.
pub async fn sync_event_status(engine: &Engine, event_id: EventId) -> Result<Event, TournamentError> {
    sync_event_status_at(engine, event_id, Utc::now()).await
}

/// [`sync_event_status`] against an explicit clock.
pub async fn sync_event_status_at(
    engine: &Engine,
    event_id: EventId,
    now: DateTime<Utc>,
) -> Result<Event, TournamentError> {
    let mut event = engine.event(event_id).await?;
    let finished = if event.bracket.is_some() {
        let matches = engine.matches.matches_for_event(event_id).await?;
        bracket_finished(&event, &matches)
    } else {
        false
    };

    if let Some(status) = next_status(now, &event.schedule(), event.status, finished) {
        log::info!("Event {} status {} -> {}", event_id, event.status, status);
        engine.events.update_status(event_id, status).await?;
        event.status = status;
        engine.announce_event(event_id).await;
    }
    Ok(event)
}
