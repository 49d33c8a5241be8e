//! Event creation, lookup and cancellation.

use crate::engine::Engine;
use crate::error::TournamentError;
use crate::logic::event_status::sync_event_status;
use crate::models::{Event, EventId, EventStatus, GameId, Schedule, UserId};
use serde::Deserialize;

/// Input for [`create_event`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub format: String,
    #[serde(default)]
    pub game: Option<GameId>,
    #[serde(flatten)]
    pub schedule: Schedule,
}

/// Create an event in Draft (admin only). Windows must be ordered.
pub async fn create_event(
    engine: &Engine,
    actor: UserId,
    input: NewEvent,
) -> Result<Event, TournamentError> {
    engine.require_admin(actor).await?;
    let name = input.name.trim();
    if name.is_empty() {
        return Err(TournamentError::bad_request("Event name is required"));
    }
    let mut event = Event::new(name, input.format.trim(), actor).with_schedule(input.schedule)?;
    event.game = input.game;
    engine.events.save_event(&event).await?;
    log::info!("Created event {} ({})", event.id, event.name);
    Ok(event)
}

/// Read an event, reconciling its status with the clock first.
pub async fn get_event(engine: &Engine, event_id: EventId) -> Result<Event, TournamentError> {
    sync_event_status(engine, event_id).await
}

/// Every event, each reconciled.
pub async fn list_events(engine: &Engine) -> Result<Vec<Event>, TournamentError> {
    let mut events = Vec::new();
    for event in engine.events.list_events().await? {
        events.push(sync_event_status(engine, event.id).await?);
    }
    Ok(events)
}

/// Cancel an event from any non-terminal status (admin only).
pub async fn cancel_event(
    engine: &Engine,
    actor: UserId,
    event_id: EventId,
) -> Result<Event, TournamentError> {
    engine.require_admin(actor).await?;
    let mut event = engine.event(event_id).await?;
    if event.status.is_terminal() {
        return Err(TournamentError::bad_request(format!(
            "Event is already {}",
            event.status
        )));
    }
    engine.events.update_status(event_id, EventStatus::Cancelled).await?;
    event.status = EventStatus::Cancelled;
    log::info!("Event {} cancelled by {}", event_id, actor);
    engine.announce_event(event_id).await;
    Ok(event)
}
