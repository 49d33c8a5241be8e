//! Teams and their event registrations.

use crate::engine::Engine;
use crate::error::{Entity, TournamentError};
use crate::models::{
    EventId, EventRegistration, EventStatus, RegistrationId, RegistrationStatus, Team, TeamId,
    UserId,
};
use crate::notify::{NotificationKind, NotificationPayload, RelatedEntity};

/// Create a team captained by the actor. Every member must exist.
pub async fn create_team(
    engine: &Engine,
    actor: UserId,
    name: &str,
    members: &[UserId],
) -> Result<Team, TournamentError> {
    engine.user(actor).await?;
    let name = name.trim();
    if name.is_empty() {
        return Err(TournamentError::bad_request("Team name is required"));
    }
    for member in members {
        engine.user(*member).await?;
    }
    let mut team = Team::new(name, actor);
    for member in members {
        if *member != actor && !team.members.contains(member) {
            team.members.push(*member);
        }
    }
    engine.teams.save_team(&team).await?;
    Ok(team)
}

/// Register a team for an event. Only the captain may do it, only while
/// the event is draft or open and has no bracket, and only once.
pub async fn register_team(
    engine: &Engine,
    actor: UserId,
    event_id: EventId,
    team_id: TeamId,
) -> Result<EventRegistration, TournamentError> {
    engine.user(actor).await?;
    let event = engine.event(event_id).await?;
    let team = engine.team(team_id).await?;
    if team.captain != actor {
        return Err(TournamentError::forbidden(
            "Only the team captain can register the team",
        ));
    }
    if !matches!(event.status, EventStatus::Draft | EventStatus::Open) || event.bracket.is_some() {
        return Err(TournamentError::bad_request(format!(
            "Registration is closed (event is {})",
            event.status
        )));
    }
    let existing = engine.registrations.registrations_for_event(event_id).await?;
    if existing.iter().any(|r| r.team == team_id && r.status.is_active()) {
        return Err(TournamentError::bad_request(
            "Team is already registered for this event",
        ));
    }

    let registration = EventRegistration::new(event_id, team_id, actor);
    engine.registrations.save_registration(&registration).await?;
    log::info!("Team {} registered for event {}", team_id, event_id);
    Ok(registration)
}

async fn find_registration(
    engine: &Engine,
    id: RegistrationId,
) -> Result<EventRegistration, TournamentError> {
    engine
        .registrations
        .find_registration(id)
        .await?
        .ok_or(TournamentError::NotFound(Entity::Registration))
}

/// Withdraw a registration. Only the user who registered it may.
pub async fn cancel_registration(
    engine: &Engine,
    actor: UserId,
    registration_id: RegistrationId,
) -> Result<EventRegistration, TournamentError> {
    engine.user(actor).await?;
    let mut registration = find_registration(engine, registration_id).await?;
    if registration.registered_by != actor {
        return Err(TournamentError::forbidden(
            "Only the captain who registered the team can cancel the registration",
        ));
    }
    if !registration.status.is_active() {
        return Err(TournamentError::bad_request("Registration is no longer active"));
    }
    registration.status = RegistrationStatus::Cancelled;
    engine.registrations.save_registration(&registration).await?;
    Ok(registration)
}

/// Accept or reject a pending registration (admin only).
pub async fn review_registration(
    engine: &Engine,
    actor: UserId,
    registration_id: RegistrationId,
    decision: RegistrationStatus,
) -> Result<EventRegistration, TournamentError> {
    engine.require_admin(actor).await?;
    if !matches!(decision, RegistrationStatus::Accepted | RegistrationStatus::Rejected) {
        return Err(TournamentError::bad_request(
            "A registration can only be accepted or rejected",
        ));
    }
    let mut registration = find_registration(engine, registration_id).await?;
    if registration.status != RegistrationStatus::Pending {
        return Err(TournamentError::bad_request("Only pending registrations can be reviewed"));
    }
    let event = engine.event(registration.event).await?;
    registration.status = decision;
    engine.registrations.save_registration(&registration).await?;

    let verdict = if decision == RegistrationStatus::Accepted {
        "accepted"
    } else {
        "rejected"
    };
    if let Ok(team) = engine.team(registration.team).await {
        engine
            .notify_user(
                team.captain,
                NotificationPayload::new(
                    NotificationKind::RegistrationReviewed,
                    format!("Registration {}", verdict),
                    format!("{} was {} for {}", team.name, verdict, event.name),
                )
                .about(RelatedEntity::Event(event.id)),
            )
            .await;
    }
    Ok(registration)
}
