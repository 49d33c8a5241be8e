//! Round 1: random seeding of registered teams, pairing, byes.

use crate::engine::Engine;
use crate::error::TournamentError;
use crate::logic::view::BracketView;
use crate::models::{
    Bracket, BracketPosition, BracketSlot, EventId, EventStatus, GameMatch, Round, TeamId, UserId,
};
use crate::notify::{NotificationKind, NotificationPayload, RelatedEntity};
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

/// Fewest teams a bracket can be generated for.
pub const MIN_TEAMS: usize = 2;

/// Pair consecutive teams. An odd last team gets a bye slot that already
/// holds it as winner.
pub fn pair_teams(teams: &[TeamId]) -> Vec<BracketSlot> {
    teams
        .chunks(2)
        .map(|pair| match pair {
            [a, b] => BracketSlot::pairing(*a, *b),
            _ => BracketSlot::bye(pair[0]),
        })
        .collect()
}

/// Shuffle the teams (Fisher–Yates) and pair them into round 1.
pub fn seed_first_round<R: Rng + ?Sized>(teams: &mut [TeamId], rng: &mut R) -> Round {
    teams.shuffle(rng);
    Round::new(1, pair_teams(teams))
}

/// One match per real pairing, spaced an hour apart from `first_match_at`.
/// Byes produce nothing.
pub fn schedule_round(event: EventId, round: &Round, first_match_at: DateTime<Utc>) -> Vec<GameMatch> {
    round
        .matches
        .iter()
        .enumerate()
        .filter_map(|(i, slot)| {
            let team2 = slot.team2?;
            let number = u32::try_from(i + 1).ok()?;
            let at = first_match_at + Duration::hours(i64::from(number) - 1);
            Some(GameMatch::new(
                event,
                slot.team1,
                team2,
                BracketPosition::new(round.round_number, number),
                at,
            ))
        })
        .collect()
}

/// Generate (or regenerate, before any play) the bracket of an event.
///
/// 1. Refuse if any existing match has been started, scored or decided.
/// 2. Resolve the teams of pending/accepted registrations; need at least 2.
/// 3. Shuffle and pair into round 1, replacing any previous bracket and matches.
/// 4. Mark the event in progress, broadcast it and notify every team.
pub async fn generate_bracket(
    engine: &Engine,
    actor: UserId,
    event_id: EventId,
) -> Result<BracketView, TournamentError> {
    engine.require_admin(actor).await?;
    let event = engine.event(event_id).await?;
    if event.status.is_terminal() {
        return Err(TournamentError::bad_request(format!(
            "Cannot generate a bracket for a {} event",
            event.status
        )));
    }

    let existing = engine.matches.matches_for_event(event_id).await?;
    if existing.iter().any(|m| m.has_been_played()) {
        return Err(TournamentError::bad_request(
            "Bracket cannot be regenerated: matches have already been played",
        ));
    }

    let registrations = engine.registrations.registrations_for_event(event_id).await?;
    let mut teams: Vec<TeamId> = Vec::new();
    for registration in registrations.iter().filter(|r| r.status.is_active()) {
        match engine.teams.find_team(registration.team).await? {
            Some(team) if !teams.contains(&team.id) => teams.push(team.id),
            Some(_) => {}
            None => log::warn!(
                "Registration {} references missing team {}",
                registration.id,
                registration.team
            ),
        }
    }
    if teams.len() < MIN_TEAMS {
        return Err(TournamentError::bad_request(format!(
            "At least {} registered teams are required to generate a bracket (found {})",
            MIN_TEAMS,
            teams.len()
        )));
    }

    let round = seed_first_round(&mut teams, &mut rand::thread_rng());
    let matches = schedule_round(event_id, &round, event.start_date.unwrap_or_else(Utc::now));
    let bracket = Bracket::new(round);

    let removed = engine.matches.delete_matches_for_event(event_id).await?;
    engine.events.replace_bracket(event_id, bracket.clone()).await?;
    engine.matches.insert_matches(matches.clone()).await?;
    engine.events.update_status(event_id, EventStatus::InProgress).await?;
    log::info!(
        "Generated bracket for event {}: {} teams, {} matches ({} stale matches removed)",
        event_id,
        teams.len(),
        matches.len(),
        removed
    );
    engine.announce_event(event_id).await;

    for game in &matches {
        let (name1, name2) = (
            engine.team_name(game.team1()).await,
            engine.team_name(game.team2()).await,
        );
        let payload = NotificationPayload::new(
            NotificationKind::MatchCreated,
            format!("{} - Round 1", event.name),
            format!(
                "{} vs {} is scheduled for {}",
                name1,
                name2,
                game.scheduled_time.format("%Y-%m-%d %H:%M UTC")
            ),
        )
        .about(RelatedEntity::Match(game.id));
        for team in game.teams {
            engine.notify_team(team, payload.clone()).await;
        }
    }

    BracketView::resolve(engine, event_id, &bracket).await
}
