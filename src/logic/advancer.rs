//! Bracket progression after a match is validated: record the winner, and
//! once the round is complete either build the next round or crown the
//! champion.

use crate::engine::Engine;
use crate::error::{StoreError, TournamentError};
use crate::logic::generator::{pair_teams, schedule_round};
use crate::models::{
    Event, EventId, EventStatus, GameMatch, MatchId, MatchStatus, RegistrationStatus, Round, TeamId,
};
use crate::notify::{NotificationKind, NotificationPayload, RelatedEntity};
use chrono::{Duration, Utc};

/// What a call to [`advance_bracket`] did.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Advancement {
    /// The event has no bracket; nothing to do.
    NoBracket,
    /// Winner recorded; other matches of the round are still open.
    RoundPending { round: u32 },
    /// A new round was created with these matches.
    NextRound { round: u32, matches: Vec<MatchId> },
    /// The next round already existed (retry or concurrent validation).
    AlreadyAdvanced { round: u32 },
    /// Tournament over.
    Champion(TeamId),
    /// Round complete but too few winners to continue.
    Stalled { round: u32 },
}

/// Winners of a round in slot order. Byes carry their own winner; real
/// pairings read it from the match record, which is written before the
/// slot and so is never behind it.
fn round_winners(round: &Round, matches: &[GameMatch]) -> Vec<TeamId> {
    round
        .matches
        .iter()
        .zip(1u32..)
        .filter_map(|(slot, number)| {
            if slot.is_bye() {
                return slot.winner;
            }
            matches
                .iter()
                .find(|m| m.bracket_position.match_number == number)
                .and_then(|m| m.winner)
                .or(slot.winner)
        })
        .collect()
}

/// Advance the bracket of `event_id` after `match_id` finished with `winner`.
///
/// Safe to call repeatedly: round creation is keyed on
/// `(event, round_number)`, and a champion whose win is already in the
/// final slot is not announced twice.
pub async fn advance_bracket(
    engine: &Engine,
    event_id: EventId,
    match_id: MatchId,
    winner: TeamId,
) -> Result<Advancement, TournamentError> {
    let event = engine.event(event_id).await?;
    if event.bracket.is_none() {
        log::warn!("Event {} has no bracket, not advancing match {}", event_id, match_id);
        return Ok(Advancement::NoBracket);
    }

    let game = engine.game(match_id).await?;
    let position = game.bracket_position;
    // Winner already in the slot means this result was advanced before.
    let repeated = event
        .bracket
        .as_ref()
        .and_then(|b| b.round(position.round))
        .and_then(|r| r.slot(position.match_number))
        .is_some_and(|slot| slot.winner == Some(winner));
    let recorded = engine
        .events
        .set_slot_winner(event_id, position.round, position.match_number, winner)
        .await?;
    if !recorded {
        log::warn!(
            "Event {} has no slot for round {} match {}",
            event_id,
            position.round,
            position.match_number
        );
    }

    let round_matches = engine.matches.matches_for_round(event_id, position.round).await?;
    if !round_matches.iter().all(|m| m.status == MatchStatus::Finished) {
        return Ok(Advancement::RoundPending {
            round: position.round,
        });
    }

    let event = engine.event(event_id).await?;
    let Some(bracket) = event.bracket.as_ref() else {
        return Ok(Advancement::NoBracket);
    };
    let Some(current) = bracket.round(position.round) else {
        return Ok(Advancement::Stalled {
            round: position.round,
        });
    };
    let winners = round_winners(current, &round_matches);
    let decided = round_matches.iter().filter(|m| m.winner.is_some()).count();

    if round_matches.len() == 1 && decided == 1 && winners.len() == 1 {
        if repeated {
            log::debug!("Event {} champion {} already announced", event_id, winners[0]);
        } else {
            crown_champion(engine, &event, winners[0]).await?;
        }
        return Ok(Advancement::Champion(winners[0]));
    }
    if winners.len() < 2 {
        log::warn!(
            "Event {} round {} complete with {} winner(s), not advancing",
            event_id,
            position.round,
            winners.len()
        );
        return Ok(Advancement::Stalled {
            round: position.round,
        });
    }

    let next = position.round + 1;
    if bracket.has_round(next) {
        return Ok(Advancement::AlreadyAdvanced { round: next });
    }

    // No reseeding: later rounds keep the order round 1 produced.
    let round = Round::new(next, pair_teams(&winners));
    match engine.events.insert_round(event_id, round.clone()).await {
        Ok(()) => {}
        Err(StoreError::Conflict(key)) => {
            log::info!("Round {} already created ({}), skipping", next, key);
            return Ok(Advancement::AlreadyAdvanced { round: next });
        }
        Err(e) => return Err(e.into()),
    }

    let first_match_at = event.start_date.unwrap_or_else(Utc::now) + Duration::days(i64::from(next));
    let matches = schedule_round(event_id, &round, first_match_at);
    engine.matches.insert_matches(matches.clone()).await?;
    log::info!(
        "Event {} advanced to round {}: {} teams, {} matches",
        event_id,
        next,
        winners.len(),
        matches.len()
    );
    engine.announce_event(event_id).await;

    for slot in round.matches.iter().filter(|s| s.is_bye()) {
        let payload = NotificationPayload::new(
            NotificationKind::NextRound,
            format!("{} - Round {}", event.name, next),
            format!("You advance to round {} on a bye", next + 1),
        )
        .about(RelatedEntity::Event(event_id));
        engine.notify_team(slot.team1, payload).await;
    }
    for game in &matches {
        let when = game.scheduled_time.format("%Y-%m-%d %H:%M UTC");
        for team in game.teams {
            let Some(opponent) = game.opponent_of(team) else {
                continue;
            };
            let payload = NotificationPayload::new(
                NotificationKind::NextRound,
                format!("{} - Round {}", event.name, next),
                format!(
                    "Next opponent: {}, scheduled for {}",
                    engine.team_name(opponent).await,
                    when
                ),
            )
            .about(RelatedEntity::Match(game.id));
            engine.notify_team(team, payload).await;
        }
    }

    Ok(Advancement::NextRound {
        round: next,
        matches: matches.iter().map(|m| m.id).collect(),
    })
}

/// Complete the event (unless the end date already did) and tell everyone
/// who won. A cancelled event stays cancelled and silent.
async fn crown_champion(engine: &Engine, event: &Event, champion: TeamId) -> Result<(), TournamentError> {
    match event.status {
        EventStatus::Cancelled => {
            log::info!("Event {} is cancelled, champion {} not announced", event.id, champion);
            return Ok(());
        }
        EventStatus::Completed => {
            log::info!("Event {} already completed by date, champion {}", event.id, champion);
        }
        _ => {
            engine.events.update_status(event.id, EventStatus::Completed).await?;
            log::info!("Event {} completed, champion {}", event.id, champion);
            engine.announce_event(event.id).await;
        }
    }

    let champion_name = engine.team_name(champion).await;
    engine
        .notify_team(
            champion,
            NotificationPayload::new(
                NotificationKind::Champion,
                format!("{} - Champions!", event.name),
                format!("{} won {}", champion_name, event.name),
            )
            .about(RelatedEntity::Event(event.id)),
        )
        .await;

    let registrations = engine.registrations.registrations_for_event(event.id).await?;
    for registration in registrations
        .iter()
        .filter(|r| r.status == RegistrationStatus::Accepted && r.team != champion)
    {
        engine
            .notify_team(
                registration.team,
                NotificationPayload::new(
                    NotificationKind::TournamentEnded,
                    format!("{} has ended", event.name),
                    format!("{} won the tournament", champion_name),
                )
                .about(RelatedEntity::Event(event.id)),
            )
            .await;
    }
    Ok(())
}
