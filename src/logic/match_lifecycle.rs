//! Match state machine: start, score, validate, cancel, reschedule.
//!
//! Every operation needs an admin actor. Preconditions are checked before
//! the single write each operation performs.

use crate::engine::Engine;
use crate::error::TournamentError;
use crate::logic::advancer::{advance_bracket, Advancement};
use crate::models::{GameMatch, MatchId, MatchStatus, Score, UserId, Validation};
use crate::notify::{NotificationKind, NotificationPayload, RelatedEntity};
use chrono::{DateTime, Utc};

/// Result of validating a match.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationOutcome {
    pub game: GameMatch,
    pub advancement: Advancement,
}

/// Notify both teams of a match.
async fn notify_both(engine: &Engine, game: &GameMatch, payload: NotificationPayload) {
    let payload = payload.about(RelatedEntity::Match(game.id));
    for team in game.teams {
        engine.notify_team(team, payload.clone()).await;
    }
}

/// Move a match to `in_progress` (from upcoming) or `cancelled` (from any
/// non-terminal state). Other targets are reached through scoring and
/// validation.
pub async fn update_match_status(
    engine: &Engine,
    actor: UserId,
    match_id: MatchId,
    status: MatchStatus,
) -> Result<GameMatch, TournamentError> {
    use MatchStatus::*;

    engine.require_admin(actor).await?;
    let mut game = engine.game(match_id).await?;

    match (game.status, status) {
        (Upcoming, InProgress) => {
            game.status = InProgress;
            game.actual_start_time.get_or_insert_with(Utc::now);
            engine.matches.save_match(&game).await?;
            log::info!("Match {} started", game.id);
            let names = (
                engine.team_name(game.team1()).await,
                engine.team_name(game.team2()).await,
            );
            notify_both(
                engine,
                &game,
                NotificationPayload::new(
                    NotificationKind::MatchStarted,
                    "Match started",
                    format!("{} vs {} has started", names.0, names.1),
                ),
            )
            .await;
        }
        (Upcoming | InProgress | PendingValidation, Cancelled) => {
            game.status = Cancelled;
            game.winner = None;
            engine.matches.save_match(&game).await?;
            log::info!("Match {} cancelled", game.id);
        }
        (from, to) => {
            return Err(TournamentError::bad_request(format!(
                "Cannot move a match from {} to {}",
                from, to
            )));
        }
    }
    Ok(game)
}

/// Set the score of an in-progress match. A decisive score moves the match
/// to pending validation; a draw leaves it in progress with no winner.
pub async fn update_score(
    engine: &Engine,
    actor: UserId,
    match_id: MatchId,
    team1: i64,
    team2: i64,
) -> Result<GameMatch, TournamentError> {
    engine.require_admin(actor).await?;
    let mut game = engine.game(match_id).await?;
    if game.status != MatchStatus::InProgress {
        return Err(TournamentError::bad_request(format!(
            "Scores can only be updated while a match is in progress (match is {})",
            game.status
        )));
    }
    let score = match (u32::try_from(team1), u32::try_from(team2)) {
        (Ok(a), Ok(b)) => Score::new(a, b),
        _ => {
            return Err(TournamentError::bad_request(
                "Scores must be non-negative integers",
            ))
        }
    };

    let changed = game.score != score;
    game.score = score;
    game.winner = game.leader();
    if game.winner.is_some() {
        game.status = MatchStatus::PendingValidation;
        game.actual_end_time = Some(Utc::now());
    }
    engine.matches.save_match(&game).await?;

    if changed {
        let names = (
            engine.team_name(game.team1()).await,
            engine.team_name(game.team2()).await,
        );
        notify_both(
            engine,
            &game,
            NotificationPayload::new(
                NotificationKind::ScoreUpdated,
                "Score updated",
                format!("{} {} {}", names.0, game.score, names.1),
            ),
        )
        .await;
    }
    Ok(game)
}

/// Confirm the result of a match pending validation, finish it and advance
/// the bracket. One validation is enough.
pub async fn validate_match(
    engine: &Engine,
    actor: UserId,
    match_id: MatchId,
) -> Result<ValidationOutcome, TournamentError> {
    engine.require_admin(actor).await?;
    let mut game = engine.game(match_id).await?;
    if game.status != MatchStatus::PendingValidation {
        return Err(TournamentError::bad_request(format!(
            "Only matches pending validation can be validated (match is {})",
            game.status
        )));
    }
    let Some(winner) = game.winner else {
        return Err(TournamentError::bad_request("Match has no winner to validate"));
    };

    let pending = game.clone();
    game.validation_log.push(Validation {
        user: actor,
        validated_at: Utc::now(),
    });
    game.status = MatchStatus::Finished;
    engine.matches.save_match(&game).await?;
    log::info!("Match {} validated by {}, winner {}", game.id, actor, winner);

    // On failure the match goes back to pending validation so it can be
    // validated again.
    let advancement = match advance_bracket(engine, game.event, game.id, winner).await {
        Ok(advancement) => advancement,
        Err(e) => {
            log::warn!("Advancing after match {} failed, reverting validation: {}", game.id, e);
            if let Err(revert) = engine.matches.save_match(&pending).await {
                log::error!("Could not revert match {}: {}", game.id, revert);
            }
            return Err(e);
        }
    };

    let winner_name = engine.team_name(winner).await;
    if let Some(loser) = game.loser() {
        let loser_name = engine.team_name(loser).await;
        engine
            .notify_team(
                winner,
                NotificationPayload::new(
                    NotificationKind::MatchWon,
                    "Victory!",
                    format!("You beat {} {}", loser_name, game.score),
                )
                .about(RelatedEntity::Match(game.id)),
            )
            .await;
        engine
            .notify_team(
                loser,
                NotificationPayload::new(
                    NotificationKind::MatchLost,
                    "Defeat",
                    format!("You lost to {} {}", winner_name, game.score),
                )
                .about(RelatedEntity::Match(game.id)),
            )
            .await;
    }

    Ok(ValidationOutcome { game, advancement })
}

/// Move a match to a new time. Teams are told only if the time changed.
pub async fn reschedule_match(
    engine: &Engine,
    actor: UserId,
    match_id: MatchId,
    scheduled_time: DateTime<Utc>,
) -> Result<GameMatch, TournamentError> {
    engine.require_admin(actor).await?;
    let mut game = engine.game(match_id).await?;
    if game.status.is_terminal() {
        return Err(TournamentError::bad_request(format!(
            "Cannot reschedule a {} match",
            game.status
        )));
    }
    if game.scheduled_time == scheduled_time {
        return Ok(game);
    }
    game.scheduled_time = scheduled_time;
    engine.matches.save_match(&game).await?;
    notify_both(
        engine,
        &game,
        NotificationPayload::new(
            NotificationKind::MatchRescheduled,
            "Match rescheduled",
            format!(
                "Your match now starts {}",
                scheduled_time.format("%Y-%m-%d at %H:%M UTC")
            ),
        ),
    )
    .await;
    Ok(game)
}
