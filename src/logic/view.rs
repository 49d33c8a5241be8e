//! Read model of a bracket: slots with team names and their match joined in.

use crate::engine::Engine;
use crate::error::TournamentError;
use crate::logic::event_status::sync_event_status;
use crate::models::{Bracket, EventId, MatchId, MatchStatus, Score, TeamId};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TeamRef {
    pub id: TeamId,
    pub name: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SlotView {
    pub match_number: u32,
    pub team1: TeamRef,
    /// None for a bye.
    pub team2: Option<TeamRef>,
    pub winner: Option<TeamRef>,
    pub match_id: Option<MatchId>,
    pub status: Option<MatchStatus>,
    pub score: Option<Score>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RoundView {
    pub round_number: u32,
    pub matches: Vec<SlotView>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BracketView {
    pub event: EventId,
    pub rounds: Vec<RoundView>,
}

impl BracketView {
    /// Resolve team names and join each real slot with its match record.
    pub async fn resolve(
        engine: &Engine,
        event: EventId,
        bracket: &Bracket,
    ) -> Result<Self, TournamentError> {
        let matches: HashMap<_, _> = engine
            .matches
            .matches_for_event(event)
            .await?
            .into_iter()
            .map(|m| ((m.bracket_position.round, m.bracket_position.match_number), m))
            .collect();

        let mut names: HashMap<TeamId, String> = HashMap::new();
        for team in bracket.rounds.iter().flat_map(|r| r.matches.iter()).flat_map(|s| s.teams()) {
            if !names.contains_key(&team) {
                names.insert(team, engine.team_name(team).await);
            }
        }
        let team_ref = |id: TeamId| TeamRef {
            id,
            name: names.get(&id).cloned().unwrap_or_else(|| id.to_string()),
        };

        let rounds = bracket
            .rounds
            .iter()
            .map(|round| RoundView {
                round_number: round.round_number,
                matches: round
                    .matches
                    .iter()
                    .zip(1u32..)
                    .map(|(slot, number)| {
                        let game = matches.get(&(round.round_number, number));
                        SlotView {
                            match_number: number,
                            team1: team_ref(slot.team1),
                            team2: slot.team2.map(team_ref),
                            winner: slot.winner.map(team_ref),
                            match_id: game.map(|m| m.id),
                            status: game.map(|m| m.status),
                            score: game.map(|m| m.score),
                        }
                    })
                    .collect(),
            })
            .collect();

        Ok(Self { event, rounds })
    }

    /// Slot by round and 1-based match number.
    pub fn slot(&self, round: u32, match_number: u32) -> Option<&SlotView> {
        self.rounds
            .iter()
            .find(|r| r.round_number == round)?
            .matches
            .iter()
            .find(|s| s.match_number == match_number)
    }
}

/// Bracket read API: the event's bracket, or None before generation.
/// Reconciles the event status first.
pub async fn get_bracket(
    engine: &Engine,
    event_id: EventId,
) -> Result<Option<BracketView>, TournamentError> {
    let event = sync_event_status(engine, event_id).await?;
    match event.bracket {
        Some(bracket) => Ok(Some(BracketView::resolve(engine, event_id, &bracket).await?)),
        None => Ok(None),
    }
}
