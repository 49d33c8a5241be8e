//! CSV export of an event's matches.

use crate::engine::Engine;
use crate::error::TournamentError;
use crate::models::{EventId, GameMatch, TeamId};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Tournament(#[from] TournamentError),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv output was not utf-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Serialize)]
struct MatchRow {
    round: u32,
    match_number: u32,
    team1: String,
    team2: String,
    score1: u32,
    score2: u32,
    status: &'static str,
    winner: String,
    scheduled_time: String,
}

/// Write one row per match, in bracket order. Unknown team ids are written
/// as-is.
pub fn write_matches_csv(
    matches: &[GameMatch],
    team_names: &HashMap<TeamId, String>,
) -> Result<String, ExportError> {
    let name = |id: TeamId| {
        team_names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    for m in matches {
        writer.serialize(MatchRow {
            round: m.bracket_position.round,
            match_number: m.bracket_position.match_number,
            team1: name(m.team1()),
            team2: name(m.team2()),
            score1: m.score.team1,
            score2: m.score.team2,
            status: m.status.as_str(),
            winner: m.winner.map(name).unwrap_or_default(),
            scheduled_time: m.scheduled_time.to_rfc3339(),
        })?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Export every match of an event with team names resolved.
pub async fn export_matches_csv(engine: &Engine, event_id: EventId) -> Result<String, ExportError> {
    engine.event(event_id).await?;
    let matches = engine
        .matches
        .matches_for_event(event_id)
        .await
        .map_err(TournamentError::from)?;
    let mut names = HashMap::new();
    for team in matches.iter().flat_map(|m| m.teams) {
        if !names.contains_key(&team) {
            names.insert(team, engine.team_name(team).await);
        }
    }
    write_matches_csv(&matches, &names)
}
