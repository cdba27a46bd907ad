use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use tracing::{info, instrument};

use super::StandingsEntry;
use crate::round::RoundService;
use crate::season::SeasonId;
use crate::shared::{AppError, AppState};

/// HTTP handler for the standings of the current season
///
/// GET /api/standings
#[instrument(name = "current_standings", skip(state))]
pub async fn current_standings(
    State(state): State<AppState>,
) -> Result<Json<Vec<StandingsEntry>>, AppError> {
    let season = state.season_clock.season_for(Utc::now())?;
    standings_for(&state, season).await
}

/// HTTP handler for the standings of a given season
///
/// GET /api/seasons/:season/standings
#[instrument(name = "season_standings", skip(state))]
pub async fn season_standings(
    State(state): State<AppState>,
    Path(season): Path<SeasonId>,
) -> Result<Json<Vec<StandingsEntry>>, AppError> {
    let season = state.season_clock.validate_season(season)?;
    standings_for(&state, season).await
}

async fn standings_for(
    state: &AppState,
    season: SeasonId,
) -> Result<Json<Vec<StandingsEntry>>, AppError> {
    let service = RoundService::from_state(state);
    let standings = service.standings(season).await?;

    info!(season, participant_count = standings.len(), "Standings computed");

    Ok(Json(standings))
}

/// HTTP handler listing participant names of the current season alphabetically
///
/// GET /api/participants
#[instrument(name = "list_participants", skip(state))]
pub async fn list_participants(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    let season = state.season_clock.season_for(Utc::now())?;
    let service = RoundService::from_state(&state);

    Ok(Json(service.participants(season).await?))
}
