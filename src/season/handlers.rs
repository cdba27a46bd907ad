use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use tracing::{info, instrument};

use super::{SeasonId, SeasonInfo};
use crate::round::RoundService;
use crate::shared::{AppError, AppState};

/// HTTP handler for the season containing the current time
///
/// GET /api/season
#[instrument(name = "current_season", skip(state))]
pub async fn current_season(State(state): State<AppState>) -> Result<Json<SeasonInfo>, AppError> {
    let season = state.season_clock.season_for(Utc::now())?;
    let info = SeasonInfo::for_season(&state.season_clock, season)?;

    info!(season = info.season, start = %info.start, end = %info.end, "Resolved current season");

    Ok(Json(info))
}

/// HTTP handler for a single season's date range
///
/// GET /api/seasons/:season
#[instrument(name = "get_season", skip(state))]
pub async fn get_season(
    State(state): State<AppState>,
    Path(season): Path<SeasonId>,
) -> Result<Json<SeasonInfo>, AppError> {
    Ok(Json(SeasonInfo::for_season(&state.season_clock, season)?))
}

/// HTTP handler listing every season that has stored rounds, newest first
///
/// GET /api/seasons
#[instrument(name = "list_seasons", skip(state))]
pub async fn list_seasons(State(state): State<AppState>) -> Result<Json<Vec<SeasonId>>, AppError> {
    let service = RoundService::from_state(&state);
    let seasons = service.list_seasons().await?;

    info!(season_count = seasons.len(), "Seasons listed successfully");

    Ok(Json(seasons))
}
