use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use tracing::{info, instrument};

use super::{
    models::{DeletedRound, Round, RoundNumber, RoundSummary},
    service::RoundService,
    types::{SubmitRoundRequest, SubmitRoundResponse},
};
use crate::season::SeasonId;
use crate::shared::{AppError, AppState};

/// HTTP handler for submitting a round in the current season
///
/// POST /api/rounds
/// Returns the assigned season, round number and winner
#[instrument(name = "submit_round", skip(state, request))]
pub async fn submit_round(
    State(state): State<AppState>,
    Json(request): Json<SubmitRoundRequest>,
) -> Result<Json<SubmitRoundResponse>, AppError> {
    let winning_number = request.winning_number()?;
    info!(winning_number, "Submitting round");

    let service = RoundService::from_state(&state);
    let round = service
        .submit_round(winning_number, &request.guesses)
        .await?;

    Ok(Json(SubmitRoundResponse::from(&round)))
}

/// HTTP handler deleting the most recent round of the current season
///
/// DELETE /api/rounds
#[instrument(name = "delete_last_round", skip(state))]
pub async fn delete_last_round(
    State(state): State<AppState>,
) -> Result<Json<DeletedRound>, AppError> {
    let service = RoundService::from_state(&state);
    Ok(Json(service.delete_last_round().await?))
}

/// GET /api/rounds
#[instrument(name = "list_current_rounds", skip(state))]
pub async fn list_current_rounds(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoundSummary>>, AppError> {
    let season = state.season_clock.season_for(Utc::now())?;
    rounds_of(&state, season).await
}

/// GET /api/seasons/:season/rounds
#[instrument(name = "list_season_rounds", skip(state))]
pub async fn list_season_rounds(
    State(state): State<AppState>,
    Path(season): Path<SeasonId>,
) -> Result<Json<Vec<RoundSummary>>, AppError> {
    let season = state.season_clock.validate_season(season)?;
    rounds_of(&state, season).await
}

async fn rounds_of(
    state: &AppState,
    season: SeasonId,
) -> Result<Json<Vec<RoundSummary>>, AppError> {
    let service = RoundService::from_state(state);
    let rounds = service.list_rounds(season).await?;

    info!(season, round_count = rounds.len(), "Rounds listed successfully");

    Ok(Json(rounds))
}

/// GET /api/rounds/:round
#[instrument(name = "get_current_round", skip(state))]
pub async fn get_current_round(
    State(state): State<AppState>,
    Path(round): Path<RoundNumber>,
) -> Result<Json<Round>, AppError> {
    let season = state.season_clock.season_for(Utc::now())?;
    let service = RoundService::from_state(&state);

    Ok(Json(service.get_round(season, round).await?))
}

/// GET /api/seasons/:season/rounds/:round
#[instrument(name = "get_season_round", skip(state))]
pub async fn get_season_round(
    State(state): State<AppState>,
    Path((season, round)): Path<(SeasonId, RoundNumber)>,
) -> Result<Json<Round>, AppError> {
    let season = state.season_clock.validate_season(season)?;
    let service = RoundService::from_state(&state);
    Ok(Json(service.get_round(season, round).await?))
}
