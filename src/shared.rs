use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::round::{repository::RoundRepository, RoundError};
use crate::season::{SeasonClock, SeasonError};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub round_repository: Arc<dyn RoundRepository>,
    pub season_clock: SeasonClock,
    /// Password guarding round submission and deletion; `None` leaves them open
    pub admin_password: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        round_repository: Arc<dyn RoundRepository>,
        season_clock: SeasonClock,
        admin_password: Option<String>,
    ) -> Self {
        Self {
            round_repository,
            season_clock,
            admin_password: admin_password.map(Arc::from),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RoundError> for AppError {
    fn from(err: RoundError) -> Self {
        match err {
            RoundError::Parse(_) | RoundError::InvalidInput(_) => {
                AppError::BadRequest(err.to_string())
            }
            RoundError::NotFound(msg) => AppError::NotFound(msg),
            RoundError::Conflict { .. } => AppError::Conflict(err.to_string()),
            RoundError::StoreUnavailable(msg) => AppError::DatabaseError(msg),
        }
    }
}

impl From<SeasonError> for AppError {
    fn from(err: SeasonError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            // Store details stay in the logs
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Round store unavailable".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
