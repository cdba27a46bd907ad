use thiserror::Error;

use super::{models::RoundNumber, parser::GuessParseError};
use crate::season::{SeasonError, SeasonId};

#[derive(Debug, Error)]
pub enum RoundError {
    #[error("Parse error: {0}")]
    Parse(#[from] GuessParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Round {round} of season {season} was assigned concurrently")]
    Conflict { season: SeasonId, round: RoundNumber },

    #[error("Round store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<SeasonError> for RoundError {
    fn from(err: SeasonError) -> Self {
        RoundError::InvalidInput(err.to_string())
    }
}
