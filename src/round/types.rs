use serde::{Deserialize, Serialize};

use super::{
    errors::RoundError,
    models::{Round, RoundNumber, ScoredEntry},
    parser::parse_decimal,
};
use crate::season::SeasonId;

/// Winning number as typed by the operator, either a JSON number or text like `"12,5%"`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WinningNumberInput {
    Number(f64),
    Text(String),
}

impl WinningNumberInput {
    pub fn resolve(&self) -> Result<f64, RoundError> {
        let value = match self {
            WinningNumberInput::Number(value) => Some(*value).filter(|v| v.is_finite()),
            WinningNumberInput::Text(text) => parse_decimal(text),
        };

        value.ok_or_else(|| {
            RoundError::InvalidInput(format!("Winning number {self:?} is not a valid number"))
        })
    }
}

/// Request payload for submitting a round
#[derive(Debug, Deserialize)]
pub struct SubmitRoundRequest {
    #[serde(default)]
    pub winning_number: Option<WinningNumberInput>,
    /// Raw multi-line guess text, one `"Name Number"` per line
    pub guesses: String,
}

impl SubmitRoundRequest {
    pub fn winning_number(&self) -> Result<f64, RoundError> {
        self.winning_number
            .as_ref()
            .ok_or_else(|| RoundError::InvalidInput("Winning number is missing".to_string()))?
            .resolve()
    }
}

/// Response for a stored round submission
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitRoundResponse {
    pub season: SeasonId,
    pub round: RoundNumber,
    pub count: usize,
    pub winner: Option<ScoredEntry>,
}

impl From<&Round> for SubmitRoundResponse {
    fn from(round: &Round) -> Self {
        Self {
            season: round.season_id,
            round: round.round_number,
            count: round.entries.len(),
            winner: round.winner().cloned(),
        }
    }
}
