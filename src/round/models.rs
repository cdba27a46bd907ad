use serde::{Deserialize, Serialize};

use crate::season::SeasonId;

/// Round number within a season, restarting at 1 every season
pub type RoundNumber = u32;

/// One participant's parsed guess, only alive during submission
#[derive(Debug, Clone, PartialEq)]
pub struct Guess {
    pub participant_name: String,
    pub value: f64,
}

impl Guess {
    pub fn new(participant_name: impl Into<String>, value: f64) -> Self {
        Self {
            participant_name: participant_name.into(),
            value,
        }
    }
}

/// A guess after scoring against the winning number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntry {
    pub participant_name: String,
    pub value: f64,
    pub deviation: f64,
    pub rank: u32,
    pub points: u32,
}

/// A complete scored round keyed by `(season_id, round_number)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub season_id: SeasonId,
    pub round_number: RoundNumber,
    pub winning_number: f64,
    pub entries: Vec<ScoredEntry>,
}

impl Round {
    /// The rank-1 entry, if the round has any entries
    pub fn winner(&self) -> Option<&ScoredEntry> {
        self.entries.iter().find(|entry| entry.rank == 1)
    }
}

/// Round header as listed per season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: RoundNumber,
    pub winning_number: f64,
}

/// Outcome of deleting the most recent round of a season
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedRound {
    pub season: SeasonId,
    pub round: RoundNumber,
    pub deleted_entries: u64,
}
