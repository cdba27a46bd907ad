// Public API - what other modules can use
pub use errors::RoundError;
pub use handlers::{
    delete_last_round, get_current_round, get_season_round, list_current_rounds,
    list_season_rounds, submit_round,
};
pub use models::{DeletedRound, Guess, Round, RoundNumber, RoundSummary, ScoredEntry};
pub use parser::{parse_guesses, GuessParseError, ParseErrorReason};
pub use scorer::{points_for_rank, score_round, POINTS_SCHEMA};
pub use service::RoundService;

// Internal modules
mod errors;
mod handlers;
pub mod models;
pub mod parser;
pub mod repository;
pub mod scorer;
mod service;
mod types;
