// Library crate for the guessing game server
// This file exposes the public API for integration tests

pub mod auth;
pub mod config;
pub mod round;
pub mod routes;
pub mod season;
pub mod shared;
pub mod standings;

// Re-export commonly used types for easier access in tests
pub use config::AppConfig;
pub use round::{
    parse_guesses, repository::InMemoryRoundRepository, repository::PostgresRoundRepository,
    repository::RoundRepository, score_round, Round, RoundError, RoundService, ScoredEntry,
};
pub use routes::build_router;
pub use season::{SeasonClock, SeasonId};
pub use shared::{AppError, AppState};
pub use standings::{aggregate, StandingsEntry};
