// Public API - what other modules can use
pub use aggregator::{aggregate, StandingsEntry};
pub use handlers::{current_standings, list_participants, season_standings};

// Internal modules
mod aggregator;
mod handlers;
