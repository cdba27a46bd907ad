// Public API - what other modules can use
pub use clock::{SeasonClock, SeasonError, SeasonId, DEFAULT_SEASON_LENGTH_WEEKS};
pub use handlers::{current_season, get_season, list_seasons};
pub use types::SeasonInfo;

// Internal modules
mod clock;
mod handlers;
mod types;
