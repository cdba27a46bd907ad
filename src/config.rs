use chrono::NaiveDate;
use std::str::FromStr;
use tracing::warn;

use crate::season::{SeasonClock, DEFAULT_SEASON_LENGTH_WEEKS};

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Runtime configuration read from environment variables at startup
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_address: String,
    pub database_url: Option<String>,
    pub admin_password: Option<String>,
    pub season_clock: SeasonClock,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; unparseable values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let epoch = parse_or_default(
            "SEASON_EPOCH",
            non_empty("SEASON_EPOCH"),
            SeasonClock::default().epoch(),
            |value| NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok(),
        );

        let season_length_weeks = parse_or_default(
            "SEASON_LENGTH_WEEKS",
            non_empty("SEASON_LENGTH_WEEKS"),
            DEFAULT_SEASON_LENGTH_WEEKS,
            |value| u32::from_str(value.trim()).ok().filter(|weeks| *weeks >= 1),
        );

        Self {
            bind_address: non_empty("BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            database_url: non_empty("DATABASE_URL"),
            admin_password: non_empty("ADMIN_PASSWORD"),
            season_clock: SeasonClock::new(epoch, season_length_weeks),
        }
    }
}

fn parse_or_default<T, P>(key: &str, raw: Option<String>, default: T, parse: P) -> T
where
    T: std::fmt::Debug,
    P: Fn(&str) -> Option<T>,
{
    let Some(raw) = raw else {
        return default;
    };

    parse(&raw).unwrap_or_else(|| {
        warn!(key, value = %raw, ?default, "Invalid configuration value, using default");
        default
    })
}
