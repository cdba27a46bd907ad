use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;

/// Season identifier, starting at 1 for the season containing the epoch
pub type SeasonId = u32;

pub const DEFAULT_SEASON_LENGTH_WEEKS: u32 = 12;

const MILLIS_PER_WEEK: i64 = 7 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeasonError {
    #[error("Timestamp {0} lies before the season epoch")]
    BeforeEpoch(DateTime<Utc>),

    #[error("Invalid season id: {0}")]
    InvalidSeason(i64),
}

/// Maps wall-clock time onto fixed-length seasons counted from an epoch date.
///
/// Both directions are pure functions of the epoch and the season length, so
/// there is no "current season" state to keep in sync anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonClock {
    epoch: NaiveDate,
    season_length_weeks: u32,
}

impl Default for SeasonClock {
    fn default() -> Self {
        Self::new(default_epoch(), DEFAULT_SEASON_LENGTH_WEEKS)
    }
}

impl SeasonClock {
    /// Creates a clock; a zero season length is clamped to one week
    pub fn new(epoch: NaiveDate, season_length_weeks: u32) -> Self {
        Self {
            epoch,
            season_length_weeks: season_length_weeks.max(1),
        }
    }

    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    pub fn season_length_weeks(&self) -> u32 {
        self.season_length_weeks
    }

    fn epoch_start(&self) -> DateTime<Utc> {
        self.epoch.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
    }

    /// Returns the season containing `now`
    pub fn season_for(&self, now: DateTime<Utc>) -> Result<SeasonId, SeasonError> {
        let elapsed = now - self.epoch_start();
        if elapsed < Duration::zero() {
            return Err(SeasonError::BeforeEpoch(now));
        }

        let weeks_since_epoch = elapsed.num_milliseconds().div_euclid(MILLIS_PER_WEEK);
        let season = weeks_since_epoch.div_euclid(i64::from(self.season_length_weeks)) + 1;

        SeasonId::try_from(season).map_err(|_| SeasonError::InvalidSeason(season))
    }

    /// Returns the first and last calendar day of `season`, both inclusive
    pub fn date_range_for(&self, season: SeasonId) -> Result<(NaiveDate, NaiveDate), SeasonError> {
        if season < 1 {
            return Err(SeasonError::InvalidSeason(i64::from(season)));
        }

        let invalid = || SeasonError::InvalidSeason(i64::from(season));
        let season_days = i64::from(self.season_length_weeks) * 7;
        let offset = i64::from(season - 1)
            .checked_mul(season_days)
            .and_then(Duration::try_days)
            .ok_or_else(invalid)?;
        let last_day = Duration::try_days(season_days - 1).ok_or_else(invalid)?;

        let start = self.epoch.checked_add_signed(offset).ok_or_else(invalid)?;
        let end = start.checked_add_signed(last_day).ok_or_else(invalid)?;

        Ok((start, end))
    }

    /// Accepts `season` only if it names a season with a representable date range
    pub fn validate_season(&self, season: SeasonId) -> Result<SeasonId, SeasonError> {
        self.date_range_for(season).map(|_| season)
    }
}

pub fn default_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 31).unwrap_or_default()
}
