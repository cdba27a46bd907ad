use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{SeasonClock, SeasonError, SeasonId};

/// Season id together with its inclusive calendar range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonInfo {
    pub season: SeasonId,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SeasonInfo {
    pub fn for_season(clock: &SeasonClock, season: SeasonId) -> Result<Self, SeasonError> {
        let (start, end) = clock.date_range_for(season)?;
        Ok(Self { season, start, end })
    }
}
