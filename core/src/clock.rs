//! Generator clock: the fixed "now" every draw is relative to.

use crate::{
    error::{GenError, GenResult},
    types::TimestampMillis,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Profile versions are rendered as `YYYY-MM-DD`.
pub const PROFILE_VERSION_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenClock {
    pub current_timestamp: TimestampMillis,
    pub current_day: NaiveDate,
}

impl GenClock {
    /// Pin the clock to `current_timestamp`. The current day is its UTC date.
    pub fn at(current_timestamp: TimestampMillis) -> GenResult<Self> {
        Ok(Self {
            current_timestamp,
            current_day: day_of(current_timestamp)?,
        })
    }

    pub fn now() -> GenResult<Self> {
        Self::at(Utc::now().timestamp_millis())
    }
}

/// UTC calendar day containing `timestamp`.
pub fn day_of(timestamp: TimestampMillis) -> GenResult<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(timestamp)
        .map(|t| t.date_naive())
        .ok_or_else(|| GenError::config("current_timestamp", format!("{timestamp} is out of range")))
}

/// Midnight UTC of `day`, in milliseconds.
pub fn day_start_millis(day: NaiveDate) -> TimestampMillis {
    day.and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc().timestamp_millis())
        .unwrap_or_default()
}

pub fn format_profile_version(day: NaiveDate) -> String {
    day.format(PROFILE_VERSION_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MILLIS_PER_DAY;

    #[test]
    fn day_round_trips_through_midnight() {
        // 2021-07-21T05:58:20Z
        let clock = GenClock::at(1_626_847_100_000).unwrap();
        assert_eq!(clock.current_day, NaiveDate::from_ymd_opt(2021, 7, 21).unwrap());
        let midnight = day_start_millis(clock.current_day);
        assert!(midnight <= clock.current_timestamp);
        assert!(clock.current_timestamp - midnight < MILLIS_PER_DAY);
    }

    #[test]
    fn profile_version_is_iso_date() {
        let day = NaiveDate::from_ymd_opt(2021, 9, 2).unwrap();
        assert_eq!(format_profile_version(day), "2021-09-02");
    }
}
