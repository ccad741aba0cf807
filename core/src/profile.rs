//! User profiles attached to generated events.
//!
//! Everything except the user id and the profile version is derived from
//! the seed prefix `"{user_id}_{profile_version}"`. Re-deriving with the
//! same user, version and geo bounds always yields the same profile.

use crate::{
    clock::{day_start_millis, format_profile_version, GenClock},
    error::GenResult,
    geo::{GeoBounds, GeoLocation},
    rng::EventRng,
    seeded::{double_with_seed, integer_with_seed, timestamp_in_n_days_with_seed},
    types::TimestampMillis,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder max age meaning "no upper bound".
pub const UNBOUNDED_MAX_AGE: i64 = 1000;
pub const MAX_AGE: i64 = 120;
/// Seeded max-age draw value that is replaced by `UNBOUNDED_MAX_AGE`.
const MAX_AGE_SENTINEL: i64 = MAX_AGE + 1;
/// How far before the profile version a profile may have been created.
pub const CREATION_WINDOW_DAYS: u32 = 1000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Unknown,
    Male,
    Female,
}

impl Gender {
    fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Male,
            2 => Self::Female,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgeRange {
    pub min_age: i64,
    pub max_age: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DemoBucket {
    pub gender: Gender,
    pub age: AgeRange,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DemoInfo {
    pub demo_bucket: DemoBucket,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub user_id: String,
    pub profile_version: String,
    pub demo: DemoInfo,
    pub home_geo: GeoLocation,
    pub creation_time_millis: TimestampMillis,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_user_info: Option<UserInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_user_info: Option<UserInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proprietary_id_space_1_user_info: Option<UserInfo>,
}

impl ProfileInfo {
    /// Attached profiles in email, phone, proprietary order.
    pub fn attached(&self) -> impl Iterator<Item = &UserInfo> {
        [
            self.email_user_info.as_ref(),
            self.phone_user_info.as_ref(),
            self.proprietary_id_space_1_user_info.as_ref(),
        ]
        .into_iter()
        .flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.attached().next().is_none()
    }
}

impl DemoInfo {
    pub fn derive(seed_prefix: &str) -> GenResult<Self> {
        let gender = integer_with_seed(0, 2, &format!("{seed_prefix}_demo_gender"))?;

        // Both bounds share one seed; only the query range differs.
        let age_seed = format!("{seed_prefix}_demo_age");
        let mut min_age = integer_with_seed(0, MAX_AGE, &age_seed)?;
        let mut max_age = integer_with_seed(0, MAX_AGE_SENTINEL, &age_seed)?;
        if max_age == MAX_AGE_SENTINEL {
            max_age = UNBOUNDED_MAX_AGE;
        }
        if min_age > max_age {
            std::mem::swap(&mut min_age, &mut max_age);
        }

        let confidence = double_with_seed(0.0, 1.0, &format!("{seed_prefix}_demo_confidence"))?;

        Ok(Self {
            demo_bucket: DemoBucket {
                gender: Gender::from_code(gender),
                age: AgeRange { min_age, max_age },
            },
            confidence,
        })
    }
}

impl UserInfo {
    /// Derive the full profile of `user_id` at `profile_version`.
    pub fn derive(user_id: &str, profile_version: NaiveDate, bounds: &GeoBounds) -> GenResult<Self> {
        let version = format_profile_version(profile_version);
        let seed_prefix = format!("{user_id}_{version}");
        let demo = DemoInfo::derive(&seed_prefix)?;
        let home_geo = GeoLocation::from_seed(&seed_prefix, bounds)?;
        let creation_time_millis = timestamp_in_n_days_with_seed(
            day_start_millis(profile_version),
            CREATION_WINDOW_DAYS,
            &format!("{seed_prefix}_creation_time"),
        )?;
        Ok(Self {
            user_id: user_id.to_string(),
            profile_version: version,
            demo,
            home_geo,
            creation_time_millis,
        })
    }

    /// Pick a user from `pool` and a profile version within
    /// `profile_version_days` of the clock's day, then derive the rest.
    pub fn draw(
        rng: &mut EventRng,
        pool: &[String],
        clock: &GenClock,
        profile_version_days: u32,
        bounds: &GeoBounds,
    ) -> GenResult<Self> {
        let user_id = rng.pick(pool)?;
        let profile_version = rng.date_in_n_days(clock.current_day, profile_version_days)?;
        Self::derive(user_id, profile_version, bounds)
    }
}
