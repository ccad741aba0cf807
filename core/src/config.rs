use crate::{
    clock::GenClock,
    error::{ensure, GenResult},
    geo::GeoBounds,
    types::TimestampMillis,
};
use serde::{Deserialize, Serialize};

pub const MAX_PUBLISHERS: u32 = 100;
pub const MAX_EVENTS: u32 = 1_000_000;
pub const MAX_IDENTITY_POOL: u32 = 10_000;
pub const MAX_PROFILE_VERSION_DAYS: u32 = 3;

/// Settings fixed for the lifetime of one generator: pool sizes, seed, clock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// "Now" in epoch milliseconds. `None` pins the clock at construction.
    pub current_timestamp: Option<TimestampMillis>,
    /// Master seed. `None` draws one from entropy; the chosen seed is logged.
    pub seed: Option<u64>,
    pub total_publishers: u32,
    pub total_events: u32,
    pub unknown_device_count: u32,
    pub email_users_count: u32,
    pub phone_users_count: u32,
    pub proprietary_id_space_1_users_count: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            current_timestamp: None,
            seed: None,
            total_publishers: 10,
            total_events: 1000,
            unknown_device_count: 1000,
            email_users_count: 100,
            phone_users_count: 100,
            proprietary_id_space_1_users_count: 100,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> GenResult<()> {
        ensure(
            (1..=MAX_PUBLISHERS).contains(&self.total_publishers),
            "total_publishers",
            "must be a positive integer no larger than 100",
        )?;
        ensure(
            (1..=MAX_EVENTS).contains(&self.total_events),
            "total_events",
            "must be a positive integer no larger than 1000000",
        )?;
        for (field, value) in [
            ("unknown_device_count", self.unknown_device_count),
            ("email_users_count", self.email_users_count),
            ("phone_users_count", self.phone_users_count),
            (
                "proprietary_id_space_1_users_count",
                self.proprietary_id_space_1_users_count,
            ),
        ] {
            ensure(
                (1..=MAX_IDENTITY_POOL).contains(&value),
                field,
                "must be a positive integer no larger than 10000",
            )?;
        }
        Ok(())
    }

    pub fn clock(&self) -> GenResult<GenClock> {
        match self.current_timestamp {
            Some(ts) => GenClock::at(ts),
            None => GenClock::now(),
        }
    }
}

/// Per-event knobs. Validated on every event request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventOptions {
    pub unknown_device_ratio: f64,
    #[serde(flatten)]
    pub geo: GeoBounds,
    pub email_events_ratio: f64,
    pub phone_events_ratio: f64,
    pub proprietary_id_space_1_events_ratio: f64,
    pub profile_version_days: u32,
}

impl Default for EventOptions {
    fn default() -> Self {
        Self {
            unknown_device_ratio: 0.5,
            geo: GeoBounds::default(),
            email_events_ratio: 0.5,
            phone_events_ratio: 0.5,
            proprietary_id_space_1_events_ratio: 0.5,
            profile_version_days: 1,
        }
    }
}

impl EventOptions {
    pub fn validate(&self) -> GenResult<()> {
        for (field, ratio) in [
            ("unknown_device_ratio", self.unknown_device_ratio),
            ("email_events_ratio", self.email_events_ratio),
            ("phone_events_ratio", self.phone_events_ratio),
            (
                "proprietary_id_space_1_events_ratio",
                self.proprietary_id_space_1_events_ratio,
            ),
        ] {
            ensure((0.0..=1.0).contains(&ratio), field, "must be between 0 and 1")?;
        }
        ensure(
            self.profile_version_days <= MAX_PROFILE_VERSION_DAYS,
            "profile_version_days",
            "must be no larger than 3",
        )?;
        self.geo.validate()
    }
}

/// A whole generation run as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub event: EventOptions,
}

impl RunConfig {
    /// Load from a JSON file.
    /// In tests, use RunConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: RunConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    pub fn validate(&self) -> GenResult<()> {
        self.generator.validate()?;
        self.event.validate()
    }

    /// Small, fully pinned config for unit tests.
    pub fn default_test() -> Self {
        Self {
            generator: GeneratorConfig {
                // 2021-07-21T05:58:20Z
                current_timestamp: Some(1_626_847_100_000),
                seed: Some(42),
                total_publishers: 3,
                total_events: 50,
                unknown_device_count: 20,
                email_users_count: 10,
                phone_users_count: 10,
                proprietary_id_space_1_users_count: 10,
            },
            event: EventOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenError;

    #[test]
    fn defaults_are_valid() {
        RunConfig::default().validate().unwrap();
        RunConfig::default_test().validate().unwrap();
    }

    #[test]
    fn pool_sizes_out_of_range_are_rejected() {
        let base = GeneratorConfig::default();
        let cases = [
            GeneratorConfig { total_publishers: 0, ..base.clone() },
            GeneratorConfig { total_publishers: 101, ..base.clone() },
            GeneratorConfig { total_events: 0, ..base.clone() },
            GeneratorConfig { total_events: 1_000_001, ..base.clone() },
            GeneratorConfig { unknown_device_count: 10_001, ..base.clone() },
            GeneratorConfig { email_users_count: 0, ..base.clone() },
            GeneratorConfig { phone_users_count: 10_001, ..base.clone() },
            GeneratorConfig { proprietary_id_space_1_users_count: 0, ..base.clone() },
        ];
        for case in cases {
            assert!(
                matches!(case.validate(), Err(GenError::Config { .. })),
                "accepted {case:?}"
            );
        }
    }

    #[test]
    fn event_options_out_of_range_are_rejected() {
        let base = EventOptions::default();
        let cases = [
            EventOptions { unknown_device_ratio: 1.01, ..base.clone() },
            EventOptions { email_events_ratio: -0.5, ..base.clone() },
            EventOptions { phone_events_ratio: 2.0, ..base.clone() },
            EventOptions { proprietary_id_space_1_events_ratio: f64::NAN, ..base.clone() },
            EventOptions { profile_version_days: 4, ..base.clone() },
            EventOptions {
                geo: GeoBounds { total_countries: 0, ..GeoBounds::default() },
                ..base.clone()
            },
        ];
        for case in cases {
            assert!(case.validate().is_err(), "accepted {case:?}");
        }
    }

    #[test]
    fn run_config_parses_full_json() {
        let json = r#"{
            "generator": {
                "seed": 7,
                "total_publishers": 2,
                "total_events": 10,
                "unknown_device_count": 5,
                "email_users_count": 5,
                "phone_users_count": 5,
                "proprietary_id_space_1_users_count": 5
            },
            "event": {
                "unknown_device_ratio": 0.1,
                "total_countries": 2,
                "regions_per_country": 3,
                "cities_per_region": 4,
                "email_events_ratio": 1.0,
                "phone_events_ratio": 0.0,
                "proprietary_id_space_1_events_ratio": 0.25,
                "profile_version_days": 3
            }
        }"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.generator.seed, Some(7));
        assert_eq!(config.generator.current_timestamp, None);
        assert_eq!(config.event.geo.regions_per_country, 3);
        config.validate().unwrap();
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let json = r#"{
            "generator": { "seed": 7, "total_events": 5 },
            "event": { "email_events_ratio": 1.0, "total_countries": 2 }
        }"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.generator.seed, Some(7));
        assert_eq!(config.generator.total_events, 5);
        assert_eq!(config.generator.total_publishers, 10);
        assert_eq!(config.generator.email_users_count, 100);
        assert_eq!(config.event.email_events_ratio, 1.0);
        assert_eq!(config.event.phone_events_ratio, 0.5);
        assert_eq!(config.event.geo.total_countries, 2);
        assert_eq!(config.event.geo.regions_per_country, 10);
        config.validate().unwrap();

        let empty: RunConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, RunConfig::default());
    }
}
