//! The events generator.
//!
//! DRAW ORDER per event (fixed, never reordered):
//!   1. Event id        (popped from the event-id pool)
//!   2. Timestamp       (within EVENT_WINDOW_DAYS of the clock)
//!   3. Device          (unknown-device pool or known code 0..=99)
//!   4. Geo             (country, region, city)
//!   5. Profile info    (email, phone, proprietary, each gated)
//!
//! Reordering any step changes every event of every seeded run.

use crate::{
    clock::GenClock,
    config::{EventOptions, GeneratorConfig},
    error::GenResult,
    event::LabelerInput,
    geo::{GeoBounds, GeoLocation},
    pool::IdentifierPools,
    profile::{ProfileInfo, UserInfo},
    rng::{EventRng, RngBank, StreamSlot},
};

/// Event timestamps fall within this many days before the clock.
pub const EVENT_WINDOW_DAYS: u32 = 30;
/// Known devices are rendered as codes in `0..=MAX_KNOWN_DEVICE_CODE`.
pub const MAX_KNOWN_DEVICE_CODE: i64 = 99;

pub struct EventsGenerator {
    clock: GenClock,
    seed: u64,
    rng: EventRng,
    pools: IdentifierPools,
}

impl EventsGenerator {
    /// Validate `config`, pin the clock and build every pool.
    pub fn new(config: &GeneratorConfig) -> GenResult<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let clock = config.clock()?;
        let bank = RngBank::new(seed);
        let mut pool_rng = bank.for_stream(StreamSlot::Pools);
        let pools = IdentifierPools::build(&mut pool_rng, config)?;
        log::info!(
            "generator ready: seed={seed} now={} day={}",
            clock.current_timestamp,
            clock.current_day
        );
        Ok(Self {
            clock,
            seed,
            rng: bank.for_stream(StreamSlot::Events),
            pools,
        })
    }

    /// The master seed in use; pass it back in to reproduce the run.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The clock pinned at construction.
    pub fn clock(&self) -> &GenClock {
        &self.clock
    }

    /// Event ids still available.
    pub fn remaining_events(&self) -> usize {
        self.pools.event_ids.len()
    }

    pub fn pools(&self) -> &IdentifierPools {
        &self.pools
    }

    /// Compose one event. Fails with `Exhausted` once every id is used.
    pub fn get_event(&mut self, options: &EventOptions) -> GenResult<LabelerInput> {
        options.validate()?;
        let event_id = self.pools.pop_event_id()?;
        let timestamp_millis = self
            .rng
            .timestamp_in_n_days(self.clock.current_timestamp, EVENT_WINDOW_DAYS)?;
        let user_agent = self.draw_device(options.unknown_device_ratio)?;
        let geo = GeoLocation::random(&mut self.rng, &options.geo)?;
        let profile_info = self.draw_profile_info(options)?;
        log::debug!(
            "event {}/{}: profiles={}",
            event_id.publisher,
            event_id.id,
            profile_info.attached().count()
        );
        Ok(LabelerInput {
            event_id,
            timestamp_millis,
            user_agent,
            geo,
            profile_info,
        })
    }

    /// Compose `count` events in order.
    pub fn take_events(&mut self, options: &EventOptions, count: usize) -> GenResult<Vec<LabelerInput>> {
        (0..count).map(|_| self.get_event(options)).collect()
    }

    fn draw_device(&mut self, unknown_device_ratio: f64) -> GenResult<String> {
        if self.rng.bool(unknown_device_ratio)? {
            return Ok(self.rng.pick(&self.pools.unknown_devices)?.clone());
        }
        Ok(self.rng.integer(0, MAX_KNOWN_DEVICE_CODE)?.to_string())
    }

    fn draw_profile_info(&mut self, options: &EventOptions) -> GenResult<ProfileInfo> {
        let Self {
            rng, pools, clock, ..
        } = self;
        let days = options.profile_version_days;
        let bounds: &GeoBounds = &options.geo;

        let mut info = ProfileInfo::default();
        if rng.bool(options.email_events_ratio)? {
            info.email_user_info = Some(UserInfo::draw(rng, &pools.emails, clock, days, bounds)?);
        }
        if rng.bool(options.phone_events_ratio)? {
            info.phone_user_info = Some(UserInfo::draw(rng, &pools.phones, clock, days, bounds)?);
        }
        if rng.bool(options.proprietary_id_space_1_events_ratio)? {
            info.proprietary_id_space_1_user_info = Some(UserInfo::draw(
                rng,
                &pools.proprietary_ids,
                clock,
                days,
                bounds,
            )?);
        }
        Ok(info)
    }
}
