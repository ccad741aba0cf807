//! Stream-based random number generation.
//!
//! RULE: Nothing in the generator may call a platform RNG.
//! All stream randomness flows through EventRng instances derived
//! from the single master seed of a generator.
//!
//! Each stream gets its own PCG state, seeded from
//! (master_seed XOR stream_index * golden ratio). This means:
//!   - Pool construction and event composition never share draws.
//!   - Each stream is fully reproducible in isolation.
//!
//! Attribute derivation that must be reproducible from an identity key
//! alone lives in `seeded`, not here.

use crate::{
    error::{ensure, GenResult},
    types::{TimestampMillis, MILLIS_PER_DAY},
};
use chrono::{Days, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg64Mcg;

/// Longest digit string `digits` can produce without overflowing u64.
pub const MAX_DIGITS: u32 = 18;
/// Longest letter string the letter draws accept.
pub const MAX_LETTERS: u32 = 13;
/// Widest day window accepted by the timestamp and date draws.
pub const MAX_DAY_WINDOW: u32 = 10_000;

/// A named, seeded random stream owned by exactly one caller.
pub struct EventRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl EventRng {
    /// Create a stream from the master seed and a stable stream index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, stream_index: u64) -> Self {
        let derived_seed = master_seed ^ (stream_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Bernoulli trial: a uniform draw in [0, 1] compared against `true_chance`.
    pub fn bool(&mut self, true_chance: f64) -> GenResult<bool> {
        ensure(
            (0.0..=1.0).contains(&true_chance),
            "true_chance",
            "must be between 0 and 1",
        )?;
        let draw: f64 = self.inner.gen_range(0.0..=1.0);
        Ok(draw < true_chance)
    }

    /// Decimal string of exactly `length` digits, never with a leading zero.
    pub fn digits(&mut self, length: u32) -> GenResult<String> {
        ensure(
            (1..=MAX_DIGITS).contains(&length),
            "digits length",
            "must be between 1 and 18",
        )?;
        let min = 10u64.pow(length - 1);
        let max = 10u64.pow(length) - 1;
        Ok(self.inner.gen_range(min..=max).to_string())
    }

    /// Lowercase ASCII string of exactly `length` letters.
    pub fn lower_letters(&mut self, length: u32) -> GenResult<String> {
        ensure(
            (1..=MAX_LETTERS).contains(&length),
            "letters length",
            "must be between 1 and 13",
        )?;
        Ok(self.letters(length as usize))
    }

    /// Lowercase ASCII string with a length in `[min, max]`.
    ///
    /// The length follows a normal distribution centred on the middle of
    /// the range with three standard deviations reaching `min`, clamped.
    pub fn lower_letters_between(&mut self, min: u32, max: u32) -> GenResult<String> {
        ensure(
            min >= 1 && min <= max && max <= MAX_LETTERS,
            "letters length range",
            "must satisfy 1 <= min <= max <= 13",
        )?;
        let mean = f64::from(min + max + 1) / 2.0;
        let std_dev = (mean - f64::from(min)) / 3.0;
        let normal = Normal::new(mean, std_dev)
            .map_err(|e| anyhow::anyhow!("letter length distribution: {e}"))?;
        let sampled = normal.sample(&mut self.inner).round();
        let length = sampled.clamp(f64::from(min), f64::from(max)) as usize;
        Ok(self.letters(length))
    }

    /// Uniform integer in `[min, max]`.
    pub fn integer(&mut self, min: i64, max: i64) -> GenResult<i64> {
        ensure(min <= max, "integer range", "max must be no less than min")?;
        Ok(self.inner.gen_range(min..=max))
    }

    /// Uniform timestamp between `n` days before `current` and `current`.
    pub fn timestamp_in_n_days(
        &mut self,
        current: TimestampMillis,
        n: u32,
    ) -> GenResult<TimestampMillis> {
        ensure(n <= MAX_DAY_WINDOW, "day window", "must be at most 10000")?;
        let earliest = current - i64::from(n) * MILLIS_PER_DAY;
        Ok(self.inner.gen_range(earliest..=current))
    }

    /// Uniform calendar day between `n` days before `current` and `current`.
    pub fn date_in_n_days(&mut self, current: NaiveDate, n: u32) -> GenResult<NaiveDate> {
        ensure(n <= MAX_DAY_WINDOW, "day window", "must be at most 10000")?;
        let offset = self.inner.gen_range(0..=u64::from(n));
        current
            .checked_sub_days(Days::new(offset))
            .ok_or_else(|| anyhow::anyhow!("date {current} minus {offset} days is out of range").into())
    }

    /// Uniform element of a non-empty slice. Elements are not removed.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> GenResult<&'a T> {
        ensure(!items.is_empty(), "pool", "must not be empty")?;
        let index = self.inner.gen_range(0..items.len());
        Ok(&items[index])
    }

    fn letters(&mut self, length: usize) -> String {
        (0..length)
            .map(|_| char::from(b'a' + self.inner.gen_range(0..26u8)))
            .collect()
    }
}

/// All streams of one generator, derived from its master seed.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_stream(&self, slot: StreamSlot) -> EventRng {
        EventRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries; only append.
/// Reordering changes every stream's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    Pools = 0,
    Events = 1,
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pools => "pools",
            Self::Events => "events",
        }
    }
}
