//! Hash-seeded deterministic derivation.
//!
//! Every function here is a pure function of its arguments: the same seed
//! string always yields the same value, across calls, generator instances
//! and process restarts. Nothing here reads or advances an `EventRng`.

use crate::{
    error::{ensure, GenResult},
    rng::MAX_DAY_WINDOW,
    types::{TimestampMillis, MILLIS_PER_DAY},
};

/// Stable 64-bit fingerprint of a seed string.
///
/// The first eight bytes of the BLAKE3 digest, read little-endian.
pub fn fingerprint64(seed: &str) -> u64 {
    let digest = blake3::hash(seed.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(head)
}

/// Integer in `[min, max]` derived from `seed`.
pub fn integer_with_seed(min: i64, max: i64, seed: &str) -> GenResult<i64> {
    ensure(min <= max, "integer range", "max must be no less than min")?;
    let fingerprint = fingerprint64(seed);
    let offset = match max.abs_diff(min).checked_add(1) {
        Some(span) => fingerprint % span,
        None => fingerprint,
    };
    Ok(min.wrapping_add_unsigned(offset))
}

/// Double in `[min, max]` derived from `seed`.
pub fn double_with_seed(min: f64, max: f64, seed: &str) -> GenResult<f64> {
    ensure(min <= max, "double range", "max must be no less than min")?;
    let rate = fingerprint64(seed) as f64 / u64::MAX as f64;
    Ok(min + (max - min) * rate)
}

/// Timestamp between `n` days before `current` and `current`, derived from `seed`.
pub fn timestamp_in_n_days_with_seed(
    current: TimestampMillis,
    n: u32,
    seed: &str,
) -> GenResult<TimestampMillis> {
    ensure(n <= MAX_DAY_WINDOW, "day window", "must be at most 10000")?;
    let window = u64::from(n) * MILLIS_PER_DAY as u64 + 1;
    Ok(current - (fingerprint64(seed) % window) as i64)
}
