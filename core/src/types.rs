//! Shared primitive types used across the generator and the applier.

/// Unix epoch timestamp in milliseconds.
pub type TimestampMillis = i64;

/// Identifier of a virtual person assigned by a labeler.
pub type VirtualPersonId = i64;

/// The canonical run identifier used by the store.
pub type RunId = String;

/// Milliseconds in one day.
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Fresh run identifier: `run-<uuid v4>`.
pub fn new_run_id() -> RunId {
    format!("run-{}", uuid::Uuid::new_v4())
}
