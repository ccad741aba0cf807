//! Generated events: the labeler input records.

use crate::{geo::GeoLocation, profile::ProfileInfo, types::TimestampMillis};
use serde::{Deserialize, Serialize};

pub const PUBLISHER_DIGITS: u32 = 8;
pub const EVENT_ID_DIGITS: u32 = 16;

/// A unique event id: 8-digit publisher plus 16-digit id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PublisherEventId {
    pub publisher: String,
    pub id: String,
}

impl PublisherEventId {
    pub fn is_well_formed(&self) -> bool {
        is_digits(&self.publisher, PUBLISHER_DIGITS) && is_digits(&self.id, EVENT_ID_DIGITS)
    }
}

fn is_digits(s: &str, len: u32) -> bool {
    s.len() == len as usize && s.bytes().all(|b| b.is_ascii_digit())
}

/// One generated event. Only the fields a labeler reads are populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelerInput {
    pub event_id: PublisherEventId,
    pub timestamp_millis: TimestampMillis,
    /// A known-device code `0`..`99`, or an unknown-device token.
    pub user_agent: String,
    pub geo: GeoLocation,
    #[serde(default)]
    pub profile_info: ProfileInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LabelerInputList {
    pub inputs: Vec<LabelerInput>,
}
