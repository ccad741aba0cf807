//! The labeler contract and the labeled output records.
//!
//! A labeler maps one event to zero or more virtual-person activities.
//! Real model-tree labelers live outside this crate; `ProfileLabeler`
//! is a deterministic stand-in used by the runner and tests.

use crate::{
    error::GenResult,
    event::LabelerInput,
    geo::GeoLocation,
    profile::{DemoBucket, UserInfo},
    seeded::fingerprint64,
    types::VirtualPersonId,
};
use serde::{Deserialize, Serialize};

/// The label attached to an activity; the aggregation grouping key.
///
/// Grouping compares the fields directly. `canonical_key` exists for
/// storage and is never used for grouping.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PersonLabelAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo: Option<DemoBucket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_geo: Option<GeoLocation>,
}

impl PersonLabelAttributes {
    pub fn from_user(user: &UserInfo) -> Self {
        Self {
            demo: Some(user.demo.demo_bucket),
            home_geo: Some(user.home_geo),
        }
    }

    /// Compact JSON form. Equal labels always produce equal keys.
    pub fn canonical_key(&self) -> GenResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_canonical_key(key: &str) -> GenResult<Self> {
        Ok(serde_json::from_str(key)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VirtualPersonActivity {
    pub virtual_person_id: VirtualPersonId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<PersonLabelAttributes>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelerOutput {
    pub people: Vec<VirtualPersonActivity>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelerOutputList {
    pub outputs: Vec<LabelerOutput>,
}

/// The contract every labeler must fulfill.
pub trait Labeler {
    fn label(&self, input: &LabelerInput) -> anyhow::Result<LabelerOutput>;
}

/// Largest population whose ids all fit `VirtualPersonId`.
pub const MAX_VIRTUAL_PEOPLE: u64 = i64::MAX as u64;

/// Maps each event to one virtual person.
///
/// The first attached profile (email, phone, proprietary) decides the
/// person and its label. Events with no profile map to an unlabeled person
/// keyed by their user agent.
#[derive(Debug, Clone, Copy)]
pub struct ProfileLabeler {
    virtual_people: u64,
}

impl ProfileLabeler {
    pub fn new(virtual_people: u64) -> GenResult<Self> {
        crate::error::ensure(
            (1..=MAX_VIRTUAL_PEOPLE).contains(&virtual_people),
            "virtual_people",
            "must be positive and fit a virtual person id",
        )?;
        Ok(Self { virtual_people })
    }

    fn person_for(&self, key: &str) -> VirtualPersonId {
        (fingerprint64(key) % self.virtual_people) as VirtualPersonId
    }
}

impl Labeler for ProfileLabeler {
    fn label(&self, input: &LabelerInput) -> anyhow::Result<LabelerOutput> {
        let activity = match input.profile_info.attached().next() {
            Some(user) => VirtualPersonActivity {
                virtual_person_id: self.person_for(&user.user_id),
                label: Some(PersonLabelAttributes::from_user(user)),
            },
            None => VirtualPersonActivity {
                virtual_person_id: self.person_for(&input.user_agent),
                label: None,
            },
        };
        Ok(LabelerOutput {
            people: vec![activity],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geo::GeoBounds,
        profile::{AgeRange, Gender, ProfileInfo},
        event::PublisherEventId,
    };
    use chrono::NaiveDate;

    fn input(profile_info: ProfileInfo, user_agent: &str) -> LabelerInput {
        LabelerInput {
            event_id: PublisherEventId {
                publisher: "12345678".into(),
                id: "1234567890123456".into(),
            },
            timestamp_millis: 1_626_847_100_000,
            user_agent: user_agent.into(),
            geo: GeoLocation { country_id: 100, region_id: 100_000, city_id: 100_000_000 },
            profile_info,
        }
    }

    #[test]
    fn canonical_key_round_trips() {
        let labels = [
            PersonLabelAttributes::default(),
            PersonLabelAttributes {
                demo: Some(DemoBucket {
                    gender: Gender::Female,
                    age: AgeRange { min_age: 18, max_age: 1000 },
                }),
                home_geo: None,
            },
            PersonLabelAttributes {
                demo: Some(DemoBucket {
                    gender: Gender::Unknown,
                    age: AgeRange { min_age: 0, max_age: 0 },
                }),
                home_geo: Some(GeoLocation { country_id: 105, region_id: 105_003, city_id: 105_003_009 }),
            },
        ];
        for label in labels {
            let key = label.canonical_key().unwrap();
            assert_eq!(PersonLabelAttributes::from_canonical_key(&key).unwrap(), label);
            assert_eq!(key, label.canonical_key().unwrap());
        }
    }

    #[test]
    fn profile_labeler_uses_first_attached_profile() {
        let bounds = GeoBounds::default();
        let day = NaiveDate::from_ymd_opt(2021, 9, 20).unwrap();
        let phone = UserInfo::derive("+(555)123-4567", day, &bounds).unwrap();
        let labeler = ProfileLabeler::new(1000).unwrap();
        let out = labeler
            .label(&input(
                ProfileInfo { phone_user_info: Some(phone.clone()), ..ProfileInfo::default() },
                "42",
            ))
            .unwrap();
        assert_eq!(out.people.len(), 1);
        let person = &out.people[0];
        assert!((0..1000).contains(&person.virtual_person_id));
        assert_eq!(person.label, Some(PersonLabelAttributes::from_user(&phone)));
    }

    #[test]
    fn profile_labeler_is_deterministic_and_unlabeled_without_profiles() {
        let labeler = ProfileLabeler::new(50).unwrap();
        let a = labeler.label(&input(ProfileInfo::default(), "abcdefghij")).unwrap();
        let b = labeler.label(&input(ProfileInfo::default(), "abcdefghij")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.people[0].label, None);
        assert!(ProfileLabeler::new(0).is_err());
    }

    #[test]
    fn largest_population_keeps_ids_non_negative() {
        assert!(ProfileLabeler::new(MAX_VIRTUAL_PEOPLE + 1).is_err());
        assert!(ProfileLabeler::new(u64::MAX).is_err());
        let labeler = ProfileLabeler::new(MAX_VIRTUAL_PEOPLE).unwrap();
        for agent in ["a", "b", "abcdefghij", "42", "99"] {
            let out = labeler.label(&input(ProfileInfo::default(), agent)).unwrap();
            assert!(out.people[0].virtual_person_id >= 0, "{agent}");
        }
    }
}
