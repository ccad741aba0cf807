//! Identifier pools built by rejection sampling.
//!
//! Every pool is filled by drawing candidates from the pool stream and
//! discarding any candidate already accepted. The event-id pool is
//! consumed by popping; the identity pools are sampled with replacement.

use crate::{
    config::GeneratorConfig,
    error::{GenError, GenResult},
    event::{PublisherEventId, EVENT_ID_DIGITS, PUBLISHER_DIGITS},
    rng::EventRng,
};
use std::collections::HashSet;

/// Duplicate draws tolerated per pool before giving up.
pub const MAX_REJECTIONS: u64 = 1_000_000;

pub const UNKNOWN_DEVICE_LETTERS: u32 = 10;
pub const PROPRIETARY_ID_DIGITS: u32 = 16;
pub const EMAIL_DOMAIN_SUFFIX: &str = ".example.com";

/// Tracks accepted values and duplicate draws for one pool.
struct Dedup<T> {
    pool: &'static str,
    seen: HashSet<T>,
    rejections: u64,
}

impl<T: std::hash::Hash + Eq + Clone> Dedup<T> {
    fn new(pool: &'static str) -> Self {
        Self {
            pool,
            seen: HashSet::new(),
            rejections: 0,
        }
    }

    /// Record `candidate`; false when it was already accepted.
    fn accept(&mut self, candidate: &T) -> GenResult<bool> {
        if self.seen.insert(candidate.clone()) {
            return Ok(true);
        }
        self.rejections += 1;
        if self.rejections >= MAX_REJECTIONS {
            return Err(GenError::PoolSaturated {
                pool: self.pool,
                rejections: self.rejections,
            });
        }
        Ok(false)
    }

    fn len(&self) -> usize {
        self.seen.len()
    }
}

/// Draw `count` unique values with `draw`, in acceptance order.
fn fill_unique<F>(
    pool: &'static str,
    count: u32,
    rng: &mut EventRng,
    mut draw: F,
) -> GenResult<Vec<String>>
where
    F: FnMut(&mut EventRng) -> GenResult<String>,
{
    let mut dedup = Dedup::new(pool);
    let mut out = Vec::with_capacity(count as usize);
    while dedup.len() < count as usize {
        let candidate = draw(rng)?;
        if dedup.accept(&candidate)? {
            out.push(candidate);
        }
    }
    log::debug!("pool {pool}: {count} values, {} duplicates rejected", dedup.rejections);
    Ok(out)
}

/// Event-id pool: unique publishers, each owning a balanced share of
/// globally unique 16-digit ids. The first `total_events % total_publishers`
/// publishers (by acceptance order) get one extra id.
pub fn build_event_id_pool(
    rng: &mut EventRng,
    total_publishers: u32,
    total_events: u32,
) -> GenResult<Vec<PublisherEventId>> {
    let mut publishers = Dedup::new("publishers");
    let mut ids = Dedup::new("event_ids");
    let mut pool = Vec::with_capacity(total_events as usize);

    let base_share = total_events / total_publishers;
    let remainder = total_events % total_publishers;

    while publishers.len() < total_publishers as usize {
        let publisher = rng.digits(PUBLISHER_DIGITS)?;
        if !publishers.accept(&publisher)? {
            continue;
        }
        let accepted = publishers.len() as u32;
        let share = if accepted <= remainder {
            base_share + 1
        } else {
            base_share
        };
        let mut issued = 0;
        while issued < share {
            let id = rng.digits(EVENT_ID_DIGITS)?;
            if ids.accept(&id)? {
                pool.push(PublisherEventId {
                    publisher: publisher.clone(),
                    id,
                });
                issued += 1;
            }
        }
    }
    Ok(pool)
}

pub fn build_unknown_device_pool(rng: &mut EventRng, count: u32) -> GenResult<Vec<String>> {
    fill_unique("unknown_devices", count, rng, |rng| {
        rng.lower_letters(UNKNOWN_DEVICE_LETTERS)
    })
}

/// `{1-10 letters}@{4-8 letters}.example.com`
pub fn build_email_pool(rng: &mut EventRng, count: u32) -> GenResult<Vec<String>> {
    fill_unique("emails", count, rng, |rng| {
        let local = rng.lower_letters_between(1, 10)?;
        let domain = rng.lower_letters_between(4, 8)?;
        Ok(format!("{local}@{domain}{EMAIL_DOMAIN_SUFFIX}"))
    })
}

/// `+(555){3 digits}-{4 digits}`
pub fn build_phone_pool(rng: &mut EventRng, count: u32) -> GenResult<Vec<String>> {
    fill_unique("phones", count, rng, |rng| {
        let exchange = rng.digits(3)?;
        let line = rng.digits(4)?;
        Ok(format!("+(555){exchange}-{line}"))
    })
}

pub fn build_proprietary_id_pool(rng: &mut EventRng, count: u32) -> GenResult<Vec<String>> {
    fill_unique("proprietary_ids", count, rng, |rng| {
        rng.digits(PROPRIETARY_ID_DIGITS)
    })
}

/// All pools of one generator.
#[derive(Debug, Clone)]
pub struct IdentifierPools {
    pub event_ids: Vec<PublisherEventId>,
    pub unknown_devices: Vec<String>,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub proprietary_ids: Vec<String>,
}

impl IdentifierPools {
    /// Validate the sizes, then build every pool from `rng`.
    pub fn build(rng: &mut EventRng, config: &GeneratorConfig) -> GenResult<Self> {
        config.validate()?;
        let pools = Self {
            event_ids: build_event_id_pool(rng, config.total_publishers, config.total_events)?,
            unknown_devices: build_unknown_device_pool(rng, config.unknown_device_count)?,
            emails: build_email_pool(rng, config.email_users_count)?,
            phones: build_phone_pool(rng, config.phone_users_count)?,
            proprietary_ids: build_proprietary_id_pool(
                rng,
                config.proprietary_id_space_1_users_count,
            )?,
        };
        log::info!(
            "pools built: {} event ids, {} unknown devices, {} emails, {} phones, {} proprietary ids",
            pools.event_ids.len(),
            pools.unknown_devices.len(),
            pools.emails.len(),
            pools.phones.len(),
            pools.proprietary_ids.len()
        );
        Ok(pools)
    }

    /// Take the next unused event id.
    pub fn pop_event_id(&mut self) -> GenResult<PublisherEventId> {
        self.event_ids.pop().ok_or(GenError::Exhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, StreamSlot};
    use std::collections::HashMap;

    fn rng() -> EventRng {
        RngBank::new(2021).for_stream(StreamSlot::Pools)
    }

    fn per_publisher(pool: &[PublisherEventId]) -> Vec<(String, usize)> {
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, usize> = HashMap::new();
        for entry in pool {
            if !counts.contains_key(&entry.publisher) {
                order.push(entry.publisher.clone());
            }
            *counts.entry(entry.publisher.clone()).or_default() += 1;
        }
        order.into_iter().map(|p| { let c = counts[&p]; (p, c) }).collect()
    }

    #[test]
    fn event_ids_split_evenly_across_publishers() {
        let pool = build_event_id_pool(&mut rng(), 10, 1000).unwrap();
        assert_eq!(pool.len(), 1000);
        let ids: HashSet<_> = pool.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids.len(), 1000);
        let split = per_publisher(&pool);
        assert_eq!(split.len(), 10);
        assert!(split.iter().all(|(_, c)| *c == 100), "{split:?}");
        assert!(pool.iter().all(PublisherEventId::is_well_formed));
    }

    #[test]
    fn remainder_goes_to_first_publishers() {
        let pool = build_event_id_pool(&mut rng(), 3, 10).unwrap();
        let counts: Vec<usize> = per_publisher(&pool).into_iter().map(|(_, c)| c).collect();
        assert_eq!(counts, vec![4, 3, 3]);
    }

    #[test]
    fn more_publishers_than_events_leaves_some_empty() {
        let pool = build_event_id_pool(&mut rng(), 5, 2).unwrap();
        assert_eq!(pool.len(), 2);
        let split = per_publisher(&pool);
        assert_eq!(split.len(), 2);
        assert!(split.iter().all(|(_, c)| *c == 1));
    }

    #[test]
    fn identity_pools_are_unique_and_well_formed() {
        let mut rng = rng();
        let devices = build_unknown_device_pool(&mut rng, 500).unwrap();
        let emails = build_email_pool(&mut rng, 500).unwrap();
        let phones = build_phone_pool(&mut rng, 500).unwrap();
        let props = build_proprietary_id_pool(&mut rng, 500).unwrap();

        for pool in [&devices, &emails, &phones, &props] {
            assert_eq!(pool.len(), 500);
            assert_eq!(pool.iter().collect::<HashSet<_>>().len(), 500);
        }
        assert!(devices
            .iter()
            .all(|d| d.len() == 10 && d.chars().all(|c| c.is_ascii_lowercase())));
        for email in &emails {
            let (local, domain) = email.split_once('@').expect("missing @");
            let host = domain.strip_suffix(EMAIL_DOMAIN_SUFFIX).expect("bad suffix");
            assert!((1..=10).contains(&local.len()), "{email}");
            assert!((4..=8).contains(&host.len()), "{email}");
            assert!(local.chars().chain(host.chars()).all(|c| c.is_ascii_lowercase()));
        }
        for phone in &phones {
            let rest = phone.strip_prefix("+(555)").expect("bad prefix");
            let (exchange, line) = rest.split_once('-').expect("missing dash");
            assert_eq!(exchange.len(), 3, "{phone}");
            assert_eq!(line.len(), 4, "{phone}");
            assert!(exchange.chars().chain(line.chars()).all(|c| c.is_ascii_digit()));
        }
        assert!(props
            .iter()
            .all(|p| p.len() == 16 && p.chars().all(|c| c.is_ascii_digit())));
    }

    #[test]
    fn saturated_space_fails_instead_of_spinning() {
        // Only 9 one-digit values exist; asking for 10 can never finish.
        let err = fill_unique("tiny", 10, &mut rng(), |rng| rng.digits(1)).unwrap_err();
        assert!(matches!(err, GenError::PoolSaturated { pool: "tiny", .. }));
    }

    #[test]
    fn pop_drains_then_exhausts() {
        let mut config = GeneratorConfig::default();
        config.total_publishers = 1;
        config.total_events = 2;
        config.unknown_device_count = 1;
        config.email_users_count = 1;
        config.phone_users_count = 1;
        config.proprietary_id_space_1_users_count = 1;
        let mut pools = IdentifierPools::build(&mut rng(), &config).unwrap();
        let a = pools.pop_event_id().unwrap();
        let b = pools.pop_event_id().unwrap();
        assert_ne!(a, b);
        assert!(matches!(pools.pop_event_id(), Err(GenError::Exhausted)));
    }

    #[test]
    fn invalid_sizes_refuse_construction() {
        let config = GeneratorConfig {
            total_publishers: 0,
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            IdentifierPools::build(&mut rng(), &config),
            Err(GenError::Config { field: "total_publishers", .. })
        ));
    }
}
