//! Hierarchical geo encoding.
//!
//! country_id is in [100, 99 + total_countries]. region_id is
//! country_id * 1000 plus a region index, city_id is region_id * 1000
//! plus a city index. The leading digits of a child always equal its parent.

use crate::{
    error::{ensure, GenResult},
    rng::EventRng,
    seeded::integer_with_seed,
};
use serde::{Deserialize, Serialize};

pub const FIRST_COUNTRY_ID: i64 = 100;
/// Place-value factor between nesting levels.
pub const NESTING_FACTOR: i64 = 1000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeoLocation {
    pub country_id: i64,
    pub region_id: i64,
    pub city_id: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeoBounds {
    pub total_countries: u32,
    pub regions_per_country: u32,
    pub cities_per_region: u32,
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self {
            total_countries: 10,
            regions_per_country: 10,
            cities_per_region: 10,
        }
    }
}

impl GeoBounds {
    pub fn validate(&self) -> GenResult<()> {
        ensure(
            (1..=900).contains(&self.total_countries),
            "total_countries",
            "must be between 1 and 900",
        )?;
        ensure(
            (1..=1000).contains(&self.regions_per_country),
            "regions_per_country",
            "must be between 1 and 1000",
        )?;
        ensure(
            (1..=1000).contains(&self.cities_per_region),
            "cities_per_region",
            "must be between 1 and 1000",
        )
    }

    fn last_country_id(&self) -> i64 {
        FIRST_COUNTRY_ID - 1 + i64::from(self.total_countries)
    }
}

impl GeoLocation {
    /// Draw a location from the event stream.
    pub fn random(rng: &mut EventRng, bounds: &GeoBounds) -> GenResult<Self> {
        bounds.validate()?;
        let country_id = rng.integer(FIRST_COUNTRY_ID, bounds.last_country_id())?;
        let region_index = rng.integer(0, i64::from(bounds.regions_per_country) - 1)?;
        let city_index = rng.integer(0, i64::from(bounds.cities_per_region) - 1)?;
        Ok(Self::nest(country_id, region_index, city_index))
    }

    /// Derive a location from `seed_prefix` with the `_home_geo_*` suffixes.
    pub fn from_seed(seed_prefix: &str, bounds: &GeoBounds) -> GenResult<Self> {
        bounds.validate()?;
        let country_id = integer_with_seed(
            FIRST_COUNTRY_ID,
            bounds.last_country_id(),
            &format!("{seed_prefix}_home_geo_country"),
        )?;
        let region_index = integer_with_seed(
            0,
            i64::from(bounds.regions_per_country) - 1,
            &format!("{seed_prefix}_home_geo_region"),
        )?;
        let city_index = integer_with_seed(
            0,
            i64::from(bounds.cities_per_region) - 1,
            &format!("{seed_prefix}_home_geo_city"),
        )?;
        Ok(Self::nest(country_id, region_index, city_index))
    }

    fn nest(country_id: i64, region_index: i64, city_index: i64) -> Self {
        let region_id = country_id * NESTING_FACTOR + region_index;
        let city_id = region_id * NESTING_FACTOR + city_index;
        Self {
            country_id,
            region_id,
            city_id,
        }
    }

    /// True when the triple nests correctly and every level is within `bounds`.
    pub fn is_within(&self, bounds: &GeoBounds) -> bool {
        let country_ok =
            (FIRST_COUNTRY_ID..=bounds.last_country_id()).contains(&self.country_id);
        let region_base = self.country_id * NESTING_FACTOR;
        let region_ok = (region_base
            ..=region_base + i64::from(bounds.regions_per_country) - 1)
            .contains(&self.region_id);
        let city_base = self.region_id * NESTING_FACTOR;
        let city_ok = (city_base..=city_base + i64::from(bounds.cities_per_region) - 1)
            .contains(&self.city_id);
        country_ok && region_ok && city_ok
    }
}
