//! Weighted origin regions for automatically generated requests
//!
//! A region is picked by cumulative weight, then a point is drawn uniformly
//! inside its lat/lon box and rounded to 4 decimals.

use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
    pub name: &'static str,
    pub lat_range: (f64, f64),
    pub lon_range: (f64, f64),
    pub weight: u32,
}

impl Region {
    pub const fn new(
        name: &'static str,
        lat_range: (f64, f64),
        lon_range: (f64, f64),
        weight: u32,
    ) -> Self {
        Self {
            name,
            lat_range,
            lon_range,
            weight,
        }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_range.0
            && lat <= self.lat_range.1
            && lon >= self.lon_range.0
            && lon <= self.lon_range.1
    }

    /// Uniform point inside the box
    pub fn sample_point<R: Rng + ?Sized>(&self, rng: &mut R) -> (f64, f64) {
        let lat = round_to(uniform(rng, self.lat_range), 4);
        let lon = round_to(uniform(rng, self.lon_range), 4);
        (lat, lon)
    }
}

pub static DEFAULT_REGIONS: [Region; 9] = [
    Region::new("China", (18.0, 54.0), (73.0, 135.0), 20),
    Region::new("India", (8.0, 37.0), (68.0, 97.0), 18),
    Region::new("Europe", (35.0, 60.0), (-10.0, 40.0), 15),
    Region::new("USA", (25.0, 50.0), (-125.0, -66.0), 15),
    Region::new("Brazil", (-35.0, 5.0), (-74.0, -34.0), 7),
    Region::new("Nigeria", (4.0, 14.0), (3.0, 15.0), 5),
    Region::new("Japan", (30.0, 45.0), (129.0, 146.0), 5),
    Region::new("SoutheastAsia", (-10.0, 20.0), (95.0, 120.0), 5),
    Region::new("Other", (-90.0, 90.0), (-180.0, 180.0), 10),
];

#[derive(Debug, Clone)]
pub struct RegionTable {
    regions: Vec<Region>,
    total_weight: u32,
}

impl Default for RegionTable {
    fn default() -> Self {
        Self::new(DEFAULT_REGIONS.to_vec())
    }
}

impl RegionTable {
    /// Zero-weight regions are kept but never drawn.
    pub fn new(regions: Vec<Region>) -> Self {
        let total_weight = regions.iter().map(|r| r.weight).sum();
        Self {
            regions,
            total_weight,
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn total_weight(&self) -> u32 {
        self.total_weight
    }

    /// Cumulative-weight draw. `None` only when every weight is zero.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Region> {
        if self.total_weight == 0 {
            return None;
        }
        let mut ticket = rng.gen_range(0..self.total_weight);
        for region in &self.regions {
            if ticket < region.weight {
                return Some(region);
            }
            ticket -= region.weight;
        }
        None
    }

    /// Pick a region and a point inside it
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(&Region, f64, f64)> {
        let region = self.pick(rng)?;
        let (lat, lon) = region.sample_point(rng);
        Some((region, lat, lon))
    }
}

pub(crate) fn uniform<R: Rng + ?Sized>(rng: &mut R, (min, max): (f64, f64)) -> f64 {
    if max <= min {
        return min;
    }
    rng.gen_range(min..=max)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
