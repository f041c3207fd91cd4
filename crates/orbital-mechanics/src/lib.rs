//! Orbital Mechanics Library
//!
//! Mean-rate Keplerian propagation and unit-sphere coordinate transforms
//! for the simulated satellite/ground network.
//!
//! # Model Space
//!
//! All render-space coordinates live on a sphere of radius 1 (one Earth
//! radius). A node at altitude `h` sits at radius `1 + h_km / 6371`.
//!
//! | Quantity | Unit |
//! |----------|------|
//! | latitude / longitude | degrees |
//! | inclination / RAAN | degrees |
//! | period | seconds |
//! | altitude | meters |
//! | phase θ | radians, [0, 2π) |

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use thiserror::Error;

pub mod propagation;
pub mod transforms;

pub use propagation::{propagate, Propagated};
pub use transforms::{geo_to_unit_sphere, render_radius, unit_sphere_to_geo, Point3};

/// Mean Earth radius used by the model space
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Model units per kilometer (1 unit = 1 Earth radius)
pub const SCALE: f64 = 1.0 / EARTH_RADIUS_KM;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrbitalError {
    #[error("Invalid orbit: {0}")]
    InvalidOrbit(String),
    #[error("Negative time step: {0}s")]
    NegativeTimeStep(f64),
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
}

pub type Result<T> = std::result::Result<T, OrbitalError>;

/// Geographic position (degrees, meters above the reference sphere)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64, altitude_m: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !latitude.is_finite() {
            return Err(OrbitalError::InvalidCoordinates(format!(
                "latitude {} outside [-90, 90]",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) || !longitude.is_finite() {
            return Err(OrbitalError::InvalidCoordinates(format!(
                "longitude {} outside [-180, 180]",
                longitude
            )));
        }
        if !altitude_m.is_finite() {
            return Err(OrbitalError::InvalidCoordinates(format!(
                "altitude {} is not finite",
                altitude_m
            )));
        }

        Ok(Self {
            latitude,
            longitude: transforms::normalize_longitude(longitude),
            altitude_m,
        })
    }

    /// Surface position (altitude 0)
    pub fn surface(latitude: f64, longitude: f64) -> Result<Self> {
        Self::new(latitude, longitude, 0.0)
    }

    /// Project into model space at this position's altitude
    pub fn to_model(&self) -> Point3 {
        geo_to_unit_sphere(self.latitude, self.longitude, render_radius(self.altitude_m))
    }
}

/// Orbit class as reported by the node feed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrbitClass {
    Leo,
    Meo,
    Geo,
}

impl OrbitClass {
    /// Geostationary-class satellites are exempt from propagation
    pub fn is_geostationary(&self) -> bool {
        matches!(self, OrbitClass::Geo)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrbitClass::Leo => "LEO",
            OrbitClass::Meo => "MEO",
            OrbitClass::Geo => "GEO",
        }
    }
}

/// Orbit descriptor. Immutable once assigned to a satellite.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Orbit {
    inclination_deg: f64,
    raan_deg: f64,
    period_s: f64,
    eccentricity: f64,
    altitude_m: f64,
}

impl Orbit {
    pub fn new(
        inclination_deg: f64,
        raan_deg: f64,
        period_s: f64,
        eccentricity: f64,
        altitude_m: f64,
    ) -> Result<Self> {
        if !(period_s.is_finite() && period_s > 0.0) {
            return Err(OrbitalError::InvalidOrbit(format!(
                "period must be positive, got {}",
                period_s
            )));
        }
        if !(0.0..1.0).contains(&eccentricity) {
            return Err(OrbitalError::InvalidOrbit(format!(
                "eccentricity must be in [0, 1), got {}",
                eccentricity
            )));
        }
        if !(inclination_deg.is_finite() && raan_deg.is_finite() && altitude_m.is_finite()) {
            return Err(OrbitalError::InvalidOrbit(
                "inclination, RAAN and altitude must be finite".to_string(),
            ));
        }

        Ok(Self {
            inclination_deg,
            raan_deg,
            period_s,
            eccentricity,
            altitude_m,
        })
    }

    pub fn inclination_deg(&self) -> f64 {
        self.inclination_deg
    }

    pub fn raan_deg(&self) -> f64 {
        self.raan_deg
    }

    pub fn period_s(&self) -> f64 {
        self.period_s
    }

    pub fn eccentricity(&self) -> f64 {
        self.eccentricity
    }

    pub fn altitude_m(&self) -> f64 {
        self.altitude_m
    }

    /// Mean angular rate ω = 2π / T (rad/s)
    pub fn angular_rate(&self) -> f64 {
        TAU / self.period_s
    }

    /// Semi-major axis in model units
    pub fn semi_major_axis(&self) -> f64 {
        (EARTH_RADIUS_KM + self.altitude_m / 1000.0) * SCALE
    }
}

/// The only mutable orbital quantity: phase angle θ in [0, 2π)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct OrbitState {
    theta: f64,
}

impl OrbitState {
    pub fn new(theta: f64) -> Self {
        Self {
            theta: wrap_angle(theta),
        }
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }
}

/// Wrap an angle into [0, 2π)
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
