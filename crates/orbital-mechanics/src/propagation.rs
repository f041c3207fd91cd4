//! Mean-rate Keplerian propagation
//!
//! Advances a satellite's phase angle at the orbit's *mean* angular rate and
//! derives the new geographic sub-point.
//!
//! # Known approximation
//!
//! Kepler's equation is not solved. Eccentricity only modulates the orbital
//! radius `r = a(1−e²)/(1+e·cosθ)`, never the angular rate, so for e > 0 the
//! satellite sweeps angle uniformly instead of obeying Kepler's second law.
//! Downstream visuals are tuned against this behaviour; keep it.

use nalgebra::{Rotation3, Vector3};

use crate::transforms::{normalize_longitude, Point3};
use crate::{wrap_angle, GeoPosition, Orbit, OrbitClass, OrbitState, OrbitalError, Result};

/// Result of one propagation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Propagated {
    pub state: OrbitState,
    pub sub_point: GeoPosition,
}

/// Advance `state` by `dt_s` seconds and derive the new sub-point.
///
/// Identity when `dt_s == 0` or the satellite is geostationary-class; the
/// input sub-point is returned untouched in both cases.
pub fn propagate(
    orbit: &Orbit,
    class: OrbitClass,
    state: OrbitState,
    sub_point: GeoPosition,
    dt_s: f64,
) -> Result<Propagated> {
    if !(dt_s >= 0.0) {
        return Err(OrbitalError::NegativeTimeStep(dt_s));
    }
    if dt_s == 0.0 || class.is_geostationary() {
        return Ok(Propagated { state, sub_point });
    }

    let next = advance_phase(orbit, state, dt_s);
    let (latitude, longitude) = sub_point_at(orbit, next);

    Ok(Propagated {
        state: next,
        sub_point: GeoPosition {
            latitude,
            longitude,
            altitude_m: sub_point.altitude_m,
        },
    })
}

/// θ' = (θ + ω·Δt) mod 2π
pub fn advance_phase(orbit: &Orbit, state: OrbitState, dt_s: f64) -> OrbitState {
    OrbitState::new(wrap_angle(state.theta() + orbit.angular_rate() * dt_s))
}

/// Position in the Earth-centered frame (z = polar axis), model units
pub fn orbital_position(orbit: &Orbit, state: OrbitState) -> Point3 {
    let theta = state.theta();
    let e = orbit.eccentricity();
    let a = orbit.semi_major_axis();
    let r = a * (1.0 - e * e) / (1.0 + e * theta.cos());

    let in_plane = Vector3::new(r * theta.cos(), r * theta.sin(), 0.0);

    // inclination about the in-plane x-axis, then RAAN about world z
    let inclination = Rotation3::from_axis_angle(&Vector3::x_axis(), orbit.inclination_deg().to_radians());
    let raan = Rotation3::from_axis_angle(&Vector3::z_axis(), orbit.raan_deg().to_radians());

    raan * (inclination * in_plane)
}

/// Geographic sub-point (lat, lon) for a phase angle
pub fn sub_point_at(orbit: &Orbit, state: OrbitState) -> (f64, f64) {
    let p = orbital_position(orbit, state);
    let distance = p.norm();

    let lat = (p.z / distance).clamp(-1.0, 1.0).asin().to_degrees();
    let lon = normalize_longitude(p.y.atan2(p.x).to_degrees());

    (lat, lon)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(2000))]

        // Sub-point always lands in the valid geographic range
        #[test]
        fn fuzz_sub_point_in_range(
            inclination in 0.0f64..180.0,
            raan in 0.0f64..360.0,
            period in 5000.0f64..90_000.0,
            ecc in 0.0f64..0.9,
            theta in 0.0f64..6.28,
            dt in 0.0f64..100_000.0,
        ) {
            let orbit = Orbit::new(inclination, raan, period, ecc, 550_000.0).unwrap();
            let start = GeoPosition::new(0.0, 0.0, 550_000.0).unwrap();
            let out = propagate(&orbit, OrbitClass::Leo, OrbitState::new(theta), start, dt).unwrap();

            prop_assert!((-90.0..=90.0).contains(&out.sub_point.latitude));
            prop_assert!(out.sub_point.longitude > -180.0 && out.sub_point.longitude <= 180.0);
            prop_assert!(out.state.theta() >= 0.0 && out.state.theta() < std::f64::consts::TAU);
        }
    }
}
