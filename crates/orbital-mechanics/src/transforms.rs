//! Unit-sphere coordinate transforms
//!
//! Forward and inverse mapping between geographic coordinates and the
//! model space consumed by the renderer. The frame is Y-up:
//!
//! ```text
//! φ = (90 − lat)·π/180      (colatitude)
//! θ = (lon + 180)·π/180
//! p = (−r·sinφ·cosθ,  r·cosφ,  r·sinφ·sinθ)
//! ```
//!
//! At lat = ±90 every longitude maps to the same pole point. The inverse
//! therefore cannot recover longitude there and returns whatever atan2
//! yields; callers treat the poles as degenerate, not as an error.

use nalgebra::Vector3;

use crate::EARTH_RADIUS_KM;

/// Model-space point (units of Earth radii)
pub type Point3 = Vector3<f64>;

/// Map latitude/longitude (degrees) onto a sphere of the given radius
pub fn geo_to_unit_sphere(lat: f64, lon: f64, radius: f64) -> Point3 {
    let phi = (90.0 - lat).to_radians();
    let theta = (lon + 180.0).to_radians();

    Vector3::new(
        -(radius * phi.sin() * theta.cos()),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// Invert [`geo_to_unit_sphere`] for a point in the globe's local frame.
///
/// Any globe rotation applied by the renderer must be removed by the caller
/// first. The origin maps to (0, 0).
pub fn unit_sphere_to_geo(point: &Point3) -> (f64, f64) {
    let radius = point.norm();
    if radius == 0.0 || !radius.is_finite() {
        return (0.0, 0.0);
    }

    let phi = (point.y / radius).clamp(-1.0, 1.0).acos();
    let lat = 90.0 - phi.to_degrees();

    // forward: x = −A·cosθ, z = A·sinθ
    let theta_deg = point.z.atan2(-point.x).to_degrees();
    let lon = normalize_longitude(theta_deg - 180.0);

    (lat, lon)
}

/// Radial scale for a node at the given altitude (1.0 = surface)
pub fn render_radius(altitude_m: f64) -> f64 {
    1.0 + (altitude_m / 1000.0) / EARTH_RADIUS_KM
}

/// Normalize a longitude into (−180, 180]
pub fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = lon.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Smallest absolute difference between two longitudes (degrees)
pub fn longitude_delta(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prime_meridian_equator() {
        // lon 0 → θ = π → x = +r, z = 0
        let p = geo_to_unit_sphere(0.0, 0.0, 1.0);
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!(p.y.abs() < 1e-12);
        assert!(p.z.abs() < 1e-12);
    }

    #[test]
    fn test_north_pole_degenerates() {
        let a = geo_to_unit_sphere(90.0, 10.0, 1.0);
        let b = geo_to_unit_sphere(90.0, -150.0, 1.0);
        assert!((a - b).norm() < 1e-12);
        assert!((a.y - 1.0).abs() < 1e-12);

        let (lat, _lon) = unit_sphere_to_geo(&a);
        assert!((lat - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_origin_maps_to_zero() {
        assert_eq!(unit_sphere_to_geo(&Point3::zeros()), (0.0, 0.0));
    }

    #[test]
    fn test_inverse_ignores_radius() {
        let p = geo_to_unit_sphere(35.5, -120.25, 1.08);
        let (lat, lon) = unit_sphere_to_geo(&p);
        assert!((lat - 35.5).abs() < 1e-9);
        assert!((lon + 120.25).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(normalize_longitude(180.0), 180.0);
        assert_eq!(normalize_longitude(-180.0), 180.0);
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
        assert_eq!(normalize_longitude(540.0), 180.0);
    }

    #[test]
    fn test_render_radius() {
        assert_eq!(render_radius(0.0), 1.0);
        assert!((render_radius(637_100.0) - 1.1).abs() < 1e-12);
    }
}
