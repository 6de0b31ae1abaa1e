//! Great-circle distance and the geofence check.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::LocationSample;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance in meters between two points given in degrees.
///
/// Symmetric, exactly `0.0` for identical inputs, and never NaN for finite
/// inputs: the haversine term is clamped to `[0, 1]` so rounding on
/// antipodal points can't push `sqrt(1 - a)` below zero.
pub fn distance_meters(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    let phi_a = lat_a.to_radians();
    let phi_b = lat_b.to_radians();
    let d_phi = (lat_b - lat_a).to_radians();
    let d_lambda = (lon_b - lon_a).to_radians();

    let sin_phi = (d_phi / 2.0).sin();
    let sin_lambda = (d_lambda / 2.0).sin();
    let a = sin_phi * sin_phi + phi_a.cos() * phi_b.cos() * sin_lambda * sin_lambda;
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

// ---------------------------------------------------------------------------
// ProximityConfig
// ---------------------------------------------------------------------------

/// Geofence settings.
///
/// The threshold is per deployment: outdoor venues with poor GPS accuracy
/// want a larger radius than a lecture hall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityConfig {
    /// Maximum distance, in meters, between student and instructor.
    pub threshold_meters: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            threshold_meters: 100.0,
        }
    }
}

impl ProximityConfig {
    /// Replace a negative or non-finite threshold with the default.
    pub fn validated(mut self) -> Self {
        if !self.threshold_meters.is_finite() || self.threshold_meters < 0.0 {
            let fallback = Self::default().threshold_meters;
            warn!(
                threshold_meters = self.threshold_meters,
                fallback, "invalid geofence threshold, using default"
            );
            self.threshold_meters = fallback;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// ProximityValidator
// ---------------------------------------------------------------------------

/// Decides whether two readings are close enough.
#[derive(Debug, Clone, Default)]
pub struct ProximityValidator {
    config: ProximityConfig,
}

impl ProximityValidator {
    pub fn new(config: ProximityConfig) -> Self {
        Self {
            config: config.validated(),
        }
    }

    /// Validator with a specific threshold in meters.
    pub fn with_threshold(threshold_meters: f64) -> Self {
        Self::new(ProximityConfig { threshold_meters })
    }

    pub fn threshold_meters(&self) -> f64 {
        self.config.threshold_meters
    }

    /// Distance between two samples in meters.
    pub fn distance(&self, a: &LocationSample, b: &LocationSample) -> f64 {
        distance_meters(a.latitude, a.longitude, b.latitude, b.longitude)
    }

    /// `true` iff the student is at most `threshold_meters` from the
    /// instructor. Non-finite coordinates are never in range.
    pub fn is_within_range(&self, student: &LocationSample, instructor: &LocationSample) -> bool {
        let distance = self.distance(student, instructor);
        distance.is_finite() && distance <= self.config.threshold_meters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(lat: f64, lon: f64) -> LocationSample {
        LocationSample::new(lat, lon, 0)
    }

    #[test]
    fn test_distance_identical_points_is_zero() {
        for (lat, lon) in [(0.0, 0.0), (18.5204, 73.8567), (-89.9, 179.9), (90.0, -180.0)] {
            assert_eq!(distance_meters(lat, lon, lat, lon), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            ((18.5204, 73.8567), (18.5314, 73.8446)),
            ((51.5007, -0.1246), (40.6892, -74.0445)),
            ((-33.8568, 151.2153), (35.6586, 139.7454)),
            ((0.0, 179.9), (0.0, -179.9)),
        ];
        for ((la, oa), (lb, ob)) in pairs {
            let ab = distance_meters(la, oa, lb, ob);
            let ba = distance_meters(lb, ob, la, oa);
            assert!((ab - ba).abs() < 1e-6, "{ab} vs {ba}");
        }
    }

    #[test]
    fn test_distance_antipodal_is_half_circumference() {
        let d = distance_meters(0.0, 0.0, 0.0, 180.0);
        assert!(!d.is_nan());
        let half = std::f64::consts::PI * EARTH_RADIUS_METERS;
        assert!((d - half).abs() < 1e-3, "{d}");

        let poles = distance_meters(90.0, 0.0, -90.0, 0.0);
        assert!((poles - half).abs() < 1e-3, "{poles}");
    }

    #[test]
    fn test_distance_across_antimeridian_is_short() {
        // 0.2° of longitude on the equator, not 359.8°.
        let d = distance_meters(0.0, 179.9, 0.0, -179.9);
        assert!((d - 22_238.985).abs() < 1.0, "{d}");
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let d = distance_meters(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_194.93).abs() < 0.01, "{d}");
    }

    #[test]
    fn test_is_within_range_straddles_hundred_meters() {
        let v = ProximityValidator::default();
        let instructor = at(18.5204, 73.8567);

        // ~98.96 m north.
        assert!(v.is_within_range(&at(18.5204 + 0.00089, 73.8567), &instructor));
        // ~100.08 m north.
        assert!(!v.is_within_range(&at(18.5204 + 0.0009, 73.8567), &instructor));
        // ~101.19 m north.
        assert!(!v.is_within_range(&at(18.5204 + 0.00091, 73.8567), &instructor));
    }

    #[test]
    fn test_is_within_range_includes_boundary() {
        let instructor = at(0.0, 0.0);
        let student = at(0.0009, 0.0);
        let exact = distance_meters(0.0009, 0.0, 0.0, 0.0);

        assert!(ProximityValidator::with_threshold(exact).is_within_range(&student, &instructor));
    }

    #[test]
    fn test_is_within_range_same_spot_with_zero_threshold() {
        let v = ProximityValidator::with_threshold(0.0);
        assert!(v.is_within_range(&at(10.0, 10.0), &at(10.0, 10.0)));
    }

    #[test]
    fn test_is_within_range_rejects_nan() {
        let v = ProximityValidator::default();
        assert!(!v.is_within_range(&at(f64::NAN, 0.0), &at(0.0, 0.0)));
    }

    #[test]
    fn test_larger_threshold_for_outdoor_venue() {
        let v = ProximityValidator::with_threshold(250.0);
        assert!(v.is_within_range(&at(0.002, 0.0), &at(0.0, 0.0)));
    }

    #[test]
    fn test_config_validated_replaces_negative_threshold() {
        let v = ProximityValidator::with_threshold(-5.0);
        assert_eq!(v.threshold_meters(), 100.0);
        let v = ProximityValidator::with_threshold(f64::NAN);
        assert_eq!(v.threshold_meters(), 100.0);
    }
}
