//! Threat Engine Library
//!
//! Geospatial proximity engine for tourist safety: a static catalog of
//! named hazard zones, great-circle distance math, radius-based
//! proximity matching, and a route deviation heuristic.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use thiserror::Error;

pub mod catalog;
pub mod route;

pub use catalog::{ProximityMatch, ThreatCatalog};
pub use route::safer_route;

/// Mean Earth radius in km (spherical approximation)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Error, Debug)]
pub enum ThreatError {
    #[error("Coordinate out of range: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },
    #[error("Threat radius must be positive, got {0}")]
    InvalidRadius(f64),
    #[error("Threat level must be 1-10, got {0}")]
    InvalidThreatLevel(u8),
}

pub type Result<T> = std::result::Result<T, ThreatError>;

/// A WGS84 coordinate pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Boundary-checked constructor. `haversine_km` itself does not
    /// validate; callers taking external input go through here.
    pub fn validated(lat: f64, lng: f64) -> Result<Self> {
        if !lat.is_finite() || !lng.is_finite() || !(-90.0..=90.0).contains(&lat)
            || !(-180.0..=180.0).contains(&lng)
        {
            return Err(ThreatError::InvalidCoordinate { lat, lng });
        }
        Ok(Self { lat, lng })
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

/// Hazard classification for catalog records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatCategory {
    NaturalDisaster,
    Crime,
    PoliticalUnrest,
    HealthRisk,
    RestrictedArea,
}

impl ThreatCategory {
    pub const ALL: [ThreatCategory; 5] = [
        ThreatCategory::NaturalDisaster,
        ThreatCategory::Crime,
        ThreatCategory::PoliticalUnrest,
        ThreatCategory::HealthRisk,
        ThreatCategory::RestrictedArea,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatCategory::NaturalDisaster => "natural_disaster",
            ThreatCategory::Crime => "crime",
            ThreatCategory::PoliticalUnrest => "political_unrest",
            ThreatCategory::HealthRisk => "health_risk",
            ThreatCategory::RestrictedArea => "restricted_area",
        }
    }
}

impl fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A static named hazard zone. Immutable after catalog load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatRecord {
    pub name: String,
    pub location: GeoPoint,
    /// Zone of influence around the location
    pub radius_km: f64,
    /// Severity 1 (minor) to 10 (extreme)
    pub threat_level: u8,
    pub category: ThreatCategory,
}

impl ThreatRecord {
    pub fn new(
        name: &str,
        location: GeoPoint,
        radius_km: f64,
        threat_level: u8,
        category: ThreatCategory,
    ) -> Result<Self> {
        if !(radius_km > 0.0) {
            return Err(ThreatError::InvalidRadius(radius_km));
        }
        if !(1..=10).contains(&threat_level) {
            return Err(ThreatError::InvalidThreatLevel(threat_level));
        }
        Ok(Self {
            name: name.to_string(),
            location,
            radius_km,
            threat_level,
            category,
        })
    }
}

/// Great-circle distance between two points in km (haversine formula).
///
/// Pure function: symmetric, non-negative, zero iff both points are
/// equal. Inputs outside the valid lat/lng domain are caller error and
/// produce unspecified results.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1_rad = a.lat * PI / 180.0;
    let lat2_rad = b.lat * PI / 180.0;
    let dlat = (b.lat - a.lat) * PI / 180.0;
    let dlng = (b.lng - a.lng) * PI / 180.0;

    let h = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_haversine_identity() {
        let p = GeoPoint::new(26.1445, 91.7362);
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Guwahati to Tawang, ~162 km great-circle
        let guwahati = GeoPoint::new(26.1445, 91.7362);
        let tawang = GeoPoint::new(27.5856, 91.8575);
        let d = haversine_km(guwahati, tawang);
        assert!((d - 162.0).abs() < 5.0, "got {d} km");
    }

    #[test]
    fn test_validated_rejects_out_of_range() {
        assert!(GeoPoint::validated(91.0, 0.0).is_err());
        assert!(GeoPoint::validated(-91.0, 0.0).is_err());
        assert!(GeoPoint::validated(0.0, 181.0).is_err());
        assert!(GeoPoint::validated(0.0, -181.0).is_err());
        assert!(GeoPoint::validated(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::validated(45.0, -120.0).is_ok());
    }

    #[test]
    fn test_record_invariants() {
        let p = GeoPoint::new(0.0, 0.0);
        assert!(ThreatRecord::new("a", p, 0.0, 5, ThreatCategory::Crime).is_err());
        assert!(ThreatRecord::new("a", p, -1.0, 5, ThreatCategory::Crime).is_err());
        assert!(ThreatRecord::new("a", p, 1.0, 0, ThreatCategory::Crime).is_err());
        assert!(ThreatRecord::new("a", p, 1.0, 11, ThreatCategory::Crime).is_err());
        assert!(ThreatRecord::new("a", p, 1.0, 10, ThreatCategory::Crime).is_ok());
    }

    #[test]
    fn test_category_serde_tags() {
        let json = serde_json::to_string(&ThreatCategory::NaturalDisaster).unwrap();
        assert_eq!(json, "\"natural_disaster\"");
        let back: ThreatCategory = serde_json::from_str("\"restricted_area\"").unwrap();
        assert_eq!(back, ThreatCategory::RestrictedArea);
    }

    proptest! {
        #[test]
        fn prop_haversine_symmetric(
            lat1 in -90.0f64..90.0, lng1 in -180.0f64..180.0,
            lat2 in -90.0f64..90.0, lng2 in -180.0f64..180.0,
        ) {
            let a = GeoPoint::new(lat1, lng1);
            let b = GeoPoint::new(lat2, lng2);
            let ab = haversine_km(a, b);
            let ba = haversine_km(b, a);
            prop_assert!(ab >= 0.0);
            prop_assert!((ab - ba).abs() < 1e-9);
        }

        #[test]
        fn prop_haversine_bounded_by_half_circumference(
            lat1 in -90.0f64..90.0, lng1 in -180.0f64..180.0,
            lat2 in -90.0f64..90.0, lng2 in -180.0f64..180.0,
        ) {
            let d = haversine_km(GeoPoint::new(lat1, lng1), GeoPoint::new(lat2, lng2));
            prop_assert!(d <= EARTH_RADIUS_KM * PI + 1e-6);
        }
    }
}
