//! Threat Catalog
//!
//! Static, process-wide set of named hazard zones. Loaded once at
//! startup and shared read-only; there is no mutation API. Seed data
//! covers the Northeast India pilot region across all five threat
//! categories.

use serde::Serialize;

use crate::{haversine_km, GeoPoint, ThreatCategory, ThreatRecord};

/// One proximity matcher hit: a catalog record plus the computed
/// distance from the query point.
#[derive(Debug, Clone, Serialize)]
pub struct ProximityMatch {
    pub record: ThreatRecord,
    pub distance_km: f64,
}

/// Immutable collection of threat records, queryable by proximity.
#[derive(Debug, Clone)]
pub struct ThreatCatalog {
    records: Vec<ThreatRecord>,
}

impl ThreatCatalog {
    pub fn new(records: Vec<ThreatRecord>) -> Self {
        Self { records }
    }

    /// Load the fixed seed set.
    pub fn seeded() -> Self {
        Self::new(seed_records())
    }

    pub fn all(&self) -> &[ThreatRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find every record whose influence zone intersects the query.
    ///
    /// A record matches iff `distance <= max(radius_km, record.radius_km)`:
    /// either the caller's search radius or the threat's own declared
    /// radius may cover the gap, whichever is larger. A wide static zone
    /// is therefore matched even by a narrow search, and vice versa.
    ///
    /// Results keep catalog iteration order (reproducible; callers
    /// wanting nearest-first sort explicitly). No threat level filtering
    /// happens here.
    pub fn nearby(&self, point: GeoPoint, radius_km: f64) -> Vec<ProximityMatch> {
        self.records
            .iter()
            .filter_map(|record| {
                let distance_km = haversine_km(point, record.location);
                if distance_km <= radius_km.max(record.radius_km) {
                    Some(ProximityMatch {
                        record: record.clone(),
                        distance_km,
                    })
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Fixed seed table: (name, lat, lng, radius_km, threat_level, category).
fn seed_records() -> Vec<ThreatRecord> {
    use ThreatCategory::*;

    let rows: [(&str, f64, f64, f64, u8, ThreatCategory); 11] = [
        // Natural disasters
        ("Brahmaputra Flood Belt", 26.1445, 91.7362, 40.0, 8, NaturalDisaster),
        ("Majuli Erosion Zone", 26.9500, 94.1700, 25.0, 6, NaturalDisaster),
        ("Sikkim Landslide Corridor", 27.3300, 88.6200, 30.0, 7, NaturalDisaster),
        // Crime hotspots
        ("Guwahati Crime Hotspot", 26.1433, 91.7898, 8.0, 6, Crime),
        ("Dimapur Station Area", 25.9063, 93.7276, 6.0, 5, Crime),
        // Political unrest
        ("Imphal Valley Unrest Zone", 24.8170, 93.9368, 35.0, 9, PoliticalUnrest),
        ("Churachandpur District", 24.3333, 93.6833, 30.0, 8, PoliticalUnrest),
        // Health risks
        ("Lower Assam Malaria Belt", 26.3500, 90.6000, 60.0, 5, HealthRisk),
        ("Upper Assam Encephalitis Zone", 26.7500, 94.2000, 45.0, 6, HealthRisk),
        // Restricted areas
        ("Tawang Border Area", 27.5856, 91.8575, 50.0, 9, RestrictedArea),
        ("Dibang Valley Inner Line", 28.7000, 95.7000, 80.0, 7, RestrictedArea),
    ];

    rows.iter()
        .map(|(name, lat, lng, radius_km, level, category)| {
            ThreatRecord::new(name, GeoPoint::new(*lat, *lng), *radius_km, *level, *category)
                .expect("seed record violates catalog invariants")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_covers_all_categories() {
        let catalog = ThreatCatalog::seeded();
        assert!(!catalog.is_empty());

        for category in ThreatCategory::ALL {
            let count = catalog
                .all()
                .iter()
                .filter(|r| r.category == category)
                .count();
            assert!(count >= 1, "no seed records for {category}");
        }
    }

    #[test]
    fn test_seed_invariants_hold() {
        for record in ThreatCatalog::seeded().all() {
            assert!(record.radius_km > 0.0);
            assert!((1..=10).contains(&record.threat_level));
        }
    }

    #[test]
    fn test_nearby_matches_wide_zone_with_narrow_search() {
        // Threat with a 500 km influence radius near Tokyo
        let record = ThreatRecord::new(
            "Kanto Exclusion Zone",
            GeoPoint::new(35.6762, 139.6503),
            500.0,
            9,
            ThreatCategory::RestrictedArea,
        )
        .unwrap();
        let catalog = ThreatCatalog::new(vec![record]);

        // Query point ~50 km away with a 10 km search radius: the
        // threat's own radius must still produce a match.
        let matches = catalog.nearby(GeoPoint::new(36.0, 140.0), 10.0);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].distance_km > 40.0 && matches[0].distance_km < 60.0);
    }

    #[test]
    fn test_nearby_matches_distant_zone_with_wide_search() {
        let record = ThreatRecord::new(
            "Small Zone",
            GeoPoint::new(36.0, 140.0),
            1.0,
            3,
            ThreatCategory::Crime,
        )
        .unwrap();
        let catalog = ThreatCatalog::new(vec![record]);

        // ~57 km away, 1 km zone: excluded at 10 km search radius,
        // included at 100 km.
        let point = GeoPoint::new(35.6762, 139.6503);
        assert!(catalog.nearby(point, 10.0).is_empty());
        assert_eq!(catalog.nearby(point, 100.0).len(), 1);
    }

    #[test]
    fn test_nearby_preserves_catalog_order() {
        let p = GeoPoint::new(0.0, 0.0);
        let far = ThreatRecord::new("far", GeoPoint::new(0.5, 0.0), 5.0, 5, ThreatCategory::Crime)
            .unwrap();
        let near =
            ThreatRecord::new("near", GeoPoint::new(0.1, 0.0), 5.0, 5, ThreatCategory::Crime)
                .unwrap();

        // "far" listed first and farther away: output must not re-sort
        let catalog = ThreatCatalog::new(vec![far, near]);
        let matches = catalog.nearby(p, 100.0);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].record.name, "far");
        assert_eq!(matches[1].record.name, "near");
        assert!(matches[0].distance_km > matches[1].distance_km);
    }

    #[test]
    fn test_nearby_fresh_result_per_query() {
        let catalog = ThreatCatalog::seeded();
        let p = GeoPoint::new(26.1445, 91.7362);
        let a = catalog.nearby(p, 25.0);
        let b = catalog.nearby(p, 25.0);
        assert_eq!(a.len(), b.len());
    }
}
