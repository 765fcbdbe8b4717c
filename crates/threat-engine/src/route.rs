//! Route Deviation Heuristic
//!
//! Nudges waypoints that sit inside high-severity threat zones by a
//! fixed offset. This is deliberately a prototype heuristic, not a
//! path planner: the perturbed point is not re-checked against the
//! catalog and may land inside another zone.

use crate::{GeoPoint, ThreatCatalog};

/// Search radius used when scanning each interior waypoint
pub const DEVIATION_SCAN_RADIUS_KM: f64 = 10.0;

/// Fixed perturbation in degrees, applied to both axes.
/// Roughly 1.1 km of latitude at the equator; the longitude component
/// shrinks toward the poles.
pub const DEVIATION_OFFSET_DEG: f64 = 0.01;

/// Minimum threat level that triggers a deviation
pub const DEVIATION_LEVEL_THRESHOLD: u8 = 7;

/// Produce an alternate path of the same length where interior
/// waypoints near severe threats are offset. The first and last
/// waypoints are never altered: they are fixed start/end commitments.
pub fn safer_route(catalog: &ThreatCatalog, waypoints: &[GeoPoint]) -> Vec<GeoPoint> {
    let last = waypoints.len().saturating_sub(1);

    waypoints
        .iter()
        .enumerate()
        .map(|(i, &point)| {
            if i == 0 || i == last {
                return point;
            }
            let severe = catalog
                .nearby(point, DEVIATION_SCAN_RADIUS_KM)
                .iter()
                .any(|m| m.record.threat_level >= DEVIATION_LEVEL_THRESHOLD);
            if severe {
                GeoPoint::new(point.lat + DEVIATION_OFFSET_DEG, point.lng + DEVIATION_OFFSET_DEG)
            } else {
                point
            }
        })
        .collect()
}
