use reachly_core::geo::GeoPoint;
use reachly_catalog::Geofence;
use std::collections::HashSet;
use uuid::Uuid;

/// True when the point falls inside at least one geofence.
pub fn within_any_geofence(point: GeoPoint, fences: &[Geofence]) -> bool {
    fences.iter().any(|f| f.contains(point))
}

/// True when the two category sets share at least one member.
pub fn categories_overlap(a: &HashSet<Uuid>, b: &HashSet<Uuid>) -> bool {
    !a.is_disjoint(b)
}
