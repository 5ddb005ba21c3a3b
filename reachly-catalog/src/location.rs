use reachly_core::geo::{haversine_km, GeoPoint};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A geofence used for campaign targeting: a reference point plus radius.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geofence {
    pub id: Uuid,
    pub name: String,
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl Geofence {
    pub fn new(name: impl Into<String>, center: GeoPoint, radius_km: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            center,
            radius_km,
        }
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        haversine_km(self.center, point) < self.radius_km
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_point_inside_radius() {
        let fence = Geofence::new("Manhattan", GeoPoint::new(40.7831, -73.9712), 15.0);
        // Downtown Brooklyn, roughly 12 km away
        assert!(fence.contains(GeoPoint::new(40.6782, -73.9442)));
    }

    #[test]
    fn excludes_point_outside_radius() {
        let fence = Geofence::new("Manhattan", GeoPoint::new(40.7831, -73.9712), 10.0);
        // Philadelphia
        assert!(!fence.contains(GeoPoint::new(39.9526, -75.1652)));
    }
}
