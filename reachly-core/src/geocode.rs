use crate::geo::{haversine_km, GeoPoint};
use async_trait::async_trait;

/// Geocoding collaborator: postal code resolution plus point distance.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a postal code to coordinates, `None` if it cannot be
    /// geocoded.
    async fn coordinates(&self, postal_code: &str) -> Result<Option<GeoPoint>, crate::CoreError>;

    fn distance_km(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        haversine_km(a, b)
    }
}
