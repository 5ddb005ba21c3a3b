use reachly_core::geo::GeoPoint;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Reputation tier of a creator account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Reputation {
    Unreviewed,
    Safe,
    Appropriate,
    NonPc,
}

impl Reputation {
    /// Tiers admitted when discovering by a target reputation. Tiers are
    /// cumulative: unreviewed ⊂ safe ⊂ appropriate ⊂ non-pc.
    pub fn cumulative(self) -> &'static [Reputation] {
        match self {
            Reputation::Unreviewed => &[Reputation::Unreviewed],
            Reputation::Safe => &[Reputation::Safe],
            Reputation::Appropriate => &[Reputation::Safe, Reputation::Appropriate],
            Reputation::NonPc => {
                &[Reputation::Safe, Reputation::Appropriate, Reputation::NonPc]
            }
        }
    }
}

/// An interest tag used for many-to-many matching between campaigns and
/// influencers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Influencer {
    pub id: Uuid,
    pub handle: String,
    pub phone: Option<String>,
    /// Composite reputation/popularity metric; the primary eligibility and
    /// pricing dimension.
    pub adjusted_score: f64,
    pub status: Reputation,
    pub location: Option<GeoPoint>,
    pub postal_code: Option<String>,
    pub categories: HashSet<Uuid>,
    pub followers: i64,
    pub balance_cents: i64,
    pub verified: bool,
    pub subscribed: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Influencer {
    pub fn geocoded(&self) -> bool {
        self.location.is_some()
    }

    /// Candidates surfaced to sponsors must be verified and subscribed.
    pub fn matchable(&self) -> bool {
        self.verified && self.subscribed
    }

    /// Resolve the postal code into coordinates if the account is not
    /// geocoded yet. Returns whether a location is available afterwards.
    pub async fn ensure_geocoded(
        &mut self,
        geocoder: &dyn reachly_core::geocode::Geocoder,
    ) -> reachly_core::CoreResult<bool> {
        if self.location.is_some() {
            return Ok(true);
        }
        let Some(postal_code) = self.postal_code.as_deref() else {
            return Ok(false);
        };
        self.location = geocoder.coordinates(postal_code).await?;
        Ok(self.location.is_some())
    }
}
