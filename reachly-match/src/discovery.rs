use crate::predicates::{categories_overlap, within_any_geofence};
use reachly_catalog::{Geofence, Influencer, Reputation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Follower-count comparator for ad-hoc discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Popularity {
    Any,
    MoreThan(i64),
    LessThan(i64),
}

impl Popularity {
    fn admits(&self, followers: i64) -> bool {
        match self {
            Popularity::Any => true,
            Popularity::MoreThan(n) => followers > *n,
            Popularity::LessThan(n) => followers < *n,
        }
    }
}

/// Reputation filter; `UpTo` admits the cumulative tier set of the target
/// reputation, `Any` bypasses the filter entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReputationFilter {
    Any,
    UpTo(Reputation),
}

/// Independently composable discovery filters. Each filter is optional and
/// order-insensitive; the geofence filter additionally requires the
/// candidate to be geocoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryCriteria {
    pub popularity: Option<Popularity>,
    pub reputation: Option<ReputationFilter>,
    /// Also admit unreviewed accounts alongside the reputation tier set.
    pub include_unreviewed: bool,
    /// Empty means no category filtering.
    pub categories: HashSet<Uuid>,
    /// Empty means no geographic filtering.
    pub geofences: Vec<Geofence>,
}

impl DiscoveryCriteria {
    fn admits(&self, influencer: &Influencer) -> bool {
        if let Some(popularity) = self.popularity {
            if !popularity.admits(influencer.followers) {
                return false;
            }
        }

        if let Some(ReputationFilter::UpTo(tier)) = self.reputation {
            let in_tier = tier.cumulative().contains(&influencer.status);
            let as_unreviewed =
                self.include_unreviewed && influencer.status == Reputation::Unreviewed;
            if !in_tier && !as_unreviewed {
                return false;
            }
        }

        if !self.categories.is_empty()
            && !categories_overlap(&self.categories, &influencer.categories)
        {
            return false;
        }

        if !self.geofences.is_empty() {
            let inside = influencer
                .location
                .map(|point| within_any_geofence(point, &self.geofences))
                .unwrap_or(false);
            if !inside {
                return false;
            }
        }

        true
    }
}

/// Filter a candidate list down to the influencers matching every
/// criterion. Pure over its inputs; no shared state.
pub fn discover_influencers(
    candidates: &[Influencer],
    criteria: &DiscoveryCriteria,
) -> Vec<Influencer> {
    candidates
        .iter()
        .filter(|i| criteria.admits(i))
        .cloned()
        .collect()
}
