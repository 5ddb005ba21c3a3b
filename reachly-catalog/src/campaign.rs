use crate::influencer::{Influencer, Reputation};
use crate::location::Geofence;
use crate::pricing::ScorePricing;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Active,
    Paused,
}

/// One publishable unit of a campaign: the caption and image an influencer
/// is expected to reproduce. Offers snapshot from the chosen post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignPost {
    pub id: Uuid,
    pub title: String,
    pub caption: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub title: String,
    pub status: CampaignStatus,
    /// Inclusive adjusted-score range of admissible influencers.
    pub min_score: f64,
    pub max_score: f64,
    /// Flat price overriding score-based pricing when set.
    pub fixed_price_cents: Option<i64>,
    /// Reputation tiers this sponsor refuses to transact with.
    pub exclude: Vec<Reputation>,
    /// Empty means no geographic targeting.
    pub locations: Vec<Geofence>,
    /// Empty means no interest targeting.
    pub categories: HashSet<Uuid>,
    pub budget_cents: i64,
    /// Sponsor amounts reserved by offers not yet completed or released.
    pub committed_cents: i64,
    /// Cumulative follower reach across verified offers.
    pub follower_reach: i64,
    pub posts: Vec<CampaignPost>,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    pub fn is_paused(&self) -> bool {
        self.status == CampaignStatus::Paused
    }

    /// Budget still open for new offers.
    pub fn available_budget_cents(&self) -> i64 {
        self.budget_cents - self.committed_cents
    }

    /// What this campaign would charge the sponsor for this influencer.
    pub fn sponsor_price_for(&self, influencer: &Influencer) -> i64 {
        self.fixed_price_cents
            .unwrap_or_else(|| ScorePricing::sponsor_price_cents(influencer.adjusted_score))
    }

    /// What this campaign would pay out to this influencer on completion.
    pub fn payout_for(&self, influencer: &Influencer) -> i64 {
        self.fixed_price_cents
            .unwrap_or_else(|| ScorePricing::influencer_price_cents(influencer.adjusted_score))
    }

    pub fn post(&self, post_id: Uuid) -> Option<&CampaignPost> {
        self.posts.iter().find(|p| p.id == post_id)
    }
}
