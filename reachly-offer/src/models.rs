use chrono::{DateTime, NaiveDate, Utc};
use reachly_catalog::CampaignPost;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Offer status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferStatus {
    Started,
    Pending,
    Completed,
    Cancelled,
}

impl OfferStatus {
    /// Pending and completed offers count as committed engagements.
    pub fn is_active(self) -> bool {
        matches!(self, OfferStatus::Pending | OfferStatus::Completed)
    }
}

/// The binding of one influencer to one campaign for one campaign post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub influencer_id: Uuid,
    pub campaign_post_id: Uuid,
    pub status: OfferStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<NaiveDate>,
    /// Caption/image snapshot from the chosen campaign post, refreshed
    /// whenever the post reference changes.
    pub caption: String,
    pub image_url: String,
    /// Creator payout, fixed at creation and never recomputed.
    pub payout_cents: i64,
    /// Sponsor charge, fixed at creation and never recomputed.
    pub sponsor_cents: i64,
    /// Mirror of the latest tracking sample.
    pub likes: Option<i64>,
    pub comments: Option<i64>,
    pub posts: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Offer {
    pub fn new(
        campaign_id: Uuid,
        influencer_id: Uuid,
        post: &CampaignPost,
        payout_cents: i64,
        sponsor_cents: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            campaign_id,
            influencer_id,
            campaign_post_id: post.id,
            status: OfferStatus::Started,
            start_date: now,
            end_date: None,
            caption: post.caption.clone(),
            image_url: post.image_url.clone(),
            payout_cents,
            sponsor_cents,
            likes: None,
            comments: None,
            posts: None,
            created_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Started and cancelled offers may (re)enter verification.
    pub fn awaiting_verification(&self) -> bool {
        matches!(self.status, OfferStatus::Started | OfferStatus::Cancelled)
    }

    /// Resubmission reset: pending again, clock restarted, end date
    /// cleared.
    pub fn mark_pending(&mut self, now: DateTime<Utc>) {
        self.status = OfferStatus::Pending;
        self.start_date = now;
        self.end_date = None;
    }

    /// Re-snapshot caption and image from a newly chosen campaign post.
    pub fn snapshot_from(&mut self, post: &CampaignPost) {
        self.campaign_post_id = post.id;
        self.caption = post.caption.clone();
        self.image_url = post.image_url.clone();
    }

    /// Copy a tracking sample's counts onto the offer.
    pub fn mirror(&mut self, sample: &TrackSample) {
        self.likes = Some(sample.likes);
        self.comments = Some(sample.comments);
        self.posts = Some(sample.posts);
    }
}

/// One engagement measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSample {
    pub likes: i64,
    pub comments: i64,
    pub posts: i64,
}

/// An immutable timestamped engagement sample belonging to one offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferTrack {
    pub id: Uuid,
    pub offer_id: Uuid,
    pub likes: i64,
    pub comments: i64,
    pub posts: i64,
    pub tracked_at: DateTime<Utc>,
}

impl OfferTrack {
    pub fn new(offer_id: Uuid, sample: TrackSample, tracked_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            offer_id,
            likes: sample.likes,
            comments: sample.comments,
            posts: sample.posts,
            tracked_at,
        }
    }

    pub fn sample(&self) -> TrackSample {
        TrackSample {
            likes: self.likes,
            comments: self.comments,
            posts: self.posts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(caption: &str) -> CampaignPost {
        CampaignPost {
            id: Uuid::new_v4(),
            title: "Post".to_string(),
            caption: caption.to_string(),
            image_url: "https://cdn.example/a.png".to_string(),
        }
    }

    fn offer() -> Offer {
        Offer::new(Uuid::new_v4(), Uuid::new_v4(), &post("first"), 5_000, 8_000)
    }

    #[test]
    fn new_offers_start_unverified() {
        let o = offer();
        assert_eq!(o.status, OfferStatus::Started);
        assert!(o.awaiting_verification());
        assert!(!o.is_active());
        assert_eq!(o.caption, "first");
    }

    #[test]
    fn pending_reset_clears_end_date() {
        let mut o = offer();
        o.end_date = Some(Utc::now().date_naive());
        let now = Utc::now();
        o.mark_pending(now);
        assert_eq!(o.status, OfferStatus::Pending);
        assert_eq!(o.start_date, now);
        assert!(o.end_date.is_none());
        assert!(o.is_active());
    }

    #[test]
    fn snapshot_follows_the_chosen_post() {
        let mut o = offer();
        let other = post("second");
        o.snapshot_from(&other);
        assert_eq!(o.campaign_post_id, other.id);
        assert_eq!(o.caption, "second");
    }

    #[test]
    fn cancelled_offers_may_reverify() {
        let mut o = offer();
        o.status = OfferStatus::Cancelled;
        assert!(o.awaiting_verification());
        o.status = OfferStatus::Completed;
        assert!(!o.awaiting_verification());
    }
}
