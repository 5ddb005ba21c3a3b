use crate::models::{Offer, OfferTrack, TrackSample};
use crate::reach::ReachEntry;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reachly_core::CoreResult;
use uuid::Uuid;

/// Repository trait for offer data access. The money invariants live at
/// this boundary: pair uniqueness and the budget ceiling are checked inside
/// `create`, and completion applies its money movement as one unit.
#[async_trait]
pub trait OfferRepository: Send + Sync {
    async fn offer(&self, id: Uuid) -> CoreResult<Option<Offer>>;

    async fn offers_for_influencer(&self, influencer_id: Uuid) -> CoreResult<Vec<Offer>>;

    async fn offers_for_campaign(&self, campaign_id: Uuid) -> CoreResult<Vec<Offer>>;

    /// Atomic check-and-create. Fails with `Conflict` when a non-cancelled
    /// offer already exists for the (campaign, influencer) pair, and with
    /// `Validation` when the sponsor amount exceeds the campaign's
    /// available budget. On success the sponsor amount is committed
    /// against the campaign.
    async fn create(&self, offer: Offer) -> CoreResult<Offer>;

    /// Persist snapshot/status changes that move no money.
    async fn update(&self, offer: &Offer) -> CoreResult<()>;

    /// Pending transition (verification accepted or implicit
    /// reconfirmation): restart the clock, clear the end date, and
    /// re-commit the sponsor amount if the offer was cancelled and had
    /// released it. Fails with `Conflict` for completed offers.
    async fn mark_pending(&self, id: Uuid, now: DateTime<Utc>) -> CoreResult<Offer>;

    /// Remove an offer that never became a committed entity, releasing its
    /// budget commitment.
    async fn destroy(&self, id: Uuid) -> CoreResult<()>;

    /// Cancel: stamp status and end date, release the commitment. No
    /// balance or budget movement.
    async fn cancel(&self, id: Uuid, end_date: NaiveDate) -> CoreResult<Offer>;

    /// Exactly-once completion: stamp final counts and end date, debit the
    /// campaign budget by the offer's fixed sponsor amount and credit the
    /// influencer balance by its fixed payout, all as a single unit of
    /// work. Fails with `Conflict` unless the offer is pending.
    async fn apply_completion(
        &self,
        id: Uuid,
        end_date: NaiveDate,
        final_counts: Option<TrackSample>,
    ) -> CoreResult<Offer>;

    async fn append_track(&self, track: OfferTrack) -> CoreResult<()>;

    async fn tracks_for_offer(&self, offer_id: Uuid) -> CoreResult<Vec<OfferTrack>>;

    /// Bump the campaign's cumulative follower-reach counter.
    async fn add_campaign_reach(&self, campaign_id: Uuid, followers: i64) -> CoreResult<()>;

    /// Follower/status pairs for the campaign's offers, for the reach
    /// aggregate.
    async fn reach_entries(&self, campaign_id: Uuid) -> CoreResult<Vec<ReachEntry>>;
}
