use crate::campaign::Campaign;
use crate::influencer::Influencer;
use async_trait::async_trait;
use reachly_core::CoreResult;
use uuid::Uuid;

/// Repository trait for campaign and influencer data access.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn campaign(&self, id: Uuid) -> CoreResult<Option<Campaign>>;

    async fn influencer(&self, id: Uuid) -> CoreResult<Option<Influencer>>;

    async fn upsert_campaign(&self, campaign: Campaign) -> CoreResult<()>;

    async fn upsert_influencer(&self, influencer: Influencer) -> CoreResult<()>;

    /// Campaigns currently open for matching.
    async fn active_campaigns(&self) -> CoreResult<Vec<Campaign>>;

    /// Verified, subscribed influencers whose adjusted score falls in the
    /// inclusive range. The cheap narrowing phase of candidate search.
    async fn matchable_influencers(
        &self,
        min_score: f64,
        max_score: f64,
    ) -> CoreResult<Vec<Influencer>>;

    /// All verified, subscribed influencers, for ad-hoc discovery.
    async fn discoverable_influencers(&self) -> CoreResult<Vec<Influencer>>;
}
