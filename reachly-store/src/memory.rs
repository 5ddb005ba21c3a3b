use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reachly_catalog::{Campaign, CampaignStatus, CatalogRepository, Influencer};
use reachly_core::{CoreError, CoreResult};
use reachly_offer::{Offer, OfferRepository, OfferStatus, OfferTrack, ReachEntry, TrackSample};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::error;
use uuid::Uuid;

#[derive(Default)]
struct State {
    campaigns: HashMap<Uuid, Campaign>,
    influencers: HashMap<Uuid, Influencer>,
    offers: HashMap<Uuid, Offer>,
    tracks: HashMap<Uuid, Vec<OfferTrack>>,
}

/// In-memory store implementing the repository boundary. One lock covers
/// all maps, which is what makes check-and-create and completion atomic.
#[derive(Default)]
pub struct InMemoryDirectory {
    inner: Mutex<State>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> CoreResult<MutexGuard<'_, State>> {
        self.inner
            .lock()
            .map_err(|_| CoreError::Internal("directory lock poisoned".to_string()))
    }
}

#[async_trait]
impl CatalogRepository for InMemoryDirectory {
    async fn campaign(&self, id: Uuid) -> CoreResult<Option<Campaign>> {
        Ok(self.state()?.campaigns.get(&id).cloned())
    }

    async fn influencer(&self, id: Uuid) -> CoreResult<Option<Influencer>> {
        Ok(self.state()?.influencers.get(&id).cloned())
    }

    async fn upsert_campaign(&self, campaign: Campaign) -> CoreResult<()> {
        let mut state = self.state()?;
        let mut campaign = campaign;
        // The offer side owns the ledger fields; a catalog write must not
        // clobber commitments or the reach counter.
        if let Some(existing) = state.campaigns.get(&campaign.id) {
            campaign.committed_cents = existing.committed_cents;
            campaign.follower_reach = existing.follower_reach;
        }
        state.campaigns.insert(campaign.id, campaign);
        Ok(())
    }

    async fn upsert_influencer(&self, influencer: Influencer) -> CoreResult<()> {
        self.state()?.influencers.insert(influencer.id, influencer);
        Ok(())
    }

    async fn active_campaigns(&self) -> CoreResult<Vec<Campaign>> {
        Ok(self
            .state()?
            .campaigns
            .values()
            .filter(|c| c.status == CampaignStatus::Active)
            .cloned()
            .collect())
    }

    async fn matchable_influencers(
        &self,
        min_score: f64,
        max_score: f64,
    ) -> CoreResult<Vec<Influencer>> {
        Ok(self
            .state()?
            .influencers
            .values()
            .filter(|i| i.matchable())
            .filter(|i| i.adjusted_score >= min_score && i.adjusted_score <= max_score)
            .cloned()
            .collect())
    }

    async fn discoverable_influencers(&self) -> CoreResult<Vec<Influencer>> {
        Ok(self
            .state()?
            .influencers
            .values()
            .filter(|i| i.matchable())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OfferRepository for InMemoryDirectory {
    async fn offer(&self, id: Uuid) -> CoreResult<Option<Offer>> {
        Ok(self.state()?.offers.get(&id).cloned())
    }

    async fn offers_for_influencer(&self, influencer_id: Uuid) -> CoreResult<Vec<Offer>> {
        Ok(self
            .state()?
            .offers
            .values()
            .filter(|o| o.influencer_id == influencer_id)
            .cloned()
            .collect())
    }

    async fn offers_for_campaign(&self, campaign_id: Uuid) -> CoreResult<Vec<Offer>> {
        Ok(self
            .state()?
            .offers
            .values()
            .filter(|o| o.campaign_id == campaign_id)
            .cloned()
            .collect())
    }

    async fn create(&self, offer: Offer) -> CoreResult<Offer> {
        let mut state = self.state()?;

        let duplicate = state.offers.values().any(|o| {
            o.campaign_id == offer.campaign_id
                && o.influencer_id == offer.influencer_id
                && o.status != OfferStatus::Cancelled
        });
        if duplicate {
            error!(campaign_id = %offer.campaign_id, influencer_id = %offer.influencer_id,
                   "duplicate offer for pair rejected");
            return Err(CoreError::Conflict(
                "an offer already exists for this campaign and influencer".to_string(),
            ));
        }

        let campaign = state
            .campaigns
            .get_mut(&offer.campaign_id)
            .ok_or_else(|| CoreError::NotFound(format!("campaign {}", offer.campaign_id)))?;

        if campaign.available_budget_cents() < offer.sponsor_cents {
            return Err(CoreError::Validation(
                "sponsor amount exceeds the campaign's available budget".to_string(),
            ));
        }
        campaign.committed_cents += offer.sponsor_cents;

        state.offers.insert(offer.id, offer.clone());
        Ok(offer)
    }

    async fn update(&self, offer: &Offer) -> CoreResult<()> {
        let mut state = self.state()?;
        if !state.offers.contains_key(&offer.id) {
            return Err(CoreError::NotFound(format!("offer {}", offer.id)));
        }
        state.offers.insert(offer.id, offer.clone());
        Ok(())
    }

    async fn mark_pending(&self, id: Uuid, now: DateTime<Utc>) -> CoreResult<Offer> {
        let mut state = self.state()?;
        let offer = state
            .offers
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("offer {id}")))?;

        if offer.status == OfferStatus::Completed {
            return Err(CoreError::Conflict(format!(
                "offer {id} is already completed"
            )));
        }

        // A cancelled offer released its commitment; reconfirming it takes
        // the commitment back so completion accounting stays balanced.
        if offer.status == OfferStatus::Cancelled {
            if let Some(campaign) = state.campaigns.get_mut(&offer.campaign_id) {
                campaign.committed_cents += offer.sponsor_cents;
            }
        }

        let offer = state
            .offers
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("offer {id}")))?;
        offer.mark_pending(now);
        Ok(offer.clone())
    }

    async fn destroy(&self, id: Uuid) -> CoreResult<()> {
        let mut state = self.state()?;
        let offer = state
            .offers
            .remove(&id)
            .ok_or_else(|| CoreError::NotFound(format!("offer {id}")))?;
        state.tracks.remove(&id);

        // Started and pending offers still hold a budget commitment.
        if matches!(offer.status, OfferStatus::Started | OfferStatus::Pending) {
            if let Some(campaign) = state.campaigns.get_mut(&offer.campaign_id) {
                campaign.committed_cents -= offer.sponsor_cents;
            }
        }
        Ok(())
    }

    async fn cancel(&self, id: Uuid, end_date: NaiveDate) -> CoreResult<Offer> {
        let mut state = self.state()?;
        let offer = state
            .offers
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("offer {id}")))?;

        if matches!(offer.status, OfferStatus::Completed | OfferStatus::Cancelled) {
            return Err(CoreError::Conflict(format!(
                "offer {id} is already terminal"
            )));
        }

        if let Some(campaign) = state.campaigns.get_mut(&offer.campaign_id) {
            campaign.committed_cents -= offer.sponsor_cents;
        }

        let offer = state
            .offers
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("offer {id}")))?;
        offer.status = OfferStatus::Cancelled;
        offer.end_date = Some(end_date);
        Ok(offer.clone())
    }

    async fn apply_completion(
        &self,
        id: Uuid,
        end_date: NaiveDate,
        final_counts: Option<TrackSample>,
    ) -> CoreResult<Offer> {
        let mut state = self.state()?;
        let offer = state
            .offers
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("offer {id}")))?;

        if offer.status != OfferStatus::Pending {
            return Err(CoreError::Conflict(format!(
                "offer {id} is not pending, refusing to complete"
            )));
        }

        // Budget debit and balance credit are one unit of work under the
        // same lock: either both apply or neither.
        {
            let campaign = state
                .campaigns
                .get_mut(&offer.campaign_id)
                .ok_or_else(|| CoreError::NotFound(format!("campaign {}", offer.campaign_id)))?;
            campaign.budget_cents -= offer.sponsor_cents;
            campaign.committed_cents -= offer.sponsor_cents;
        }
        {
            let influencer = state
                .influencers
                .get_mut(&offer.influencer_id)
                .ok_or_else(|| {
                    CoreError::NotFound(format!("influencer {}", offer.influencer_id))
                })?;
            influencer.balance_cents += offer.payout_cents;
        }

        let offer = state
            .offers
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("offer {id}")))?;
        offer.status = OfferStatus::Completed;
        offer.end_date = Some(end_date);
        if let Some(sample) = final_counts {
            offer.mirror(&sample);
        }
        Ok(offer.clone())
    }

    async fn append_track(&self, track: OfferTrack) -> CoreResult<()> {
        let mut state = self.state()?;
        if !state.offers.contains_key(&track.offer_id) {
            return Err(CoreError::NotFound(format!("offer {}", track.offer_id)));
        }
        state.tracks.entry(track.offer_id).or_default().push(track);
        Ok(())
    }

    async fn tracks_for_offer(&self, offer_id: Uuid) -> CoreResult<Vec<OfferTrack>> {
        Ok(self
            .state()?
            .tracks
            .get(&offer_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_campaign_reach(&self, campaign_id: Uuid, followers: i64) -> CoreResult<()> {
        let mut state = self.state()?;
        let campaign = state
            .campaigns
            .get_mut(&campaign_id)
            .ok_or_else(|| CoreError::NotFound(format!("campaign {campaign_id}")))?;
        campaign.follower_reach += followers;
        Ok(())
    }

    async fn reach_entries(&self, campaign_id: Uuid) -> CoreResult<Vec<ReachEntry>> {
        let state = self.state()?;
        Ok(state
            .offers
            .values()
            .filter(|o| o.campaign_id == campaign_id)
            .map(|o| ReachEntry {
                influencer_id: o.influencer_id,
                followers: state
                    .influencers
                    .get(&o.influencer_id)
                    .map(|i| i.followers)
                    .unwrap_or(0),
                status: o.status,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reachly_catalog::{CampaignPost, Reputation};
    use std::collections::HashSet;

    fn campaign(budget_cents: i64) -> Campaign {
        Campaign {
            id: Uuid::new_v4(),
            title: "Launch".to_string(),
            status: CampaignStatus::Active,
            min_score: 0.0,
            max_score: 100.0,
            fixed_price_cents: Some(8_000),
            exclude: vec![],
            locations: vec![],
            categories: HashSet::new(),
            budget_cents,
            committed_cents: 0,
            follower_reach: 0,
            posts: vec![post()],
            created_at: Utc::now(),
        }
    }

    fn post() -> CampaignPost {
        CampaignPost {
            id: Uuid::new_v4(),
            title: "Post".to_string(),
            caption: "caption".to_string(),
            image_url: "https://cdn.example/a.png".to_string(),
        }
    }

    fn influencer() -> Influencer {
        Influencer {
            id: Uuid::new_v4(),
            handle: "creator".to_string(),
            phone: None,
            adjusted_score: 30.0,
            status: Reputation::Safe,
            location: None,
            postal_code: None,
            categories: HashSet::new(),
            followers: 1_000,
            balance_cents: 0,
            verified: true,
            subscribed: true,
            created_at: Utc::now(),
        }
    }

    fn offer_for(c: &Campaign, i: &Influencer) -> Offer {
        Offer::new(c.id, i.id, &c.posts[0], 5_000, 8_000)
    }

    async fn seeded(budget_cents: i64) -> (InMemoryDirectory, Campaign, Influencer) {
        let dir = InMemoryDirectory::new();
        let c = campaign(budget_cents);
        let i = influencer();
        dir.upsert_campaign(c.clone()).await.unwrap();
        dir.upsert_influencer(i.clone()).await.unwrap();
        (dir, c, i)
    }

    #[tokio::test]
    async fn duplicate_pair_creation_conflicts() {
        let (dir, c, i) = seeded(100_000).await;
        dir.create(offer_for(&c, &i)).await.unwrap();

        let err = dir.create(offer_for(&c, &i)).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn cancelled_prior_offer_does_not_block_creation() {
        let (dir, c, i) = seeded(100_000).await;
        let first = dir.create(offer_for(&c, &i)).await.unwrap();
        dir.cancel(first.id, Utc::now().date_naive()).await.unwrap();

        assert!(dir.create(offer_for(&c, &i)).await.is_ok());
    }

    #[tokio::test]
    async fn creation_respects_the_available_budget() {
        let (dir, c, i) = seeded(10_000).await;
        dir.create(offer_for(&c, &i)).await.unwrap(); // commits 8_000

        let other = influencer();
        dir.upsert_influencer(other.clone()).await.unwrap();
        let err = dir.create(offer_for(&c, &other)).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn cancel_releases_the_commitment_without_moving_money() {
        let (dir, c, i) = seeded(100_000).await;
        let offer = dir.create(offer_for(&c, &i)).await.unwrap();

        dir.cancel(offer.id, Utc::now().date_naive()).await.unwrap();

        let c = dir.campaign(c.id).await.unwrap().unwrap();
        assert_eq!(c.budget_cents, 100_000);
        assert_eq!(c.committed_cents, 0);
        let i = dir.influencer(i.id).await.unwrap().unwrap();
        assert_eq!(i.balance_cents, 0);
    }

    #[tokio::test]
    async fn completion_moves_money_exactly_once() {
        let (dir, c, i) = seeded(100_000).await;
        let offer = dir.create(offer_for(&c, &i)).await.unwrap();
        let offer = dir.mark_pending(offer.id, Utc::now()).await.unwrap();

        let today = Utc::now().date_naive();
        let done = dir.apply_completion(offer.id, today, None).await.unwrap();
        assert_eq!(done.status, OfferStatus::Completed);
        assert_eq!(done.end_date, Some(today));

        let c = dir.campaign(c.id).await.unwrap().unwrap();
        assert_eq!(c.budget_cents, 92_000);
        assert_eq!(c.committed_cents, 0);
        let i = dir.influencer(i.id).await.unwrap().unwrap();
        assert_eq!(i.balance_cents, 5_000);

        // A second completion is refused and moves nothing.
        let err = dir.apply_completion(offer.id, today, None).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        let c = dir.campaign(done.campaign_id).await.unwrap().unwrap();
        assert_eq!(c.budget_cents, 92_000);
    }

    #[tokio::test]
    async fn reconfirming_a_cancelled_offer_takes_the_commitment_back() {
        let (dir, c, i) = seeded(100_000).await;
        let offer = dir.create(offer_for(&c, &i)).await.unwrap();
        dir.cancel(offer.id, Utc::now().date_naive()).await.unwrap();

        let offer = dir.mark_pending(offer.id, Utc::now()).await.unwrap();
        assert_eq!(offer.status, OfferStatus::Pending);
        assert_eq!(offer.end_date, None);

        let c = dir.campaign(c.id).await.unwrap().unwrap();
        assert_eq!(c.committed_cents, 8_000);

        // Completing it afterwards leaves the books balanced.
        dir.apply_completion(offer.id, Utc::now().date_naive(), None)
            .await
            .unwrap();
        let c = dir.campaign(c.id).await.unwrap().unwrap();
        assert_eq!(c.budget_cents, 92_000);
        assert_eq!(c.committed_cents, 0);
    }

    #[tokio::test]
    async fn completion_requires_a_pending_offer() {
        let (dir, c, i) = seeded(100_000).await;
        let offer = dir.create(offer_for(&c, &i)).await.unwrap();

        let err = dir
            .apply_completion(offer.id, Utc::now().date_naive(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn destroy_removes_the_offer_and_releases_budget() {
        let (dir, c, i) = seeded(100_000).await;
        let offer = dir.create(offer_for(&c, &i)).await.unwrap();

        dir.destroy(offer.id).await.unwrap();
        assert!(dir.offer(offer.id).await.unwrap().is_none());
        let c = dir.campaign(c.id).await.unwrap().unwrap();
        assert_eq!(c.committed_cents, 0);
    }

    #[tokio::test]
    async fn catalog_writes_do_not_clobber_the_ledger() {
        let (dir, c, i) = seeded(100_000).await;
        dir.create(offer_for(&c, &i)).await.unwrap();

        // A stale catalog snapshot still carries committed_cents = 0.
        let mut edited = c.clone();
        edited.title = "Launch, renamed".to_string();
        dir.upsert_campaign(edited).await.unwrap();

        let live = dir.campaign(c.id).await.unwrap().unwrap();
        assert_eq!(live.title, "Launch, renamed");
        assert_eq!(live.committed_cents, 8_000);
    }

    #[tokio::test]
    async fn reach_entries_join_follower_counts() {
        let (dir, c, i) = seeded(100_000).await;
        dir.create(offer_for(&c, &i)).await.unwrap();

        let entries = dir.reach_entries(c.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].followers, 1_000);
        assert_eq!(entries[0].status, OfferStatus::Started);
    }
}
