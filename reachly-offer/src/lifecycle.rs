use crate::models::{Offer, OfferStatus, OfferTrack, TrackSample};
use crate::reach::{self, total_reach};
use crate::repository::OfferRepository;
use chrono::Utc;
use reachly_catalog::{Campaign, CatalogRepository, Influencer};
use reachly_core::fetch::ContentFetcher;
use reachly_core::notify::{Notifier, SmsMessage};
use reachly_core::schedule::RecheckScheduler;
use reachly_core::settings::Settings;
use reachly_core::CoreError;
use reachly_match::{
    discover_influencers, eligible_campaigns, eligible_influencers, evaluate, DiscoveryCriteria,
    Ineligibility, MatchDecision, MatchMode, PriorOffers,
};
use reachly_verify::{ExpectedContent, PostVerifier, Verdict};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum OfferError {
    #[error("Offer not found: {0}")]
    NotFound(Uuid),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid state transition from {from:?} to {to:?}")]
    InvalidTransition { from: OfferStatus, to: OfferStatus },

    #[error(transparent)]
    Store(#[from] CoreError),
}

/// Typed input for offer creation; validated before anything runs.
#[derive(Debug, Clone)]
pub struct OfferDraft {
    pub campaign_id: Uuid,
    pub influencer_id: Uuid,
    pub campaign_post_id: Uuid,
}

impl OfferDraft {
    fn validate(&self) -> Result<(), OfferError> {
        if self.campaign_id.is_nil() {
            return Err(OfferError::Validation("campaign id is required".into()));
        }
        if self.influencer_id.is_nil() {
            return Err(OfferError::Validation("influencer id is required".into()));
        }
        if self.campaign_post_id.is_nil() {
            return Err(OfferError::Validation(
                "campaign post id is required".into(),
            ));
        }
        Ok(())
    }
}

/// Result of a verification submission. Ineligible pairings destroy the
/// offer; the reason drives the caller's redirect message.
#[derive(Debug)]
pub enum SubmitOutcome {
    Verified { verdict: Verdict },
    Rejected { verdict: Verdict },
    Ineligible { reason: Ineligibility },
}

/// Drives an offer from creation through verification, tracking, and the
/// terminal completion/cancellation with budget reconciliation.
pub struct OfferService {
    catalog: Arc<dyn CatalogRepository>,
    offers: Arc<dyn OfferRepository>,
    verifier: PostVerifier,
    notifier: Arc<dyn Notifier>,
    scheduler: Arc<dyn RecheckScheduler>,
    settings: Settings,
}

impl OfferService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        offers: Arc<dyn OfferRepository>,
        fetcher: Arc<dyn ContentFetcher>,
        notifier: Arc<dyn Notifier>,
        scheduler: Arc<dyn RecheckScheduler>,
        settings: Settings,
    ) -> Self {
        let verifier = PostVerifier::new(fetcher, settings.verification.clone());
        Self {
            catalog,
            offers,
            verifier,
            notifier,
            scheduler,
            settings,
        }
    }

    /// Campaigns this influencer may browse, newest first.
    pub async fn available_campaigns(&self, influencer_id: Uuid) -> Result<Vec<Campaign>, OfferError> {
        let influencer = self.influencer(influencer_id).await?;
        let campaigns = self.catalog.active_campaigns().await?;
        let prior = self.prior_offers(influencer_id).await?;
        Ok(eligible_campaigns(&influencer, &campaigns, &prior))
    }

    /// Influencers admissible for a campaign.
    pub async fn available_influencers(
        &self,
        campaign_id: Uuid,
    ) -> Result<Vec<Influencer>, OfferError> {
        let campaign = self.campaign(campaign_id).await?;
        let candidates = self
            .catalog
            .matchable_influencers(campaign.min_score, campaign.max_score)
            .await?;

        let mut prior_by_influencer = HashMap::new();
        for candidate in &candidates {
            let prior = self.prior_offers(candidate.id).await?;
            prior_by_influencer.insert(candidate.id, prior);
        }

        Ok(eligible_influencers(
            &campaign,
            &candidates,
            &prior_by_influencer,
        ))
    }

    /// Ad-hoc influencer discovery over the verified, subscribed pool.
    pub async fn discover(
        &self,
        criteria: &DiscoveryCriteria,
    ) -> Result<Vec<Influencer>, OfferError> {
        let candidates = self.catalog.discoverable_influencers().await?;
        Ok(discover_influencers(&candidates, criteria))
    }

    /// Create a started offer for a chosen campaign post. Prices are fixed
    /// here and never recomputed; the store enforces pair uniqueness and
    /// the budget ceiling atomically.
    pub async fn create_offer(&self, draft: OfferDraft) -> Result<Offer, OfferError> {
        draft.validate()?;

        let campaign = self.campaign(draft.campaign_id).await?;
        let influencer = self.influencer(draft.influencer_id).await?;
        let post = campaign.post(draft.campaign_post_id).ok_or_else(|| {
            OfferError::Validation(format!(
                "campaign post {} does not belong to campaign {}",
                draft.campaign_post_id, campaign.id
            ))
        })?;

        let offer = Offer::new(
            campaign.id,
            influencer.id,
            post,
            campaign.payout_for(&influencer),
            campaign.sponsor_price_for(&influencer),
        );

        let offer = self.offers.create(offer).await?;
        info!(offer_id = %offer.id, campaign_id = %campaign.id, influencer_id = %influencer.id, "offer created");
        Ok(offer)
    }

    /// Re-validate the pairing, refresh the snapshot from the chosen post,
    /// notify the influencer, and run content verification. On acceptance
    /// the offer goes pending, the campaign's reach counter grows by the
    /// influencer's followers, and a deferred re-check is scheduled.
    pub async fn submit_for_verification(
        &self,
        offer_id: Uuid,
        campaign_post_id: Uuid,
    ) -> Result<SubmitOutcome, OfferError> {
        let mut offer = self.offer(offer_id).await?;
        if !offer.awaiting_verification() {
            return Err(OfferError::InvalidTransition {
                from: offer.status,
                to: OfferStatus::Pending,
            });
        }

        let mut campaign = self.campaign(offer.campaign_id).await?;
        let influencer = self.influencer(offer.influencer_id).await?;

        // The started placeholder being verified is not itself a blocking
        // prior offer, hence the active-only mode. Its own commitment from
        // creation must likewise not count against the budget check, or an
        // offer that consumed the last budget slot could never verify.
        if offer.status == OfferStatus::Started {
            campaign.committed_cents -= offer.sponsor_cents;
        }
        let prior = self.prior_offers(influencer.id).await?;
        if let MatchDecision::Ineligible(reason) =
            evaluate(&campaign, &influencer, &prior, MatchMode::ActiveOnly)
        {
            self.offers.destroy(offer.id).await?;
            info!(offer_id = %offer.id, ?reason, "pairing no longer valid, offer destroyed");
            return Ok(SubmitOutcome::Ineligible { reason });
        }

        let post = campaign.post(campaign_post_id).ok_or_else(|| {
            OfferError::Validation(format!(
                "campaign post {campaign_post_id} does not belong to campaign {}",
                campaign.id
            ))
        })?;
        offer.snapshot_from(post);
        self.offers.update(&offer).await?;

        self.send_instructions(&influencer, &offer).await;

        let expected = ExpectedContent {
            caption: offer.caption.clone(),
            image_url: offer.image_url.clone(),
        };
        let verdict = self.verifier.verify_latest(&influencer.handle, &expected).await;

        if !verdict.accepted() {
            info!(offer_id = %offer.id, ?verdict, "verification rejected");
            return Ok(SubmitOutcome::Rejected { verdict });
        }

        let offer = self.offers.mark_pending(offer.id, Utc::now()).await?;
        self.offers
            .add_campaign_reach(campaign.id, influencer.followers)
            .await?;

        let delay = Duration::from_secs(self.settings.verification.recheck_delay_hours * 3600);
        self.scheduler.schedule(offer.id, delay).await;

        info!(offer_id = %offer.id, "verification accepted, offer pending");
        Ok(SubmitOutcome::Verified { verdict })
    }

    /// Terminal completion: stamp final engagement counts from the latest
    /// track, credit the creator, debit the sponsor. Guarded to run
    /// exactly once.
    pub async fn complete(&self, offer_id: Uuid) -> Result<Offer, OfferError> {
        let offer = self.offer(offer_id).await?;
        if offer.status != OfferStatus::Pending {
            return Err(OfferError::InvalidTransition {
                from: offer.status,
                to: OfferStatus::Completed,
            });
        }

        let tracks = self.offers.tracks_for_offer(offer_id).await?;
        let final_counts = tracks
            .iter()
            .max_by_key(|t| t.tracked_at)
            .map(|t| t.sample());

        let offer = self
            .offers
            .apply_completion(offer_id, Utc::now().date_naive(), final_counts)
            .await?;
        info!(offer_id = %offer.id, payout_cents = offer.payout_cents, "offer completed");
        Ok(offer)
    }

    /// Cancel from any non-terminal state. No money moves.
    pub async fn cancel(&self, offer_id: Uuid) -> Result<Offer, OfferError> {
        let offer = self.offer(offer_id).await?;
        if matches!(offer.status, OfferStatus::Completed | OfferStatus::Cancelled) {
            return Err(OfferError::InvalidTransition {
                from: offer.status,
                to: OfferStatus::Cancelled,
            });
        }

        let offer = self.offers.cancel(offer_id, Utc::now().date_naive()).await?;
        info!(offer_id = %offer.id, "offer cancelled");
        Ok(offer)
    }

    /// Append an engagement sample. Receiving one for a started or
    /// cancelled offer counts as implicit reconfirmation, forcing the
    /// pending transition first.
    pub async fn record_track(
        &self,
        offer_id: Uuid,
        sample: TrackSample,
    ) -> Result<Offer, OfferError> {
        let mut offer = self.offer(offer_id).await?;

        if offer.awaiting_verification() {
            offer = self.offers.mark_pending(offer.id, Utc::now()).await?;
        }

        let track = OfferTrack::new(offer.id, sample, Utc::now());
        self.offers.append_track(track).await?;

        offer.mirror(&sample);
        self.offers.update(&offer).await?;
        Ok(offer)
    }

    /// Distinct calendar dates with a sample since the offer started.
    pub async fn tracked_days(&self, offer_id: Uuid) -> Result<usize, OfferError> {
        let offer = self.offer(offer_id).await?;
        let tracks = self.offers.tracks_for_offer(offer_id).await?;
        Ok(reach::tracked_days(&tracks, offer.start_date))
    }

    /// Follower reach of a campaign's offers, with the cancelled weight
    /// passed explicitly.
    pub async fn campaign_reach(
        &self,
        campaign_id: Uuid,
        cancelled_rate: f64,
    ) -> Result<i64, OfferError> {
        let entries = self.offers.reach_entries(campaign_id).await?;
        Ok(total_reach(&entries, cancelled_rate))
    }

    /// Deferred re-validation of sustained compliance, run by the recheck
    /// worker about a day after acceptance. Skips silently when the offer
    /// is gone or no longer pending; cancels on a failed re-verification.
    pub async fn recheck(&self, offer_id: Uuid) -> Result<(), OfferError> {
        let offer = match self.offers.offer(offer_id).await? {
            Some(offer) => offer,
            None => {
                debug!(%offer_id, "recheck skipped, offer gone");
                return Ok(());
            }
        };
        if offer.status != OfferStatus::Pending {
            debug!(%offer_id, status = ?offer.status, "recheck skipped, offer not pending");
            return Ok(());
        }

        let influencer = match self.catalog.influencer(offer.influencer_id).await? {
            Some(influencer) => influencer,
            None => {
                warn!(%offer_id, "recheck skipped, influencer gone");
                return Ok(());
            }
        };

        let expected = ExpectedContent {
            caption: offer.caption.clone(),
            image_url: offer.image_url.clone(),
        };
        let verdict = self.verifier.verify_latest(&influencer.handle, &expected).await;

        if !verdict.accepted() {
            warn!(%offer_id, ?verdict, "recheck failed, cancelling offer");
            self.offers.cancel(offer_id, Utc::now().date_naive()).await?;
        }
        Ok(())
    }

    /// Two-part SMS with the image and caption to reproduce. Notification
    /// failures degrade gracefully; they never roll back offer state.
    async fn send_instructions(&self, influencer: &Influencer, offer: &Offer) {
        let Some(phone) = influencer.phone.as_deref() else {
            warn!(influencer_id = %influencer.id, "no phone on file, skipping instructions");
            return;
        };

        let instructions = SmsMessage {
            to: phone.to_string(),
            body: "To complete verification of your accepted post, publish this image \
                   and caption to your handle. The caption follows in a separate message."
                .to_string(),
            media_url: Some(offer.image_url.clone()),
        };
        let outcome = self.notifier.send(&instructions).await;
        if !outcome.sent() {
            warn!(influencer_id = %influencer.id, ?outcome, "instruction SMS failed");
            return;
        }

        let caption = SmsMessage {
            to: phone.to_string(),
            body: format!(
                "{} {}",
                offer.caption, self.settings.verification.caption_suffix
            ),
            media_url: None,
        };
        let outcome = self.notifier.send(&caption).await;
        if !outcome.sent() {
            warn!(influencer_id = %influencer.id, ?outcome, "caption SMS failed");
        }
    }

    /// Campaign ids of the influencer's existing offers, split by liveness.
    async fn prior_offers(&self, influencer_id: Uuid) -> Result<PriorOffers, OfferError> {
        let offers = self.offers.offers_for_influencer(influencer_id).await?;
        let mut prior = PriorOffers::default();
        for offer in offers {
            prior.any.insert(offer.campaign_id);
            if offer.is_active() {
                prior.active.insert(offer.campaign_id);
            }
        }
        Ok(prior)
    }

    async fn offer(&self, id: Uuid) -> Result<Offer, OfferError> {
        self.offers
            .offer(id)
            .await?
            .ok_or(OfferError::NotFound(id))
    }

    async fn campaign(&self, id: Uuid) -> Result<Campaign, OfferError> {
        self.catalog
            .campaign(id)
            .await?
            .ok_or_else(|| OfferError::Validation(format!("campaign {id} does not exist")))
    }

    async fn influencer(&self, id: Uuid) -> Result<Influencer, OfferError> {
        self.catalog
            .influencer(id)
            .await?
            .ok_or_else(|| OfferError::Validation(format!("influencer {id} does not exist")))
    }
}
