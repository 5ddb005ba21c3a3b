use crate::predicates::{categories_overlap, within_any_geofence};
use reachly_catalog::{Campaign, Influencer};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Which prior offers of the influencer block a new match.
///
/// `Default` is used while browsing: any prior offer for the campaign
/// blocks. `ActiveOnly` is used right before committing to content
/// verification: only pending/completed offers block, so a cancelled prior
/// offer (or the started placeholder being verified) does not permanently
/// lock the pair out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Default,
    ActiveOnly,
}

/// Campaign ids of an influencer's existing offers, split by liveness.
#[derive(Debug, Clone, Default)]
pub struct PriorOffers {
    /// Campaigns with any offer, regardless of status.
    pub any: HashSet<Uuid>,
    /// Campaigns with a pending or completed offer.
    pub active: HashSet<Uuid>,
}

impl PriorOffers {
    fn blocks(&self, campaign_id: Uuid, mode: MatchMode) -> bool {
        match mode {
            MatchMode::Default => self.any.contains(&campaign_id),
            MatchMode::ActiveOnly => self.active.contains(&campaign_id),
        }
    }
}

/// Why a pair failed eligibility. Drives the user-visible message; never
/// raised as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ineligibility {
    CampaignPaused,
    ExistingOffer,
    ScoreOutOfRange,
    StatusExcluded,
    OutsideGeofence,
    NoCategoryOverlap,
    BudgetExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDecision {
    Eligible,
    Ineligible(Ineligibility),
}

impl MatchDecision {
    pub fn is_eligible(&self) -> bool {
        matches!(self, MatchDecision::Eligible)
    }
}

/// Full per-pair eligibility predicate. Checks run in a fixed order,
/// cheapest first, short-circuiting on the first failure; the order only
/// affects cost, not the final decision.
pub fn evaluate(
    campaign: &Campaign,
    influencer: &Influencer,
    prior: &PriorOffers,
    mode: MatchMode,
) -> MatchDecision {
    use Ineligibility::*;

    if campaign.is_paused() {
        return MatchDecision::Ineligible(CampaignPaused);
    }

    if prior.blocks(campaign.id, mode) {
        return MatchDecision::Ineligible(ExistingOffer);
    }

    if influencer.adjusted_score < campaign.min_score
        || influencer.adjusted_score > campaign.max_score
    {
        return MatchDecision::Ineligible(ScoreOutOfRange);
    }

    if campaign.exclude.contains(&influencer.status) {
        return MatchDecision::Ineligible(StatusExcluded);
    }

    if !campaign.locations.is_empty() {
        let inside = influencer
            .location
            .map(|point| within_any_geofence(point, &campaign.locations))
            .unwrap_or(false);
        if !inside {
            return MatchDecision::Ineligible(OutsideGeofence);
        }
    }

    if !campaign.categories.is_empty()
        && (influencer.categories.is_empty()
            || !categories_overlap(&campaign.categories, &influencer.categories))
    {
        return MatchDecision::Ineligible(NoCategoryOverlap);
    }

    if campaign.available_budget_cents() < campaign.sponsor_price_for(influencer) {
        return MatchDecision::Ineligible(BudgetExhausted);
    }

    MatchDecision::Eligible
}

pub fn is_valid(
    campaign: &Campaign,
    influencer: &Influencer,
    prior: &PriorOffers,
    mode: MatchMode,
) -> bool {
    evaluate(campaign, influencer, prior, mode).is_eligible()
}

/// Campaigns this influencer may browse, newest first. Cheap narrowing
/// (paused, score containment, exclusion, prior offer) runs before the
/// full predicate.
pub fn eligible_campaigns(
    influencer: &Influencer,
    campaigns: &[Campaign],
    prior: &PriorOffers,
) -> Vec<Campaign> {
    let mut matched: Vec<Campaign> = campaigns
        .iter()
        .filter(|c| {
            !c.is_paused()
                && c.min_score <= influencer.adjusted_score
                && c.max_score >= influencer.adjusted_score
                && !c.exclude.contains(&influencer.status)
                && !prior.any.contains(&c.id)
        })
        .filter(|c| is_valid(c, influencer, prior, MatchMode::Default))
        .cloned()
        .collect();

    matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    matched
}

/// Influencers admissible for a campaign. Candidates are expected to be
/// pre-narrowed to verified + subscribed accounts; `prior_by_influencer`
/// carries each candidate's existing offers.
pub fn eligible_influencers(
    campaign: &Campaign,
    candidates: &[Influencer],
    prior_by_influencer: &HashMap<Uuid, PriorOffers>,
) -> Vec<Influencer> {
    let none = PriorOffers::default();
    candidates
        .iter()
        .filter(|i| {
            i.matchable()
                && i.adjusted_score >= campaign.min_score
                && i.adjusted_score <= campaign.max_score
        })
        .filter(|i| {
            let prior = prior_by_influencer.get(&i.id).unwrap_or(&none);
            is_valid(campaign, i, prior, MatchMode::Default)
        })
        .cloned()
        .collect()
}
