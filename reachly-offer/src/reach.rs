use crate::models::{OfferStatus, OfferTrack};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use uuid::Uuid;

/// One offer's contribution to a campaign's reach aggregate.
#[derive(Debug, Clone, Copy)]
pub struct ReachEntry {
    pub influencer_id: Uuid,
    pub followers: i64,
    pub status: OfferStatus,
}

/// Aggregate follower reach of a campaign's offers: active offers count in
/// full, cancelled offers are weighted by `cancelled_rate` unless their
/// influencer already counts through an active offer. Floored to an
/// integer.
pub fn total_reach(entries: &[ReachEntry], cancelled_rate: f64) -> i64 {
    let active_influencers: HashSet<Uuid> = entries
        .iter()
        .filter(|e| e.status.is_active())
        .map(|e| e.influencer_id)
        .collect();

    let active_sum: i64 = entries
        .iter()
        .filter(|e| e.status.is_active())
        .map(|e| e.followers)
        .sum();

    let cancelled_sum: i64 = entries
        .iter()
        .filter(|e| e.status == OfferStatus::Cancelled)
        .filter(|e| !active_influencers.contains(&e.influencer_id))
        .map(|e| e.followers)
        .sum();

    active_sum + (cancelled_rate * cancelled_sum as f64).floor() as i64
}

/// Distinct calendar dates with at least one tracking sample at or after
/// the offer's start. An engagement-duration metric, not a billing unit.
pub fn tracked_days(tracks: &[OfferTrack], start: DateTime<Utc>) -> usize {
    let days: HashSet<NaiveDate> = tracks
        .iter()
        .filter(|t| t.tracked_at >= start)
        .map(|t| t.tracked_at.date_naive())
        .collect();
    days.len()
}
