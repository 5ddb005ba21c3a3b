/// Score-band pricing: what a sponsor is charged and what a creator is
/// paid for a single campaign post, keyed off the adjusted score.
///
/// The spread between the two columns is the platform margin.
pub struct ScorePricing;

/// (score floor, creator payout in cents, sponsor charge in cents)
const BANDS: &[(f64, i64, i64)] = &[
    (80.0, 40_000, 60_000),
    (60.0, 20_000, 30_000),
    (40.0, 10_000, 15_000),
    (20.0, 5_000, 8_000),
    (0.0, 2_500, 4_000),
];

impl ScorePricing {
    /// Payout credited to the creator on completion.
    pub fn influencer_price_cents(adjusted_score: f64) -> i64 {
        Self::band(adjusted_score).1
    }

    /// Charge reserved against the sponsor's budget at offer creation.
    pub fn sponsor_price_cents(adjusted_score: f64) -> i64 {
        Self::band(adjusted_score).2
    }

    fn band(adjusted_score: f64) -> (f64, i64, i64) {
        BANDS
            .iter()
            .copied()
            .find(|(floor, _, _)| adjusted_score >= *floor)
            // Scores below every floor price like the bottom band.
            .unwrap_or(BANDS[BANDS.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sponsor_price_exceeds_payout_in_every_band() {
        for score in [0.0, 15.0, 25.0, 45.0, 70.0, 95.0] {
            assert!(
                ScorePricing::sponsor_price_cents(score)
                    > ScorePricing::influencer_price_cents(score),
                "no margin at score {score}"
            );
        }
    }

    #[test]
    fn prices_are_monotonic_in_score() {
        let mut last = 0;
        for score in [5.0, 25.0, 45.0, 65.0, 85.0] {
            let price = ScorePricing::sponsor_price_cents(score);
            assert!(price > last);
            last = price;
        }
    }

    #[test]
    fn negative_scores_fall_into_lowest_band() {
        assert_eq!(ScorePricing::influencer_price_cents(-3.0), 2_500);
    }
}
