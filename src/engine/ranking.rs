use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::donation::Donation;

const URGENCY_WEIGHT: f64 = 0.6;
const DISTANCE_WEIGHT: f64 = 0.3;
const PERFORMANCE_WEIGHT: f64 = 0.1;

/// Half a day: a donation expiring in 12 hours earns one full urgency unit.
const URGENCY_REFERENCE_HOURS: f64 = 12.0;
const EXPIRY_FLOOR_HOURS: f64 = 0.5;

const DISTANCE_REFERENCE_KM: f64 = 10.0;
const DISTANCE_FLOOR_KM: f64 = 0.1;

pub const DEFAULT_PERFORMANCE_SCORE: f64 = 50.0;
const MAX_PRIORITY_SCORE: f64 = 100.0;

#[derive(Debug, Error, PartialEq)]
pub enum RankingError {
    #[error("invalid ranking weights: {0}")]
    InvalidWeights(String),
}

/// Relative weight of each scoring term.
///
/// The three weights are meant to sum to 1.0 so scores stay on the 0..100
/// scale. That proportion is not enforced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RankingWeights {
    pub urgency: f64,
    pub distance: f64,
    pub performance: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            urgency: URGENCY_WEIGHT,
            distance: DISTANCE_WEIGHT,
            performance: PERFORMANCE_WEIGHT,
        }
    }
}

impl RankingWeights {
    pub fn validate(&self) -> Result<(), RankingError> {
        let named = [
            ("urgency", self.urgency),
            ("distance", self.distance),
            ("performance", self.performance),
        ];

        for (name, weight) in named {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RankingError::InvalidWeights(format!(
                    "{name} weight must be finite and >= 0, got {weight}"
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortMode {
    #[default]
    Rank,
    Distance,
    Expiry,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    pub urgency: f64,
    pub distance: f64,
    pub performance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedDonation {
    #[serde(flatten)]
    pub donation: Donation,
    pub priority_score: f64,
    pub score_breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Default)]
pub struct PriorityRanker {
    weights: RankingWeights,
}

impl PriorityRanker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: RankingWeights) -> Result<Self, RankingError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> RankingWeights {
        self.weights
    }

    /// Scores a single donation for an actor.
    ///
    /// Total over all `f64` inputs: denominators are floored (`f64::max`
    /// also maps `NaN` to the floor), and a non-finite performance score
    /// falls back to the default.
    pub fn score(
        &self,
        expiry_hours: f64,
        distance_km: f64,
        performance_score: Option<f64>,
    ) -> (f64, ScoreBreakdown) {
        let breakdown = ScoreBreakdown {
            urgency: self.weights.urgency * urgency_factor(expiry_hours),
            distance: self.weights.distance * distance_factor(distance_km),
            performance: self.weights.performance * performance_factor(performance_score),
        };

        let raw = (breakdown.urgency + breakdown.distance + breakdown.performance) * 10.0;
        let rounded = (raw * 10.0).round() / 10.0;

        (rounded.clamp(0.0, MAX_PRIORITY_SCORE), breakdown)
    }

    /// Pending donations ordered by descending priority score.
    pub fn rank(
        &self,
        donations: &[Donation],
        performance_score: Option<f64>,
    ) -> Vec<RankedDonation> {
        self.order(donations, performance_score, SortMode::Rank)
    }

    pub fn rank_top(
        &self,
        donations: &[Donation],
        performance_score: Option<f64>,
        limit: usize,
    ) -> Vec<RankedDonation> {
        let mut ranked = self.rank(donations, performance_score);
        ranked.truncate(limit);
        ranked
    }

    /// Scores every pending donation and orders the result by `mode`.
    ///
    /// All modes use a stable sort, so equal keys keep their input order.
    pub fn order(
        &self,
        donations: &[Donation],
        performance_score: Option<f64>,
        mode: SortMode,
    ) -> Vec<RankedDonation> {
        let mut scored: Vec<RankedDonation> = donations
            .iter()
            .filter(|donation| donation.is_eligible())
            .map(|donation| {
                let (priority_score, score_breakdown) =
                    self.score(donation.expiry_hours, donation.distance_km, performance_score);
                RankedDonation {
                    donation: donation.clone(),
                    priority_score,
                    score_breakdown,
                }
            })
            .collect();

        match mode {
            SortMode::Rank => scored.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score)),
            SortMode::Distance => {
                scored.sort_by(|a, b| a.donation.distance_km.total_cmp(&b.donation.distance_km))
            }
            SortMode::Expiry => {
                scored.sort_by(|a, b| a.donation.expiry_hours.total_cmp(&b.donation.expiry_hours))
            }
        }

        scored
    }
}

fn urgency_factor(expiry_hours: f64) -> f64 {
    URGENCY_REFERENCE_HOURS / expiry_hours.max(EXPIRY_FLOOR_HOURS)
}

fn distance_factor(distance_km: f64) -> f64 {
    DISTANCE_REFERENCE_KM / distance_km.max(DISTANCE_FLOOR_KM)
}

fn performance_factor(performance_score: Option<f64>) -> f64 {
    let score = match performance_score {
        Some(score) if score.is_finite() => score.clamp(0.0, 100.0),
        _ => DEFAULT_PERFORMANCE_SCORE,
    };
    score / 100.0
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{PriorityRanker, RankingError, RankingWeights, SortMode};
    use crate::models::donation::{Donation, DonationStatus};

    fn donation(
        id_seed: u128,
        expiry_hours: f64,
        distance_km: f64,
        status: DonationStatus,
    ) -> Donation {
        Donation {
            id: Uuid::from_u128(id_seed),
            donor_id: Uuid::from_u128(1_000),
            donor_name: "Grand Hyatt Kitchen".to_string(),
            food_type: "Cooked Meals".to_string(),
            quantity: "25 kg".to_string(),
            expiry_hours,
            distance_km,
            pickup_address: "Downtown, Sector 5".to_string(),
            pickup: None,
            notes: None,
            status,
            allocated_to: None,
            created_at: Utc::now(),
        }
    }

    fn pending(id_seed: u128, expiry_hours: f64, distance_km: f64) -> Donation {
        donation(id_seed, expiry_hours, distance_km, DonationStatus::Pending)
    }

    fn ids(ranked: &[super::RankedDonation]) -> Vec<u128> {
        ranked.iter().map(|r| r.donation.id.as_u128()).collect()
    }

    #[test]
    fn worked_example_scores_56_9() {
        let ranker = PriorityRanker::new();
        let (score, breakdown) = ranker.score(2.0, 1.5, Some(85.0));

        assert!((breakdown.urgency - 3.6).abs() < 1e-9);
        assert!((breakdown.distance - 2.0).abs() < 1e-9);
        assert!((breakdown.performance - 0.085).abs() < 1e-9);
        assert_eq!(score, 56.9);
    }

    #[test]
    fn only_pending_donations_are_ranked() {
        let donations = vec![
            pending(1, 2.0, 1.5),
            donation(2, 12.0, 4.2, DonationStatus::Allocated),
            donation(3, 72.0, 12.0, DonationStatus::PickedUp),
            pending(4, 1.0, 0.8),
            donation(5, 3.0, 1.0, DonationStatus::Rejected),
            pending(6, 6.0, 2.1),
        ];

        let ranked = PriorityRanker::new().rank(&donations, Some(85.0));

        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|r| r.donation.status == DonationStatus::Pending));
        assert_eq!(ids(&ranked), vec![4, 1, 6]);
    }

    #[test]
    fn ranking_leaves_input_untouched() {
        let donations = vec![pending(1, 6.0, 2.1), pending(2, 1.0, 0.8)];
        let before: Vec<Uuid> = donations.iter().map(|d| d.id).collect();

        let _ = PriorityRanker::new().rank(&donations, None);

        let after: Vec<Uuid> = donations.iter().map(|d| d.id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn scores_stay_within_bounds() {
        let ranker = PriorityRanker::new();
        let expiries = [0.01, 0.5, 1.0, 2.0, 6.0, 24.0, 72.0, 10_000.0];
        let distances = [0.01, 0.1, 1.5, 5.0, 40.0, 5_000.0];
        let performances = [0.0, 25.0, 50.0, 100.0];

        for expiry in expiries {
            for distance in distances {
                for performance in performances {
                    let (score, _) = ranker.score(expiry, distance, Some(performance));
                    assert!(
                        (0.0..=100.0).contains(&score),
                        "score {score} out of range for {expiry}h/{distance}km/{performance}"
                    );
                }
            }
        }
    }

    #[test]
    fn sooner_expiry_never_lowers_score() {
        let ranker = PriorityRanker::new();
        let mut previous = f64::MIN;

        for expiry in [96.0, 48.0, 24.0, 12.0, 8.0, 4.0, 2.0, 1.0, 0.5, 0.25] {
            let (score, _) = ranker.score(expiry, 8.0, Some(70.0));
            assert!(score >= previous, "{expiry}h scored {score} < {previous}");
            previous = score;
        }
    }

    #[test]
    fn closer_pickup_never_lowers_score() {
        let ranker = PriorityRanker::new();
        let mut previous = f64::MIN;

        for distance in [200.0, 50.0, 20.0, 10.0, 5.0, 2.0, 1.0, 0.5, 0.1, 0.01] {
            let (score, _) = ranker.score(24.0, distance, Some(70.0));
            assert!(score >= previous, "{distance}km scored {score} < {previous}");
            previous = score;
        }
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let donations = vec![
            pending(10, 4.0, 3.0),
            pending(11, 1.0, 0.5),
            pending(12, 4.0, 3.0),
            pending(13, 4.0, 3.0),
        ];

        let ranked = PriorityRanker::new().rank(&donations, Some(60.0));

        assert_eq!(ids(&ranked), vec![11, 10, 12, 13]);
    }

    #[test]
    fn missing_performance_ranks_as_fifty() {
        let ranker = PriorityRanker::new();

        assert_eq!(ranker.score(3.0, 2.5, None), ranker.score(3.0, 2.5, Some(50.0)));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let ranked = PriorityRanker::new().rank(&[], Some(90.0));
        assert!(ranked.is_empty());
    }

    #[test]
    fn degenerate_inputs_fall_to_floors() {
        let ranker = PriorityRanker::new();
        let floored = ranker.score(0.5, 0.1, Some(50.0));

        assert_eq!(ranker.score(-3.0, -1.0, Some(50.0)), floored);
        assert_eq!(ranker.score(0.0, 0.0, Some(50.0)), floored);
        assert_eq!(ranker.score(f64::NAN, f64::NAN, Some(50.0)), floored);

        let (far_future, breakdown) = ranker.score(f64::INFINITY, f64::INFINITY, Some(f64::NAN));
        assert!(far_future.is_finite());
        assert_eq!(breakdown.urgency, 0.0);
        assert_eq!(breakdown.distance, 0.0);
        assert_eq!(far_future, 0.5);
    }

    #[test]
    fn performance_is_clamped_to_percentage() {
        let ranker = PriorityRanker::new();

        assert_eq!(ranker.score(12.0, 10.0, Some(250.0)), ranker.score(12.0, 10.0, Some(100.0)));
        assert_eq!(ranker.score(12.0, 10.0, Some(-40.0)), ranker.score(12.0, 10.0, Some(0.0)));
    }

    #[test]
    fn distance_and_expiry_modes_sort_ascending() {
        let donations = vec![
            pending(1, 2.0, 1.5),
            donation(2, 0.5, 0.2, DonationStatus::Allocated),
            pending(3, 1.0, 0.8),
            pending(4, 6.0, 0.8),
            pending(5, 6.0, 2.1),
        ];
        let ranker = PriorityRanker::new();

        let by_distance = ranker.order(&donations, None, SortMode::Distance);
        assert_eq!(ids(&by_distance), vec![3, 4, 1, 5]);

        let by_expiry = ranker.order(&donations, None, SortMode::Expiry);
        assert_eq!(ids(&by_expiry), vec![3, 1, 4, 5]);
        assert!(by_expiry.iter().all(|r| r.priority_score > 0.0));
    }

    #[test]
    fn rank_top_truncates_ranked_order() {
        let donations: Vec<Donation> = (1..=5)
            .map(|seed| pending(seed, seed as f64, 1.0))
            .collect();

        let top = PriorityRanker::new().rank_top(&donations, None, 3);

        assert_eq!(ids(&top), vec![1, 2, 3]);
    }

    #[test]
    fn invalid_weights_are_rejected() {
        let weights = RankingWeights {
            urgency: 0.6,
            distance: -0.3,
            performance: 0.1,
        };

        assert!(matches!(
            PriorityRanker::with_weights(weights),
            Err(RankingError::InvalidWeights(_))
        ));
        assert!(RankingWeights {
            performance: f64::NAN,
            ..RankingWeights::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn custom_weights_change_the_balance() {
        let urgency_only = PriorityRanker::with_weights(RankingWeights {
            urgency: 1.0,
            distance: 0.0,
            performance: 0.0,
        })
        .unwrap();

        let (score, breakdown) = urgency_only.score(24.0, 0.1, Some(100.0));
        assert_eq!(breakdown.distance, 0.0);
        assert_eq!(score, 5.0);
    }
}
