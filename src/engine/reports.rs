use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::claim::Claim;
use crate::models::donation::{Donation, DonationStatus};
use crate::state::AppState;

const RECENT_ACTIVITY_LIMIT: usize = 3;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorSummary {
    pub total_donations: usize,
    pub status_distribution: BTreeMap<DonationStatus, usize>,
    pub recent_activity: Vec<Donation>,
    /// Listings still waiting for an NGO.
    pub pending_donations: usize,
    /// Listings claimed by an NGO but not yet collected.
    pub active_allocations: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentStats {
    pub total_claims: usize,
    pub verified_pickups: usize,
    /// Percentage of claims with a verified pickup, two decimals.
    pub fulfillment_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverview {
    pub live_requests: usize,
    pub pending_donations: usize,
    pub donations_listed_today: usize,
    pub verified_ngos: usize,
    #[serde(flatten)]
    pub fulfillment: FulfillmentStats,
}

pub fn fulfillment<'a>(claims: impl IntoIterator<Item = &'a Claim>) -> FulfillmentStats {
    let (total_claims, verified_pickups) = claims
        .into_iter()
        .fold((0, 0), |(total, verified), claim| {
            (total + 1, verified + usize::from(claim.is_verified()))
        });

    let fulfillment_rate = if total_claims == 0 {
        0.0
    } else {
        let percent = verified_pickups as f64 / total_claims as f64 * 100.0;
        (percent * 100.0).round() / 100.0
    };

    FulfillmentStats {
        total_claims,
        verified_pickups,
        fulfillment_rate,
    }
}

pub fn donor_summary(state: &AppState, donor_id: Uuid) -> DonorSummary {
    let mut donations: Vec<Donation> = state
        .donations
        .iter()
        .filter(|entry| entry.value().donor_id == donor_id)
        .map(|entry| entry.value().clone())
        .collect();

    let mut status_distribution: BTreeMap<DonationStatus, usize> = BTreeMap::new();
    for donation in &donations {
        *status_distribution.entry(donation.status).or_insert(0) += 1;
    }

    let count = |status: DonationStatus| status_distribution.get(&status).copied().unwrap_or(0);
    let pending_donations = count(DonationStatus::Pending);
    let active_allocations = count(DonationStatus::Allocated);

    donations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    donations.truncate(RECENT_ACTIVITY_LIMIT);

    DonorSummary {
        total_donations: status_distribution.values().sum(),
        status_distribution,
        recent_activity: donations,
        pending_donations,
        active_allocations,
    }
}

pub fn ngo_fulfillment(state: &AppState, ngo_id: Uuid) -> FulfillmentStats {
    let claims: Vec<Claim> = state
        .claims
        .iter()
        .filter(|entry| entry.value().ngo_id == ngo_id)
        .map(|entry| entry.value().clone())
        .collect();

    fulfillment(&claims)
}

pub fn admin_overview(state: &AppState, now: DateTime<Utc>) -> AdminOverview {
    let claims: Vec<Claim> = state
        .claims
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    let stats = fulfillment(&claims);

    let today = now.date_naive();
    let (pending_donations, donations_listed_today) =
        state
            .donations
            .iter()
            .fold((0, 0), |(pending, listed_today), entry| {
                let donation = entry.value();
                (
                    pending + usize::from(donation.status == DonationStatus::Pending),
                    listed_today + usize::from(donation.created_at.date_naive() == today),
                )
            });

    AdminOverview {
        live_requests: stats.total_claims - stats.verified_pickups,
        pending_donations,
        donations_listed_today,
        verified_ngos: state.ngos.iter().filter(|entry| entry.value().verified).count(),
        fulfillment: stats,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::{admin_overview, donor_summary, fulfillment};
    use crate::models::claim::Claim;
    use crate::models::donation::{Donation, DonationStatus};
    use crate::state::AppState;

    fn claim(verified: bool) -> Claim {
        Claim {
            id: Uuid::new_v4(),
            donation_id: Uuid::new_v4(),
            ngo_id: Uuid::from_u128(9),
            priority_score: 40.0,
            claimed_at: Utc::now(),
            verified_at: verified.then(Utc::now),
        }
    }

    fn listing(donor_seed: u128, status: DonationStatus, age_hours: i64) -> Donation {
        Donation {
            id: Uuid::new_v4(),
            donor_id: Uuid::from_u128(donor_seed),
            donor_name: "City Supermarket".to_string(),
            food_type: "Canned Goods".to_string(),
            quantity: "50 units".to_string(),
            expiry_hours: 72.0,
            distance_km: 12.0,
            pickup_address: "East Wing Plaza".to_string(),
            pickup: None,
            notes: None,
            status,
            allocated_to: None,
            created_at: Utc::now() - Duration::hours(age_hours),
        }
    }

    #[test]
    fn fulfillment_rate_has_two_decimals() {
        let claims = vec![claim(true), claim(false), claim(false)];

        let stats = fulfillment(&claims);

        assert_eq!(stats.total_claims, 3);
        assert_eq!(stats.verified_pickups, 1);
        assert_eq!(stats.fulfillment_rate, 33.33);
    }

    #[test]
    fn no_claims_means_zero_rate() {
        assert_eq!(fulfillment(&Vec::new()).fulfillment_rate, 0.0);
    }

    #[test]
    fn donor_summary_counts_only_own_listings() {
        let state = AppState::new(16, 3);
        for donation in [
            listing(1, DonationStatus::Pending, 1),
            listing(1, DonationStatus::Allocated, 2),
            listing(1, DonationStatus::PickedUp, 30),
            listing(1, DonationStatus::Pending, 5),
            listing(2, DonationStatus::Pending, 1),
        ] {
            state.donations.insert(donation.id, donation);
        }

        let summary = donor_summary(&state, Uuid::from_u128(1));

        assert_eq!(summary.total_donations, 4);
        assert_eq!(summary.pending_donations, 2);
        assert_eq!(summary.active_allocations, 1);
        assert_eq!(summary.status_distribution[&DonationStatus::PickedUp], 1);
        assert_eq!(summary.recent_activity.len(), 3);
        assert!(summary
            .recent_activity
            .iter()
            .all(|d| d.status != DonationStatus::PickedUp));
    }

    #[test]
    fn admin_overview_counts_live_requests() {
        let state = AppState::new(16, 3);
        for claim in [claim(true), claim(false)] {
            state.claims.insert(claim.id, claim);
        }
        let fresh = listing(1, DonationStatus::Pending, 0);
        let old = listing(1, DonationStatus::Pending, 72);
        state.donations.insert(fresh.id, fresh);
        state.donations.insert(old.id, old);

        let overview = admin_overview(&state, Utc::now());

        assert_eq!(overview.live_requests, 1);
        assert_eq!(overview.fulfillment.fulfillment_rate, 50.0);
        assert_eq!(overview.pending_donations, 2);
        assert_eq!(overview.donations_listed_today, 1);
    }
}
