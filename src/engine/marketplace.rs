use std::time::Instant;

use tracing::debug;

use crate::engine::ranking::{RankedDonation, SortMode};
use crate::geo::resolve_distance_km;
use crate::models::donation::Donation;
use crate::models::ngo::NgoProfile;
use crate::state::AppState;

/// The NGO-facing screens that present ranked donations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Browse,
    Overview,
    Dashboard,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Browse => "browse",
            View::Overview => "overview",
            View::Dashboard => "dashboard",
        }
    }
}

/// Pending donations as seen from `ngo`, oldest listing first.
///
/// Each returned record is a copy whose `distance_km` has been resolved
/// against the NGO's location.
pub fn candidates_for(state: &AppState, ngo: &NgoProfile, search: Option<&str>) -> Vec<Donation> {
    let mut candidates: Vec<Donation> = state
        .donations
        .iter()
        .filter_map(|entry| {
            let donation = entry.value();
            let wanted = donation.is_eligible()
                && search.is_none_or(|needle| donation.matches_food_type(needle));

            if wanted {
                let mut local = donation.clone();
                local.distance_km = resolve_distance_km(
                    donation.pickup.as_ref(),
                    ngo.location.as_ref(),
                    donation.distance_km,
                );
                Some(local)
            } else {
                None
            }
        })
        .collect();

    // DashMap iteration order is arbitrary; ties in the ranking must follow listing order.
    candidates.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    candidates
}

pub fn ranked_view(
    state: &AppState,
    ngo: &NgoProfile,
    view: View,
    search: Option<&str>,
    mode: SortMode,
) -> Vec<RankedDonation> {
    let start = Instant::now();

    let candidates = candidates_for(state, ngo, search);
    let ranked = match view {
        View::Overview => {
            state
                .ranker
                .rank_top(&candidates, ngo.performance_score, state.overview_limit)
        }
        View::Browse | View::Dashboard => {
            state
                .ranker
                .order(&candidates, ngo.performance_score, mode)
        }
    };

    let label = view.as_str();
    state
        .metrics
        .ranking_latency_seconds
        .with_label_values(&[label])
        .observe(start.elapsed().as_secs_f64());
    state
        .metrics
        .ranking_requests_total
        .with_label_values(&[label])
        .inc();

    debug!(
        ngo_id = %ngo.id,
        view = label,
        candidates = candidates.len(),
        returned = ranked.len(),
        "ranked donations"
    );

    ranked
}
