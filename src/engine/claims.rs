use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::resolve_distance_km;
use crate::models::claim::{Claim, ClaimEvent, ClaimEventKind};
use crate::models::donation::DonationStatus;
use crate::state::AppState;

/// Allocates a pending donation to an NGO.
///
/// The status check and the status change happen while the donation's map
/// entry is held, so only one of several concurrent claims can succeed.
pub fn claim_donation(
    state: &AppState,
    ngo_id: Uuid,
    donation_id: Uuid,
) -> Result<Claim, AppError> {
    match try_claim(state, ngo_id, donation_id) {
        Ok(claim) => {
            state
                .metrics
                .claims_total
                .with_label_values(&["success"])
                .inc();
            Ok(claim)
        }
        Err(err) => {
            state
                .metrics
                .claims_total
                .with_label_values(&["rejected"])
                .inc();
            warn!(ngo_id = %ngo_id, donation_id = %donation_id, error = %err, "claim rejected");
            Err(err)
        }
    }
}

fn try_claim(state: &AppState, ngo_id: Uuid, donation_id: Uuid) -> Result<Claim, AppError> {
    let ngo = state
        .ngos
        .get(&ngo_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("ngo {} not found", ngo_id)))?;

    let priority_score = {
        let mut donation = state
            .donations
            .get_mut(&donation_id)
            .ok_or_else(|| AppError::NotFound(format!("donation {} not found", donation_id)))?;

        if donation.status != DonationStatus::Pending {
            return Err(AppError::Conflict("donation already claimed".to_string()));
        }

        let distance_km = resolve_distance_km(
            donation.pickup.as_ref(),
            ngo.location.as_ref(),
            donation.distance_km,
        );
        let (score, _breakdown) = state
            .ranker
            .score(donation.expiry_hours, distance_km, ngo.performance_score);

        donation.status = DonationStatus::Allocated;
        donation.allocated_to = Some(ngo_id);
        score
    };

    let claim = Claim {
        id: Uuid::new_v4(),
        donation_id,
        ngo_id,
        priority_score,
        claimed_at: Utc::now(),
        verified_at: None,
    };

    state.claims.insert(claim.id, claim.clone());
    let _ = state.claim_events_tx.send(ClaimEvent {
        kind: ClaimEventKind::Claimed,
        claim: claim.clone(),
    });

    info!(
        ngo_id = %ngo_id,
        donation_id = %donation_id,
        score = priority_score,
        "donation claimed"
    );

    Ok(claim)
}

/// Confirms collection of a claimed donation and marks it picked up.
pub fn verify_pickup(state: &AppState, ngo_id: Uuid, claim_id: Uuid) -> Result<Claim, AppError> {
    let mut claim = state
        .claims
        .get_mut(&claim_id)
        .filter(|claim| claim.ngo_id == ngo_id)
        .ok_or_else(|| {
            AppError::NotFound(format!("claim {} not found for ngo {}", claim_id, ngo_id))
        })?;

    if claim.is_verified() {
        return Err(AppError::Conflict("pickup already verified".to_string()));
    }

    {
        let mut donation = state.donations.get_mut(&claim.donation_id).ok_or_else(|| {
            AppError::NotFound(format!("donation {} not found", claim.donation_id))
        })?;

        if donation.status != DonationStatus::Allocated {
            return Err(AppError::Conflict(format!(
                "donation is {:?}, not awaiting pickup",
                donation.status
            )));
        }

        donation.status = DonationStatus::PickedUp;
    }

    claim.verified_at = Some(Utc::now());
    let verified = claim.clone();
    drop(claim);

    state.metrics.pickups_verified_total.inc();
    let _ = state.claim_events_tx.send(ClaimEvent {
        kind: ClaimEventKind::PickupVerified,
        claim: verified.clone(),
    });

    info!(
        ngo_id = %ngo_id,
        claim_id = %claim_id,
        donation_id = %verified.donation_id,
        "pickup verified"
    );

    Ok(verified)
}
