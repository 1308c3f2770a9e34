use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::engine::reports::{donor_summary, DonorSummary};
use crate::error::AppError;
use crate::models::donation::{Donation, DonationStatus};
use crate::models::geo_point::GeoPoint;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/donations", post(create_donation).get(list_donations))
        .route("/donations/:id", get(get_donation))
        .route("/donations/:id/status", patch(update_donation_status))
        .route("/donors/:id/overview", get(donor_overview))
}

const PAGE_SIZE: usize = 10;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDonationRequest {
    pub donor_id: Uuid,
    pub donor_name: String,
    pub food_type: String,
    pub quantity: String,
    pub expiry_hours: f64,
    pub distance_km: f64,
    pub pickup_address: String,
    #[serde(default)]
    pub pickup: Option<GeoPoint>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDonationsQuery {
    pub donor_id: Option<Uuid>,
    pub status: Option<DonationStatus>,
    pub search: Option<String>,
    pub page: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationPage {
    pub items: Vec<Donation>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: DonationStatus,
}

fn validate(payload: &CreateDonationRequest) -> Result<(), AppError> {
    if payload.food_type.trim().is_empty() {
        return Err(AppError::BadRequest("foodType cannot be empty".to_string()));
    }

    if payload.quantity.trim().is_empty() {
        return Err(AppError::BadRequest("quantity cannot be empty".to_string()));
    }

    if !payload.expiry_hours.is_finite() || payload.expiry_hours <= 0.0 {
        return Err(AppError::BadRequest("expiryHours must be > 0".to_string()));
    }

    if !payload.distance_km.is_finite() || payload.distance_km < 0.0 {
        return Err(AppError::BadRequest("distanceKm must be >= 0".to_string()));
    }

    if let Some(point) = &payload.pickup {
        validate_point(point)?;
    }

    Ok(())
}

pub(crate) fn validate_point(point: &GeoPoint) -> Result<(), AppError> {
    if !(-90.0..=90.0).contains(&point.lat) || !(-180.0..=180.0).contains(&point.lng) {
        return Err(AppError::BadRequest(format!(
            "coordinates out of range: {}, {}",
            point.lat, point.lng
        )));
    }
    Ok(())
}

async fn create_donation(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDonationRequest>,
) -> Result<Json<Donation>, AppError> {
    validate(&payload)?;

    let donation = Donation {
        id: Uuid::new_v4(),
        donor_id: payload.donor_id,
        donor_name: payload.donor_name,
        food_type: payload.food_type.trim().to_string(),
        quantity: payload.quantity,
        expiry_hours: payload.expiry_hours,
        distance_km: payload.distance_km,
        pickup_address: payload.pickup_address,
        pickup: payload.pickup,
        notes: payload.notes,
        status: DonationStatus::Pending,
        allocated_to: None,
        created_at: Utc::now(),
    };

    state.donations.insert(donation.id, donation.clone());
    info!(donation_id = %donation.id, donor_id = %donation.donor_id, "donation listed");

    Ok(Json(donation))
}

async fn list_donations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListDonationsQuery>,
) -> Result<Json<DonationPage>, AppError> {
    let page = query.page.unwrap_or(1);
    if page == 0 {
        return Err(AppError::BadRequest("page starts at 1".to_string()));
    }

    let mut donations: Vec<Donation> = state
        .donations
        .iter()
        .map(|entry| entry.value().clone())
        .filter(|donation| query.donor_id.is_none_or(|donor| donation.donor_id == donor))
        .filter(|donation| query.status.is_none_or(|status| donation.status == status))
        .filter(|donation| {
            query
                .search
                .as_deref()
                .is_none_or(|needle| donation.matches_food_type(needle))
        })
        .collect();

    donations.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let total = donations.len();
    let items = donations
        .into_iter()
        .skip((page - 1).saturating_mul(PAGE_SIZE))
        .take(PAGE_SIZE)
        .collect();

    Ok(Json(DonationPage {
        items,
        total,
        page,
        per_page: PAGE_SIZE,
    }))
}

async fn get_donation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Donation>, AppError> {
    let donation = state
        .donations
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("donation {} not found", id)))?;

    Ok(Json(donation.value().clone()))
}

async fn update_donation_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Donation>, AppError> {
    let mut donation = state
        .donations
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("donation {} not found", id)))?;

    if !donation.status.can_transition_to(payload.status) {
        return Err(AppError::Conflict(format!(
            "cannot move donation from {:?} to {:?}",
            donation.status, payload.status
        )));
    }

    donation.status = payload.status;
    info!(donation_id = %id, status = ?payload.status, "donation status changed");

    Ok(Json(donation.clone()))
}

async fn donor_overview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<DonorSummary> {
    Json(donor_summary(&state, id))
}
