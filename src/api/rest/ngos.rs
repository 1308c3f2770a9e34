use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::rest::donations::validate_point;
use crate::engine::claims::{claim_donation, verify_pickup};
use crate::engine::marketplace::{ranked_view, View};
use crate::engine::ranking::{RankedDonation, SortMode};
use crate::engine::reports::{ngo_fulfillment, FulfillmentStats};
use crate::error::AppError;
use crate::models::claim::Claim;
use crate::models::geo_point::GeoPoint;
use crate::models::ngo::NgoProfile;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ngos", post(create_ngo).get(list_ngos))
        .route("/ngos/:id", get(get_ngo))
        .route("/ngos/:id/verify", post(verify_ngo))
        .route("/ngos/:id/suspend", post(suspend_ngo))
        .route("/ngos/:id/browse", get(browse))
        .route("/ngos/:id/overview", get(overview))
        .route("/ngos/:id/dashboard", get(dashboard))
        .route("/ngos/:id/claims", get(list_claims))
        .route("/ngos/:id/claims/:donation_id", post(claim))
        .route("/ngos/:id/pickups/:claim_id/verify", post(verify_claim_pickup))
}

fn default_capacity() -> u32 {
    50
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNgoRequest {
    pub name: String,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default = "default_capacity")]
    pub capacity_kg_per_day: u32,
    #[serde(default)]
    pub performance_score: Option<f64>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationFilter {
    Verified,
    Pending,
}

#[derive(Deserialize)]
pub struct ListNgosQuery {
    pub search: Option<String>,
    pub status: Option<VerificationFilter>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NgoDetail {
    #[serde(flatten)]
    pub profile: NgoProfile,
    #[serde(flatten)]
    pub fulfillment: FulfillmentStats,
}

#[derive(Deserialize)]
pub struct BrowseQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub sort: SortMode,
}

fn load_ngo(state: &AppState, id: Uuid) -> Result<NgoProfile, AppError> {
    state
        .ngos
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("ngo {} not found", id)))
}

async fn create_ngo(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateNgoRequest>,
) -> Result<Json<NgoProfile>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    if payload.performance_score.is_some_and(|score| !score.is_finite()) {
        return Err(AppError::BadRequest("performanceScore must be a number".to_string()));
    }

    if let Some(point) = &payload.location {
        validate_point(point)?;
    }

    let ngo = NgoProfile {
        id: Uuid::new_v4(),
        name: payload.name,
        area: payload.area,
        capacity_kg_per_day: payload.capacity_kg_per_day,
        performance_score: payload.performance_score.map(|score| score.clamp(0.0, 100.0)),
        verified: false,
        location: payload.location,
    };

    state.ngos.insert(ngo.id, ngo.clone());
    info!(ngo_id = %ngo.id, "ngo registered");

    Ok(Json(ngo))
}

async fn list_ngos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListNgosQuery>,
) -> Json<Vec<NgoProfile>> {
    let mut ngos: Vec<NgoProfile> = state
        .ngos
        .iter()
        .map(|entry| entry.value().clone())
        .filter(|ngo| {
            query
                .search
                .as_deref()
                .is_none_or(|needle| ngo.matches_search(needle))
        })
        .filter(|ngo| {
            query.status.is_none_or(|status| match status {
                VerificationFilter::Verified => ngo.verified,
                VerificationFilter::Pending => !ngo.verified,
            })
        })
        .collect();

    ngos.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Json(ngos)
}

async fn get_ngo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<NgoDetail>, AppError> {
    let profile = load_ngo(&state, id)?;
    let fulfillment = ngo_fulfillment(&state, id);

    Ok(Json(NgoDetail {
        profile,
        fulfillment,
    }))
}

fn set_verified(state: &AppState, id: Uuid, verified: bool) -> Result<NgoProfile, AppError> {
    let mut ngo = state
        .ngos
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("ngo {} not found", id)))?;

    ngo.verified = verified;
    info!(ngo_id = %id, verified, "ngo verification changed");

    Ok(ngo.clone())
}

async fn suspend_ngo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<NgoProfile>, AppError> {
    set_verified(&state, id, false).map(Json)
}

async fn verify_ngo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<NgoProfile>, AppError> {
    set_verified(&state, id, true).map(Json)
}

async fn browse(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<Vec<RankedDonation>>, AppError> {
    let ngo = load_ngo(&state, id)?;
    Ok(Json(ranked_view(
        &state,
        &ngo,
        View::Browse,
        query.search.as_deref(),
        query.sort,
    )))
}

async fn overview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RankedDonation>>, AppError> {
    let ngo = load_ngo(&state, id)?;
    Ok(Json(ranked_view(&state, &ngo, View::Overview, None, SortMode::Rank)))
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RankedDonation>>, AppError> {
    let ngo = load_ngo(&state, id)?;
    Ok(Json(ranked_view(&state, &ngo, View::Dashboard, None, SortMode::Rank)))
}

async fn claim(
    State(state): State<Arc<AppState>>,
    Path((ngo_id, donation_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Claim>, AppError> {
    claim_donation(&state, ngo_id, donation_id).map(Json)
}

async fn verify_claim_pickup(
    State(state): State<Arc<AppState>>,
    Path((ngo_id, claim_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Claim>, AppError> {
    verify_pickup(&state, ngo_id, claim_id).map(Json)
}

async fn list_claims(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Claim>>, AppError> {
    load_ngo(&state, id)?;

    let mut claims: Vec<Claim> = state
        .claims
        .iter()
        .filter(|entry| entry.value().ngo_id == id)
        .map(|entry| entry.value().clone())
        .collect();

    claims.sort_by(|a, b| a.claimed_at.cmp(&b.claimed_at));
    Ok(Json(claims))
}
