pub mod admin;
pub mod donations;
pub mod ngos;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::models::donation::DonationStatus;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    router_with_static(state, "static")
}

pub fn router_with_static(state: Arc<AppState>, static_dir: &str) -> Router {
    Router::new()
        .merge(donations::router())
        .merge(ngos::router())
        .merge(admin::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    donations: usize,
    ngos: usize,
    claims: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        donations: state.donations.len(),
        ngos: state.ngos.len(),
        claims: state.claims.len(),
    })
}

fn pending_count(state: &AppState) -> i64 {
    state
        .donations
        .iter()
        .filter(|entry| entry.value().status == DonationStatus::Pending)
        .count() as i64
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.metrics.pending_donations.set(pending_count(&state));

    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
