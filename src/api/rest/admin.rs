use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;
use chrono::Utc;

use crate::engine::reports::{admin_overview, AdminOverview};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/admin/overview", get(overview))
}

async fn overview(State(state): State<Arc<AppState>>) -> Json<AdminOverview> {
    Json(admin_overview(&state, Utc::now()))
}
