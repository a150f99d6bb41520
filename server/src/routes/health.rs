//! Liveness and dataset summary.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Resources currently served, sorted by name.
    pub resources: Vec<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        resources: state.dataset.resource_names(),
    })
}

async fn root(State(state): State<AppState>) -> String {
    format!(
        "Rowset Server serving {} resources",
        state.dataset.resource_names().len()
    )
}
