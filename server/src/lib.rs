//! Rowset Server - reference remote service for rowset record groups.
//!
//! Serves an in-memory [`Dataset`](dataset::Dataset) of resources over
//! HTTP/JSON: batched reads, defaults, create/write/delete and declarative
//! write hooks. The same dataset implements the engine's `RemoteService`
//! so groups can also be driven against it in-process.

pub mod auth;
pub mod config;
pub mod dataset;
pub mod error;
pub mod handlers;
pub mod routes;

use crate::config::Config;
use crate::dataset::Dataset;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(dataset: Dataset, config: Config) -> Self {
        Self {
            dataset: Arc::new(dataset),
            config: Arc::new(config),
        }
    }
}

/// Build the application router with tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
