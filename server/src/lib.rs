//! # Scribe
//!
//! HTTP front for the documentation service: register repositories, schedule
//! scans, and let the background pipeline draft missing docstrings.

pub mod errors;
pub mod jobs;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::{
    Router,
    routing::{get, post}
};
use tower_http::trace::TraceLayer;

pub use errors::{ApiError, ApiResult};
pub use state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health_handler))
        .route("/repositories", post(routes::register_repository))
        .route("/repositories/{id}/scan", post(routes::schedule_scan))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
