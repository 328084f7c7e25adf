pub mod health;

use axum::{Router, routing::get};

use crate::api::state::ApiState;

/// Create the main API router
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/healthcheck", get(health::health_checks))
        .route("/healthcheck/{name}", get(health::health_check))
        .with_state(state)
}
