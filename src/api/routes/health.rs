use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::api::state::ApiState;
use crate::global::environment::HealthResult;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
    mongo: Option<MongoSummary>,
}

#[derive(Serialize)]
struct MongoSummary {
    database: String,
    seeds: Vec<String>,
    write_concern: String,
    stopped: bool,
}

#[derive(Serialize)]
pub struct HealthReport {
    healthy: bool,
    checks: BTreeMap<String, HealthResult>,
}

/// Liveness endpoint
pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let mongo = state.mongo.as_ref().map(|client| MongoSummary {
        database: client.database_name().to_string(),
        seeds: client.seeds().iter().map(|seed| seed.to_string()).collect(),
        write_concern: client.write_concern_level().to_string(),
        stopped: client.is_stopped(),
    });

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mongo,
    })
}

/// Run every registered health check
pub async fn health_checks(State(state): State<ApiState>) -> (StatusCode, Json<HealthReport>) {
    let checks = state.health_checks.run_all().await;
    let healthy = checks.values().all(|result| result.healthy);

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(HealthReport { healthy, checks }))
}

/// Run a single named health check
pub async fn health_check(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<(StatusCode, Json<HealthResult>), StatusCode> {
    let result = state
        .health_checks
        .run(&name)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    let status = if result.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    Ok((status, Json(result)))
}
