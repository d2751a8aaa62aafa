//! Liveness endpoints

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// Health status response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct TestResponse {
    pub status: &'static str,
}

/// GET /test
async fn test() -> Json<TestResponse> {
    Json(TestResponse { status: "ok" })
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    metrics::counter!("travel_health_checks_total").increment(1);

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/test", get(test))
        .route("/health", get(health))
}
