use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
}

/// API index payload served at `/api/v1`.
#[derive(Serialize)]
pub struct IndexResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub resources: &'static [&'static str],
}

/// Top-level resources mounted under `/api/v1`.
pub const RESOURCES: &[&str] = &[
    "auth",
    "users",
    "dashboard",
    "equipment-types",
    "maintenance-types",
    "item-groups",
    "items",
    "equipment",
    "mechanics",
    "work-orders",
    "inventory",
    "imports",
    "tires",
    "oil-analyses",
    "preventive-plans",
    "backlog",
];

/// GET /health -- returns service and database health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = cmms_db::health_check(&state.pool).await.is_ok();

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
    })
}

/// GET /api/v1 -- service name, version and resource index.
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        name: "CMMS API",
        version: env!("CARGO_PKG_VERSION"),
        resources: RESOURCES,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
