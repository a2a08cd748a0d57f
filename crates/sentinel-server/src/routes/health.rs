//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: HealthComponents,
}

#[derive(Serialize)]
pub struct HealthComponents {
    pub database: bool,
    pub ai: bool,
    pub auto_repair: bool,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    let db_healthy = state.db.ping().is_ok();

    let status = if db_healthy { "healthy" } else { "degraded" };

    Json(HealthStatus {
        status: status.to_string(),
        service: "DevSentinel".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: HealthComponents {
            database: db_healthy,
            ai: state.advisor.status().available,
            auto_repair: state.orchestrator.config().auto_repair_enabled,
        },
    })
}
