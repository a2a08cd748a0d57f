//! API route modules.

pub mod dashboard;
pub mod health;
pub mod incidents;
pub mod repair;

use axum::{http::StatusCode, routing::get, Router};
use sentinel_core::{ConnectorError, Error};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(incidents::router())
        .merge(repair::router())
        .nest("/api", dashboard::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Map a core error onto an HTTP status and message
pub fn api_error(err: Error) -> (StatusCode, String) {
    let status = match &err {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::IncidentNotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidTransition { .. } => StatusCode::CONFLICT,
        Error::Connector(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

/// Map a failure of the intake pipeline
///
/// Only a rejected request is the caller's fault. Anything raised after the
/// incident was created (including a record vanishing mid-pipeline) is a 500.
pub fn pipeline_error(err: Error) -> (StatusCode, String) {
    let status = match &err {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

/// Map a collaborator error from a direct proxy call
pub fn connector_error(err: ConnectorError) -> (StatusCode, String) {
    api_error(Error::Connector(err))
}
