//! Incident intake and lookup routes.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use sentinel_core::{Incident, IncidentRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use super::{api_error, pipeline_error};
use crate::services::ActivityKind;
use crate::state::AppState;

const DEFAULT_LIMIT: u32 = 100;
const MAX_LIMIT: u32 = 1000;

/// Create incident router
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/incidents", get(list_incidents).post(create_incident))
        .route("/incidents/{id}", get(get_incident).delete(delete_incident))
}

/// Report a new incident and run it through the pipeline
pub async fn create_incident(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IncidentRequest>, JsonRejection>,
) -> Result<Json<Incident>, (StatusCode, String)> {
    let Json(request) = payload.map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.body_text()))?;
    let incident = process_incident(&state, request).await?;
    Ok(Json(incident))
}

/// Validate, then run the pipeline and record the outcome
///
/// The pipeline runs in its own task so a client disconnect does not cancel
/// it half way.
pub(super) async fn process_incident(
    state: &Arc<AppState>,
    request: IncidentRequest,
) -> Result<Incident, (StatusCode, String)> {
    request.validate().map_err(pipeline_error)?;

    let orchestrator = state.orchestrator.clone();
    let result = tokio::spawn(async move { orchestrator.process(request).await })
        .await
        .map_err(|e| {
            error!(error = %e, "Incident pipeline task panicked");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    match result {
        Ok(incident) => {
            state
                .activity
                .record(
                    ActivityKind::IncidentProcessed,
                    Some(&incident.id),
                    format!("{} ({})", incident.title, incident.status),
                )
                .await;
            Ok(incident)
        }
        Err(e) => {
            state
                .activity
                .record(ActivityKind::IncidentFailed, None, e.to_string())
                .await;
            Err(pipeline_error(e))
        }
    }
}

/// Get incident by ID
pub async fn get_incident(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Incident>, (StatusCode, String)> {
    let incident = state
        .db
        .get_incident(&id)
        .map_err(api_error)?
        .ok_or((StatusCode::NOT_FOUND, "Incident not found".to_string()))?;

    Ok(Json(incident))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

/// List incidents, newest first
pub async fn list_incidents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Incident>>, (StatusCode, String)> {
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let incidents = state.db.list_incidents(skip, limit).map_err(api_error)?;
    Ok(Json(incidents))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub status: String,
    pub incident_id: String,
}

/// Delete an incident
pub async fn delete_incident(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, (StatusCode, String)> {
    let deleted = state.db.delete_incident(&id).map_err(api_error)?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "Incident not found".to_string()));
    }

    state
        .activity
        .record(ActivityKind::IncidentDeleted, Some(&id), "Incident deleted")
        .await;

    Ok(Json(DeleteResponse {
        status: "deleted".to_string(),
        incident_id: id,
    }))
}
