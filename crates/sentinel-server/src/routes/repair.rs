//! Manual repair triggers: repair an existing incident, or file a bug fix
//! request that runs through the full pipeline.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use sentinel_core::types::Metadata;
use sentinel_core::{Incident, IncidentRequest, IncidentSeverity};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::error;

use super::{api_error, incidents::process_incident};
use crate::services::ActivityKind;
use crate::state::AppState;

/// Create repair router
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/repair", post(trigger_repair))
        .route("/api/cline/fix-bug", post(fix_bug))
}

const FIX_BUG_TITLE: &str = "Manual Bug Fix Request";
const FIX_BUG_SOURCE: &str = "manual_cline";

#[derive(Debug, Deserialize)]
pub struct RepairRequest {
    #[serde(default)]
    pub incident_id: String,
}

#[derive(Debug, Serialize)]
pub struct RepairResponse {
    pub status: String,
    pub incident: Incident,
}

/// Start a repair for a PENDING or FAILED incident
pub async fn trigger_repair(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RepairRequest>, JsonRejection>,
) -> Result<Json<RepairResponse>, (StatusCode, String)> {
    let Json(req) = payload.map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.body_text()))?;

    let incident_id = req.incident_id.trim().to_string();
    if incident_id.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "incident_id is required".to_string()));
    }

    let orchestrator = state.orchestrator.clone();
    let id = incident_id.clone();
    let result = tokio::spawn(async move { orchestrator.trigger_repair(&id).await })
        .await
        .map_err(|e| {
            error!(incident_id = %incident_id, error = %e, "Repair task panicked");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    match result {
        Ok(incident) => {
            state
                .activity
                .record(
                    ActivityKind::RepairTriggered,
                    Some(&incident.id),
                    format!("Repair finished as {}", incident.status),
                )
                .await;
            Ok(Json(RepairResponse {
                status: "repair_triggered".to_string(),
                incident,
            }))
        }
        Err(e) => {
            if !e.is_not_found() {
                state
                    .activity
                    .record(ActivityKind::RepairFailed, Some(&incident_id), e.to_string())
                    .await;
            }
            Err(api_error(e))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FixBugRequest {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub files: Vec<String>,
}

impl From<FixBugRequest> for IncidentRequest {
    fn from(req: FixBugRequest) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(
            "files".to_string(),
            Value::Array(req.files.into_iter().map(Value::String).collect()),
        );

        IncidentRequest {
            title: FIX_BUG_TITLE.to_string(),
            description: req.description,
            severity: IncidentSeverity::Medium,
            source: FIX_BUG_SOURCE.to_string(),
            metadata: Some(metadata),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FixBugResponse {
    pub status: String,
    pub incident_id: String,
    pub message: String,
}

/// File a bug fix request as an incident and run the pipeline on it
pub async fn fix_bug(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FixBugRequest>, JsonRejection>,
) -> Result<Json<FixBugResponse>, (StatusCode, String)> {
    let Json(req) = payload.map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.body_text()))?;
    let incident = process_incident(&state, req.into()).await?;

    Ok(Json(FixBugResponse {
        status: "success".to_string(),
        incident_id: incident.id,
        message: "Bug fix initiated".to_string(),
    }))
}
