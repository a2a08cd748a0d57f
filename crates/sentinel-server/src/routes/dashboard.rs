//! Dashboard routes: statistics, repair actions, recent activity,
//! collaborator status and the ad-hoc AI code review.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use sentinel_core::integrations::{AdvisorStatus, CodeAnalysisRequest};
use sentinel_core::types::{IncidentStats, RepairAction};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::{api_error, connector_error};
use crate::services::ActivityEvent;
use crate::state::AppState;

const DEFAULT_ACTIVITY_LIMIT: usize = 50;

/// Create dashboard router (mounted under /api)
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/actions", get(get_actions))
        .route("/activity", get(get_activity))
        .route("/ai/status", get(get_ai_status))
        .route("/ai/analyze-code", post(analyze_code))
        .route("/workflows/{execution_id}", get(get_workflow_status))
        .route("/workflows/{execution_id}/logs", get(get_workflow_logs))
}

/// Incident counts by status
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<IncidentStats>, (StatusCode, String)> {
    let stats = state.db.incident_stats().map_err(api_error)?;
    Ok(Json(stats))
}

#[derive(Debug, Serialize)]
pub struct ActionsResponse {
    pub actions: Vec<RepairAction>,
}

/// Repairs recorded against incidents
pub async fn get_actions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ActionsResponse>, (StatusCode, String)> {
    let actions = state.db.list_repair_actions().map_err(api_error)?;
    Ok(Json(ActionsResponse { actions }))
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub events: Vec<ActivityEvent>,
}

/// Recent API events, newest first
pub async fn get_activity(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActivityQuery>,
) -> Json<ActivityResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    Json(ActivityResponse {
        events: state.activity.recent(limit).await,
    })
}

/// Analysis advisor availability
pub async fn get_ai_status(State(state): State<Arc<AppState>>) -> Json<AdvisorStatus> {
    Json(state.advisor.status())
}

#[derive(Debug, Serialize)]
pub struct CodeAnalysisResponse {
    pub analysis: Option<String>,
    pub available: bool,
}

/// Review a code snippet with the analysis advisor
///
/// An unavailable advisor is reported in the body, not as an error.
pub async fn analyze_code(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CodeAnalysisRequest>, JsonRejection>,
) -> Result<Json<CodeAnalysisResponse>, (StatusCode, String)> {
    let Json(request) = payload.map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.body_text()))?;

    if !state.advisor.status().available {
        return Ok(Json(CodeAnalysisResponse {
            analysis: None,
            available: false,
        }));
    }

    let analysis = state
        .advisor
        .analyze_code(&request)
        .await
        .map_err(connector_error)?;
    Ok(Json(CodeAnalysisResponse {
        analysis,
        available: true,
    }))
}

/// Workflow execution status, proxied from the workflow engine
pub async fn get_workflow_status(
    State(state): State<Arc<AppState>>,
    Path(execution_id): Path<String>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let status = state
        .workflow
        .execution_status(&execution_id)
        .await
        .map_err(connector_error)?;
    Ok(Json(status))
}

/// Raw workflow execution logs
pub async fn get_workflow_logs(
    State(state): State<Arc<AppState>>,
    Path(execution_id): Path<String>,
) -> Result<String, (StatusCode, String)> {
    state
        .workflow
        .execution_logs(&execution_id)
        .await
        .map_err(connector_error)
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    async fn report(state: &std::sync::Arc<crate::state::AppState>, description: &str) {
        send(
            state,
            post_json(
                "/incidents",
                &json!({"title": "500 errors", "description": description, "source": "monitor"}),
            ),
        )
        .await;
    }

    #[tokio::test]
    async fn test_stats_and_actions() {
        let state = state(true);
        report(&state, "users endpoint failing").await;
        report(&state, "unfixable corruption").await;

        let stats = json_body(send(&state, get("/api/stats")).await).await;
        assert_eq!(stats["total"], 2);
        assert_eq!(stats["resolved"], 1);
        assert_eq!(stats["failed"], 1);
        assert_eq!(stats["active"], 0);
        assert_eq!(stats["actions"], 1);

        let actions = json_body(send(&state, get("/api/actions")).await).await;
        let actions = actions["actions"].as_array().unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0]["action"], "auto-repair");
        assert_eq!(actions[0]["status"], "completed");
        assert_eq!(actions[0]["notes"], "fixed");
    }

    #[tokio::test]
    async fn test_activity_newest_first() {
        let state = state(false);
        report(&state, "first").await;
        report(&state, "second").await;

        let body = json_body(send(&state, get("/api/activity?limit=1")).await).await;
        let events = body["events"].as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["kind"], "incident_processed");
    }

    #[tokio::test]
    async fn test_ai_status() {
        let state = state(false);
        let body = json_body(send(&state, get("/api/ai/status")).await).await;
        assert_eq!(body["available"], true);
        assert_eq!(body["provider"], "stub");
        assert_eq!(body["model"], "stub-1");
    }

    #[tokio::test]
    async fn test_analyze_code() {
        let state = state(false);
        let response = send(
            &state,
            post_json("/api/ai/analyze-code", &json!({"code": "x = 1 / 0"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["available"], true);
        assert_eq!(body["analysis"], "python snippet looks fine");
    }

    #[tokio::test]
    async fn test_analyze_code_without_advisor_key() {
        use sentinel_core::config::GeminiConfig;
        use sentinel_core::integrations::GeminiAdvisor;
        use sentinel_core::Database;
        use std::sync::Arc;

        let state = crate::state::AppState::new(
            crate::config::Config::default(),
            Database::open_in_memory().unwrap(),
            Arc::new(GeminiAdvisor::new(&GeminiConfig::default()).unwrap()),
            Arc::new(StubWorkflow),
            Arc::new(StubExecutor),
        );
        let response = send(
            &state,
            post_json("/api/ai/analyze-code", &json!({"code": "x = 1 / 0"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["available"], false);
        assert!(body["analysis"].is_null());
    }

    #[tokio::test]
    async fn test_analyze_code_requires_code() {
        let state = state(false);
        let response = send(&state, post_json("/api/ai/analyze-code", &json!({"language": "rust"}))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_workflow_logs_proxy() {
        let state = state(false);

        let response = send(&state, get("/api/workflows/exec-1/logs")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text_body(response).await, "INFO notify: sent");

        let response = send(&state, get("/api/workflows/exec-404/logs")).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_workflow_status_proxy() {
        let state = state(false);

        let response = send(&state, get("/api/workflows/exec-1")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["state"]["current"], "SUCCESS");

        let response = send(&state, get("/api/workflows/exec-404")).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(text_body(response).await.contains("kestra returned 404"));
    }
}
