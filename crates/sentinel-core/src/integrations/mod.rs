//! External collaborators of the incident pipeline.
//!
//! The orchestrator only sees the traits in this module. One concrete adapter
//! ships for each:
//!
//! - [`gemini::GeminiAdvisor`] - incident analysis and resolution suggestions
//! - [`kestra::KestraTrigger`] - workflow execution trigger
//! - [`cline::ClineExecutor`] - automated repair via the Cline CLI

pub mod cline;
pub mod gemini;
pub mod kestra;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConnectorResult;
use crate::types::{Incident, IncidentSeverity, Metadata};

pub use cline::ClineExecutor;
pub use gemini::GeminiAdvisor;
pub use kestra::KestraTrigger;

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response Types
// ─────────────────────────────────────────────────────────────────────────────

/// Input for an incident analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub title: String,
    pub description: String,
    pub severity: IncidentSeverity,
    pub context: Metadata,
}

/// Input for resolution suggestions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionRequest {
    pub title: String,
    pub description: String,
    pub error_details: Option<String>,
}

impl From<&Incident> for SuggestionRequest {
    fn from(incident: &Incident) -> Self {
        Self {
            title: incident.title.clone(),
            description: incident.description.clone(),
            error_details: incident.error_details(),
        }
    }
}

/// Input for a standalone code review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeAnalysisRequest {
    pub code: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub context: Option<String>,
}

fn default_language() -> String {
    "python".to_string()
}

/// Advisor availability as reported on the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorStatus {
    pub available: bool,
    pub provider: String,
    pub model: Option<String>,
}

/// Input for a repair attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairRequest {
    pub incident_id: String,
    pub description: String,
    pub suggestions: Option<String>,
}

/// Result of a repair attempt that ran to completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairOutcome {
    pub success: bool,
    pub resolution: Option<String>,
    pub error: Option<String>,
}

impl RepairOutcome {
    pub fn succeeded(resolution: impl Into<String>) -> Self {
        Self {
            success: true,
            resolution: Some(resolution.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            resolution: None,
            error: Some(error.into()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Collaborator Traits
// ─────────────────────────────────────────────────────────────────────────────

/// AI analysis backend.
///
/// `Ok(None)` means the advisor had nothing to say (including when it is not
/// configured). Errors are treated as "unavailable" by the orchestrator.
#[async_trait]
pub trait AnalysisAdvisor: Send + Sync {
    async fn analyze_incident(&self, request: &AnalysisRequest) -> ConnectorResult<Option<String>>;

    async fn suggest_resolution(&self, request: &SuggestionRequest)
    -> ConnectorResult<Option<String>>;

    /// Review a code snippet outside any incident.
    async fn analyze_code(&self, request: &CodeAnalysisRequest) -> ConnectorResult<Option<String>>;

    fn status(&self) -> AdvisorStatus;
}

/// External workflow engine.
#[async_trait]
pub trait WorkflowTrigger: Send + Sync {
    /// Start the incident flow, returning the execution handle.
    async fn trigger_incident_flow(&self, incident_id: &str, payload: &Value) -> ConnectorResult<String>;

    async fn execution_status(&self, execution_id: &str) -> ConnectorResult<Value>;

    /// Raw log output of an execution.
    async fn execution_logs(&self, execution_id: &str) -> ConnectorResult<String>;
}

/// Automated repair backend.
///
/// A repair that runs and fails is an `Ok` outcome with `success: false`.
/// `Err` means the executor itself could not be run.
#[async_trait]
pub trait RepairExecutor: Send + Sync {
    async fn execute_repair(&self, request: &RepairRequest) -> ConnectorResult<RepairOutcome>;
}
