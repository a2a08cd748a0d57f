//! Shared types for sentinel-core.
//!
//! These types are used by the orchestrator, the database layer and the HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Open key-value document attached to an incident.
pub type Metadata = Map<String, Value>;

/// Metadata key holding the advisor's incident analysis.
pub const AI_ANALYSIS_KEY: &str = "ai_analysis";
/// Metadata key holding the advisor's resolution suggestions.
pub const RESOLUTION_SUGGESTIONS_KEY: &str = "resolution_suggestions";
/// Metadata key callers use to pass raw error output for the repair step.
pub const ERROR_DETAILS_KEY: &str = "error_details";

const MAX_TITLE_LEN: usize = 256;
const MAX_SOURCE_LEN: usize = 128;
const MAX_DESCRIPTION_LEN: usize = 16_384;

// ─────────────────────────────────────────────────────────────────────────────
// Enumerations
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentSeverity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl IncidentSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for IncidentSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentSeverity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(Error::validation(format!("unknown severity: {}", other))),
        }
    }
}

/// Incident processing status.
///
/// ```text
/// PENDING ──► ANALYZING ──► PENDING            (auto-repair disabled)
///                  │
///                  └──────► REPAIRING ──► RESOLVED
///                               ▲     └─► FAILED
/// PENDING / FAILED ─────────────┘  (manual repair)
///
/// any non-terminal ──► FAILED      (fatal error)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Pending,
    Analyzing,
    Repairing,
    Resolved,
    Failed,
}

impl IncidentStatus {
    pub const ALL: [IncidentStatus; 5] = [
        Self::Pending,
        Self::Analyzing,
        Self::Repairing,
        Self::Resolved,
        Self::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Analyzing => "analyzing",
            Self::Repairing => "repairing",
            Self::Resolved => "resolved",
            Self::Failed => "failed",
        }
    }

    /// RESOLVED and FAILED end the automatic pipeline.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Failed)
    }

    /// Whether a manual repair may be started from this status.
    pub fn accepts_manual_repair(&self) -> bool {
        matches!(self, Self::Pending | Self::Failed)
    }

    /// Whether the state machine has an edge from `self` to `next`.
    ///
    /// Re-writing the current status is not an edge and is always accepted.
    pub fn can_transition_to(&self, next: IncidentStatus) -> bool {
        use IncidentStatus::*;

        if *self == next {
            return true;
        }
        if next == Failed && !self.is_terminal() {
            return true;
        }
        matches!(
            (self, next),
            (Pending, Analyzing)
                | (Analyzing, Pending)
                | (Analyzing, Repairing)
                | (Pending, Repairing)
                | (Failed, Repairing)
                | (Repairing, Resolved)
                | (Repairing, Failed)
        )
    }

    /// Validate a transition, returning `InvalidTransition` when no edge exists.
    pub fn ensure_transition(&self, next: IncidentStatus) -> Result<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(Error::invalid_transition(*self, next))
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "analyzing" => Ok(Self::Analyzing),
            "repairing" => Ok(Self::Repairing),
            "resolved" => Ok(Self::Resolved),
            "failed" => Ok(Self::Failed),
            other => Err(Error::validation(format!("unknown status: {}", other))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entity Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: IncidentSeverity,
    pub status: IncidentStatus,
    pub source: String,
    pub resolution: Option<String>,
    pub workflow_execution_id: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Incident {
    /// Render `metadata["error_details"]` for the resolution advisor.
    pub fn error_details(&self) -> Option<String> {
        self.metadata.get(ERROR_DETAILS_KEY).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Aggregate counts over all incidents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentStats {
    pub total: u32,
    pub pending: u32,
    pub analyzing: u32,
    pub repairing: u32,
    pub resolved: u32,
    pub failed: u32,
    /// pending + analyzing + repairing
    pub active: u32,
    /// repairing + resolved
    pub actions: u32,
}

/// A repair recorded against an incident, derived from its resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairAction {
    pub incident_id: String,
    pub action: String,
    pub status: String,
    pub notes: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Input Types
// ─────────────────────────────────────────────────────────────────────────────

/// Intake request for a new incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub severity: IncidentSeverity,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl IncidentRequest {
    /// Reject malformed intake before any record is created.
    pub fn validate(&self) -> Result<()> {
        validate_text("title", &self.title, MAX_TITLE_LEN)?;
        validate_text("description", &self.description, MAX_DESCRIPTION_LEN)?;
        validate_text("source", &self.source, MAX_SOURCE_LEN)?;
        Ok(())
    }
}

fn validate_text(field: &str, value: &str, max_len: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{} is required", field)));
    }
    if value.chars().count() > max_len {
        return Err(Error::validation(format!(
            "{} must be {} characters or less",
            field, max_len
        )));
    }
    Ok(())
}

/// A partial mutation applied by `IncidentRepository::update`.
///
/// Metadata entries are merged into the stored document; existing keys not
/// named here are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentUpdate {
    pub status: Option<IncidentStatus>,
    pub resolution: Option<String>,
    pub workflow_execution_id: Option<String>,
    pub metadata: Metadata,
}

impl IncidentUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(status: IncidentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }

    pub fn with_workflow_execution_id(mut self, execution_id: impl Into<String>) -> Self {
        self.workflow_execution_id = Some(execution_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
