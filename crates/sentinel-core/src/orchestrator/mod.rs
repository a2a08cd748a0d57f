//! Incident lifecycle orchestrator.
//!
//! Drives a new incident through intake, analysis, workflow notification and
//! the optional repair branch, classifying every collaborator failure as
//! tolerable or fatal.
//!
//! ## Pipeline
//!
//! ```text
//! create (PENDING) ──► ANALYZING ──► advisor.analyze      (tolerable)
//!                                ──► workflow.trigger     (tolerable, bounded)
//!                                ──► auto-repair?
//!                                      no  ──► PENDING
//!                                      yes ──► REPAIRING ──► advisor.suggest (tolerable)
//!                                                        ──► executor.repair (bounded)
//!                                                              ──► RESOLVED / FAILED
//! ```
//!
//! Repository failures after creation are fatal: the incident is forced to
//! FAILED and the error is returned to the caller.

mod locks;
#[cfg(test)]
mod tests;

use locks::IncidentLocks;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::{ConnectorError, Error, Result};
use crate::integrations::{
    AnalysisAdvisor, AnalysisRequest, RepairExecutor, RepairOutcome, RepairRequest,
    SuggestionRequest, WorkflowTrigger,
};
use crate::repository::IncidentRepository;
use crate::types::{
    Incident, IncidentRequest, IncidentStatus, IncidentUpdate, AI_ANALYSIS_KEY,
    RESOLUTION_SUGGESTIONS_KEY,
};

/// Resolution text when the executor succeeds without output
pub const DEFAULT_REPAIR_RESOLUTION: &str = "Auto-repaired successfully";

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// What happens to an incident when the repair executor call itself errors
/// (as opposed to reporting a failed repair).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairErrorPolicy {
    /// Mark the incident FAILED with an "Auto-repair error" resolution.
    #[default]
    Fail,
    /// Leave the incident in REPAIRING.
    LeaveRepairing,
}

impl RepairErrorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::LeaveRepairing => "leave_repairing",
        }
    }
}

impl fmt::Display for RepairErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepairErrorPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "fail" => Ok(Self::Fail),
            "leave_repairing" => Ok(Self::LeaveRepairing),
            other => Err(Error::Config(format!(
                "repair_error_policy must be 'fail' or 'leave_repairing', got '{}'",
                other
            ))),
        }
    }
}

/// Runtime settings for `IncidentOrchestrator`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    pub auto_repair_enabled: bool,
    pub workflow_timeout: Duration,
    pub repair_timeout: Duration,
    pub repair_error_policy: RepairErrorPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            auto_repair_enabled: false,
            workflow_timeout: Duration::from_secs(30),
            repair_timeout: Duration::from_secs(300),
            repair_error_policy: RepairErrorPolicy::Fail,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the incident state machine.
///
/// Holds a per-incident lock for the whole pipeline after creation and for
/// every manual repair, so the two never interleave on one id within this
/// process.
pub struct IncidentOrchestrator {
    repository: Arc<dyn IncidentRepository>,
    advisor: Arc<dyn AnalysisAdvisor>,
    workflow: Arc<dyn WorkflowTrigger>,
    executor: Arc<dyn RepairExecutor>,
    config: OrchestratorConfig,
    locks: IncidentLocks,
}

impl IncidentOrchestrator {
    pub fn new(
        repository: Arc<dyn IncidentRepository>,
        advisor: Arc<dyn AnalysisAdvisor>,
        workflow: Arc<dyn WorkflowTrigger>,
        executor: Arc<dyn RepairExecutor>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            repository,
            advisor,
            workflow,
            executor,
            config,
            locks: IncidentLocks::new(),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run a new incident through the full pipeline.
    ///
    /// Returns the incident in PENDING, RESOLVED or FAILED (or REPAIRING under
    /// `RepairErrorPolicy::LeaveRepairing`). Validation and creation errors
    /// propagate with no record written.
    pub async fn process(&self, request: IncidentRequest) -> Result<Incident> {
        request.validate()?;

        info!(title = %request.title, severity = %request.severity, "Processing new incident");
        let incident = self.repository.create(&request).await?;
        let incident_id = incident.id.clone();

        let _guard = self.locks.acquire(&incident_id).await;

        match self.run_pipeline(incident, &request).await {
            Ok(incident) => {
                info!(incident_id = %incident_id, status = %incident.status, "Incident processed");
                Ok(incident)
            }
            Err(e) => {
                error!(incident_id = %incident_id, error = %e, "Error processing incident");
                self.mark_failed(&incident_id, format!("Processing failed: {}", e))
                    .await;
                Err(e)
            }
        }
    }

    /// Manually start a repair for a PENDING or FAILED incident.
    pub async fn trigger_repair(&self, incident_id: &str) -> Result<Incident> {
        let _guard = self.locks.acquire(incident_id).await;

        let incident = self
            .repository
            .get(incident_id)
            .await?
            .ok_or_else(|| Error::IncidentNotFound(incident_id.to_string()))?;

        if !incident.status.accepts_manual_repair() {
            return Err(Error::invalid_transition(
                incident.status,
                IncidentStatus::Repairing,
            ));
        }

        info!(incident_id, from = %incident.status, "Manual repair triggered");

        match self.attempt_repair(incident).await {
            Ok(incident) => Ok(incident),
            Err(e) => {
                error!(incident_id, error = %e, "Manual repair failed");
                self.mark_failed(incident_id, format!("Repair failed: {}", e))
                    .await;
                Err(e)
            }
        }
    }

    async fn run_pipeline(&self, incident: Incident, request: &IncidentRequest) -> Result<Incident> {
        let id = incident.id.clone();

        let mut incident = self
            .set_status(&id, IncidentStatus::Analyzing)
            .await?;

        // Analysis (tolerable)
        let analysis = AnalysisRequest {
            title: request.title.clone(),
            description: request.description.clone(),
            severity: request.severity,
            context: request.metadata.clone().unwrap_or_default(),
        };
        match self.advisor.analyze_incident(&analysis).await {
            Ok(Some(text)) => {
                info!(incident_id = %id, "Generated AI analysis");
                incident = self
                    .repository
                    .update(&id, &IncidentUpdate::new().with_metadata(AI_ANALYSIS_KEY, text))
                    .await?;
            }
            Ok(None) => debug!(incident_id = %id, "No AI analysis available"),
            Err(e) => warn!(incident_id = %id, error = %e, "AI analysis unavailable"),
        }

        // Workflow notification (tolerable, bounded)
        let payload = serde_json::to_value(request)?;
        let triggered = tokio::time::timeout(
            self.config.workflow_timeout,
            self.workflow.trigger_incident_flow(&id, &payload),
        )
        .await
        .unwrap_or_else(|_| Err(ConnectorError::Timeout(self.config.workflow_timeout)));

        match triggered {
            Ok(execution_id) => {
                info!(incident_id = %id, execution_id = %execution_id, "Workflow triggered");
                incident = self
                    .repository
                    .update(
                        &id,
                        &IncidentUpdate::new().with_workflow_execution_id(execution_id),
                    )
                    .await?;
            }
            Err(e) => warn!(incident_id = %id, error = %e, "Workflow trigger unavailable"),
        }

        if self.config.auto_repair_enabled {
            self.attempt_repair(incident).await
        } else {
            self.set_status(&id, IncidentStatus::Pending).await
        }
    }

    /// Repair subroutine shared by the automatic pipeline and manual triggers.
    ///
    /// Executor call errors are absorbed here according to the configured
    /// policy; repository errors propagate.
    async fn attempt_repair(&self, incident: Incident) -> Result<Incident> {
        let id = incident.id.clone();
        info!(incident_id = %id, "Attempting repair");

        let mut incident = self.set_status(&id, IncidentStatus::Repairing).await?;

        // Suggestions (tolerable)
        let suggestions = match self
            .advisor
            .suggest_resolution(&SuggestionRequest::from(&incident))
            .await
        {
            Ok(Some(text)) => {
                info!(incident_id = %id, "Generated resolution suggestions");
                incident = self
                    .repository
                    .update(
                        &id,
                        &IncidentUpdate::new().with_metadata(RESOLUTION_SUGGESTIONS_KEY, text.clone()),
                    )
                    .await?;
                Some(text)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(incident_id = %id, error = %e, "Resolution suggestions unavailable");
                None
            }
        };

        let repair = RepairRequest {
            incident_id: id.clone(),
            description: incident.description.clone(),
            suggestions,
        };
        let outcome = tokio::time::timeout(
            self.config.repair_timeout,
            self.executor.execute_repair(&repair),
        )
        .await
        .unwrap_or_else(|_| {
            Ok(RepairOutcome::failed(
                ConnectorError::Timeout(self.config.repair_timeout).to_string(),
            ))
        });

        match outcome {
            Ok(outcome) if outcome.success => {
                let resolution = outcome
                    .resolution
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_REPAIR_RESOLUTION.to_string());
                info!(incident_id = %id, "Repair succeeded");
                self.repository
                    .update(
                        &id,
                        &IncidentUpdate::status(IncidentStatus::Resolved).with_resolution(resolution),
                    )
                    .await
            }
            Ok(outcome) => {
                let reason = outcome.error.unwrap_or_else(|| "unknown error".to_string());
                warn!(incident_id = %id, error = %reason, "Repair reported failure");
                self.repository
                    .update(
                        &id,
                        &IncidentUpdate::status(IncidentStatus::Failed)
                            .with_resolution(format!("Auto-repair failed: {}", reason)),
                    )
                    .await
            }
            Err(e) => {
                error!(incident_id = %id, error = %e, policy = %self.config.repair_error_policy, "Repair executor error");
                match self.config.repair_error_policy {
                    RepairErrorPolicy::Fail => {
                        self.repository
                            .update(
                                &id,
                                &IncidentUpdate::status(IncidentStatus::Failed)
                                    .with_resolution(format!("Auto-repair error: {}", e)),
                            )
                            .await
                    }
                    RepairErrorPolicy::LeaveRepairing => Ok(incident),
                }
            }
        }
    }

    async fn set_status(&self, incident_id: &str, status: IncidentStatus) -> Result<Incident> {
        debug!(incident_id, status = %status, "Status transition");
        self.repository
            .update(incident_id, &IncidentUpdate::status(status))
            .await
    }

    /// Best-effort transition to FAILED after a fatal error.
    async fn mark_failed(&self, incident_id: &str, resolution: String) {
        let update = IncidentUpdate::status(IncidentStatus::Failed).with_resolution(resolution);
        if let Err(e) = self.repository.update(incident_id, &update).await {
            error!(incident_id, error = %e, "Failed to mark incident as failed");
        }
    }
}
