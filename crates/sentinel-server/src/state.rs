//! Application state.

use sentinel_core::integrations::{AnalysisAdvisor, RepairExecutor, WorkflowTrigger};
use sentinel_core::{Database, IncidentOrchestrator};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::services::ActivityLog;

/// Shared application state
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Database connection
    pub db: Arc<Database>,
    /// Incident lifecycle pipeline
    pub orchestrator: Arc<IncidentOrchestrator>,
    /// Analysis advisor, for the AI status endpoint
    pub advisor: Arc<dyn AnalysisAdvisor>,
    /// Workflow engine, for execution status lookups
    pub workflow: Arc<dyn WorkflowTrigger>,
    /// Recent API events
    pub activity: Arc<ActivityLog>,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: Config,
        db: Database,
        advisor: Arc<dyn AnalysisAdvisor>,
        workflow: Arc<dyn WorkflowTrigger>,
        executor: Arc<dyn RepairExecutor>,
    ) -> Arc<Self> {
        let db = Arc::new(db);
        let orchestrator = Arc::new(IncidentOrchestrator::new(
            db.clone(),
            Arc::clone(&advisor),
            Arc::clone(&workflow),
            executor,
            config.sentinel.orchestrator.to_orchestrator_config(),
        ));

        Arc::new(Self {
            activity: Arc::new(ActivityLog::new(config.activity_capacity)),
            config: Arc::new(config),
            db,
            orchestrator,
            advisor,
            workflow,
            start_time: Instant::now(),
        })
    }
}
