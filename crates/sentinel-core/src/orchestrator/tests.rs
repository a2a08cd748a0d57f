use super::*;
use crate::db::Database;
use crate::error::ConnectorResult;
use crate::integrations::{AdvisorStatus, CodeAnalysisRequest};
use crate::types::{IncidentSeverity, Metadata, ERROR_DETAILS_KEY};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Mutex;

// ─────────────────────────────────────────────────────────────────────────────
// Fakes
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory database with injectable failures.
struct FakeRepository {
    db: Database,
    fail_create: bool,
    fail_on_status: Option<IncidentStatus>,
}

impl FakeRepository {
    fn new() -> Self {
        Self {
            db: Database::open_in_memory().unwrap(),
            fail_create: false,
            fail_on_status: None,
        }
    }

    fn injected() -> Error {
        Error::Database(rusqlite::Error::QueryReturnedNoRows)
    }
}

#[async_trait]
impl IncidentRepository for FakeRepository {
    async fn create(&self, request: &IncidentRequest) -> Result<Incident> {
        if self.fail_create {
            return Err(Self::injected());
        }
        self.db.create_incident(request)
    }

    async fn get(&self, incident_id: &str) -> Result<Option<Incident>> {
        self.db.get_incident(incident_id)
    }

    async fn list(&self, skip: u32, limit: u32) -> Result<Vec<Incident>> {
        self.db.list_incidents(skip, limit)
    }

    async fn update(&self, incident_id: &str, update: &IncidentUpdate) -> Result<Incident> {
        if self.fail_on_status.is_some() && update.status == self.fail_on_status {
            return Err(Self::injected());
        }
        self.db.update_incident(incident_id, update)
    }

    async fn delete(&self, incident_id: &str) -> Result<bool> {
        self.db.delete_incident(incident_id)
    }
}

#[derive(Clone)]
enum Reply {
    Text(&'static str),
    Nothing,
    Fail,
}

struct FakeAdvisor {
    analysis: Reply,
    suggestions: Reply,
    last_analysis: Mutex<Option<AnalysisRequest>>,
    last_suggestion: Mutex<Option<SuggestionRequest>>,
}

impl FakeAdvisor {
    fn new(analysis: Reply, suggestions: Reply) -> Self {
        Self {
            analysis,
            suggestions,
            last_analysis: Mutex::new(None),
            last_suggestion: Mutex::new(None),
        }
    }

    fn reply(reply: &Reply) -> ConnectorResult<Option<String>> {
        match reply {
            Reply::Text(text) => Ok(Some(text.to_string())),
            Reply::Nothing => Ok(None),
            Reply::Fail => Err(ConnectorError::NotConfigured("fake advisor")),
        }
    }
}

#[async_trait]
impl AnalysisAdvisor for FakeAdvisor {
    async fn analyze_incident(&self, request: &AnalysisRequest) -> ConnectorResult<Option<String>> {
        *self.last_analysis.lock().unwrap() = Some(request.clone());
        Self::reply(&self.analysis)
    }

    async fn suggest_resolution(
        &self,
        request: &SuggestionRequest,
    ) -> ConnectorResult<Option<String>> {
        *self.last_suggestion.lock().unwrap() = Some(request.clone());
        Self::reply(&self.suggestions)
    }

    async fn analyze_code(&self, _request: &CodeAnalysisRequest) -> ConnectorResult<Option<String>> {
        Self::reply(&self.analysis)
    }

    fn status(&self) -> AdvisorStatus {
        AdvisorStatus {
            available: true,
            provider: "fake".to_string(),
            model: None,
        }
    }
}

enum WorkflowBehavior {
    Start(&'static str),
    Fail,
    Hang,
}

struct FakeWorkflow {
    behavior: WorkflowBehavior,
    /// (incident_id, payload) per trigger call
    triggers: Mutex<Vec<(String, Value)>>,
}

impl FakeWorkflow {
    fn new(behavior: WorkflowBehavior) -> Self {
        Self {
            behavior,
            triggers: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl WorkflowTrigger for FakeWorkflow {
    async fn trigger_incident_flow(&self, incident_id: &str, payload: &Value) -> ConnectorResult<String> {
        self.triggers
            .lock()
            .unwrap()
            .push((incident_id.to_string(), payload.clone()));
        match self.behavior {
            WorkflowBehavior::Start(id) => Ok(id.to_string()),
            WorkflowBehavior::Fail => Err(ConnectorError::Status {
                service: "kestra",
                status: 503,
                body: "unavailable".to_string(),
            }),
            WorkflowBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok("too-late".to_string())
            }
        }
    }

    async fn execution_status(&self, execution_id: &str) -> ConnectorResult<Value> {
        Ok(json!({"id": execution_id}))
    }

    async fn execution_logs(&self, execution_id: &str) -> ConnectorResult<String> {
        Ok(format!("logs for {}", execution_id))
    }
}

enum ExecutorBehavior {
    Succeed(Option<&'static str>),
    Fail(&'static str),
    Error,
    Hang,
    Slow(Duration),
}

struct FakeExecutor {
    behavior: ExecutorBehavior,
    requests: Mutex<Vec<RepairRequest>>,
}

impl FakeExecutor {
    fn new(behavior: ExecutorBehavior) -> Self {
        Self {
            behavior,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RepairExecutor for FakeExecutor {
    async fn execute_repair(&self, request: &RepairRequest) -> ConnectorResult<RepairOutcome> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.behavior {
            ExecutorBehavior::Succeed(Some(text)) => Ok(RepairOutcome::succeeded(*text)),
            ExecutorBehavior::Succeed(None) => Ok(RepairOutcome {
                success: true,
                resolution: None,
                error: None,
            }),
            ExecutorBehavior::Fail(reason) => Ok(RepairOutcome::failed(*reason)),
            ExecutorBehavior::Error => Err(ConnectorError::Process("cline: not found".to_string())),
            ExecutorBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(RepairOutcome::succeeded("too late"))
            }
            ExecutorBehavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(RepairOutcome::succeeded("fixed"))
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Harness
// ─────────────────────────────────────────────────────────────────────────────

struct Harness {
    repository: Arc<FakeRepository>,
    advisor: Arc<FakeAdvisor>,
    workflow: Arc<FakeWorkflow>,
    executor: Arc<FakeExecutor>,
    orchestrator: Arc<IncidentOrchestrator>,
}

struct Setup {
    repository: FakeRepository,
    advisor: FakeAdvisor,
    workflow: WorkflowBehavior,
    executor: ExecutorBehavior,
    config: OrchestratorConfig,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            repository: FakeRepository::new(),
            advisor: FakeAdvisor::new(Reply::Text("analysis"), Reply::Text("roll back")),
            workflow: WorkflowBehavior::Start("exec-1"),
            executor: ExecutorBehavior::Succeed(Some("fixed")),
            config: OrchestratorConfig::default(),
        }
    }
}

impl Setup {
    fn auto_repair(mut self) -> Self {
        self.config.auto_repair_enabled = true;
        self
    }

    fn build(self) -> Harness {
        let repository = Arc::new(self.repository);
        let advisor = Arc::new(self.advisor);
        let workflow = Arc::new(FakeWorkflow::new(self.workflow));
        let executor = Arc::new(FakeExecutor::new(self.executor));
        let orchestrator = Arc::new(IncidentOrchestrator::new(
            repository.clone(),
            advisor.clone(),
            workflow.clone(),
            executor.clone(),
            self.config,
        ));
        Harness {
            repository,
            advisor,
            workflow,
            executor,
            orchestrator,
        }
    }
}

fn request() -> IncidentRequest {
    IncidentRequest {
        title: "500 errors".to_string(),
        description: "The /api/users endpoint is throwing server errors".to_string(),
        severity: IncidentSeverity::High,
        source: "monitor".to_string(),
        metadata: None,
    }
}

fn request_with_metadata(metadata: Value) -> IncidentRequest {
    IncidentRequest {
        metadata: Some(metadata.as_object().cloned().unwrap()),
        ..request()
    }
}

fn stored(harness: &Harness, id: &str) -> Incident {
    harness.repository.db.get_incident(id).unwrap().unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Automatic pipeline
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_auto_repair_disabled_ends_pending() {
    let harness = Setup::default().build();

    let incident = harness.orchestrator.process(request()).await.unwrap();

    assert_eq!(incident.status, IncidentStatus::Pending);
    assert!(incident.resolution.is_none());
    assert_eq!(incident.workflow_execution_id.as_deref(), Some("exec-1"));
    assert_eq!(incident.metadata[AI_ANALYSIS_KEY], json!("analysis"));
    assert_eq!(stored(&harness, &incident.id), incident);
    assert!(harness.executor.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_collaborators_receive_incident_data() {
    let harness = Setup::default().build();

    let incident = harness
        .orchestrator
        .process(request_with_metadata(json!({"error_count": 150, "region": "eu"})))
        .await
        .unwrap();

    let analysis = harness.advisor.last_analysis.lock().unwrap().clone().unwrap();
    assert_eq!(analysis.title, "500 errors");
    assert_eq!(analysis.description, "The /api/users endpoint is throwing server errors");
    assert_eq!(analysis.severity, IncidentSeverity::High);
    assert_eq!(analysis.context["error_count"], json!(150));
    assert_eq!(analysis.context["region"], json!("eu"));

    let triggers = harness.workflow.triggers.lock().unwrap();
    assert_eq!(triggers.len(), 1);
    let (incident_id, payload) = &triggers[0];
    assert_eq!(incident_id, &incident.id);
    assert_eq!(
        payload,
        &json!({
            "title": "500 errors",
            "description": "The /api/users endpoint is throwing server errors",
            "severity": "high",
            "source": "monitor",
            "metadata": {"error_count": 150, "region": "eu"}
        })
    );
}

#[tokio::test]
async fn test_collaborator_failures_do_not_change_final_status() {
    for auto_repair in [false, true] {
        let healthy = Setup::default();
        let degraded = Setup {
            advisor: FakeAdvisor::new(Reply::Fail, Reply::Fail),
            workflow: WorkflowBehavior::Fail,
            ..Setup::default()
        };
        let (healthy, degraded) = if auto_repair {
            (healthy.auto_repair(), degraded.auto_repair())
        } else {
            (healthy, degraded)
        };

        let expected = healthy.build().orchestrator.process(request()).await.unwrap();
        let actual = degraded.build().orchestrator.process(request()).await.unwrap();

        assert_eq!(actual.status, expected.status, "auto_repair = {}", auto_repair);
        assert!(actual.workflow_execution_id.is_none());
        assert!(!actual.metadata.contains_key(AI_ANALYSIS_KEY));
        assert!(!actual.metadata.contains_key(RESOLUTION_SUGGESTIONS_KEY));
    }
}

#[tokio::test]
async fn test_advisor_returning_nothing_is_not_recorded() {
    let harness = Setup {
        advisor: FakeAdvisor::new(Reply::Nothing, Reply::Nothing),
        ..Setup::default()
    }
    .auto_repair()
    .build();

    let incident = harness.orchestrator.process(request()).await.unwrap();

    assert_eq!(incident.status, IncidentStatus::Resolved);
    assert!(!incident.metadata.contains_key(AI_ANALYSIS_KEY));
    let requests = harness.executor.requests.lock().unwrap();
    assert!(requests[0].suggestions.is_none());
}

#[tokio::test]
async fn test_workflow_timeout_is_tolerated() {
    let mut setup = Setup {
        workflow: WorkflowBehavior::Hang,
        ..Setup::default()
    }
    .auto_repair();
    setup.config.workflow_timeout = Duration::from_millis(50);
    let harness = setup.build();

    let incident = harness.orchestrator.process(request()).await.unwrap();

    assert_eq!(incident.status, IncidentStatus::Resolved);
    assert!(incident.workflow_execution_id.is_none());
}

#[tokio::test]
async fn test_auto_repair_success_resolves() {
    let harness = Setup::default().auto_repair().build();

    let incident = harness.orchestrator.process(request()).await.unwrap();

    assert_eq!(incident.status, IncidentStatus::Resolved);
    assert_eq!(incident.resolution.as_deref(), Some("fixed"));
    assert_eq!(incident.metadata[RESOLUTION_SUGGESTIONS_KEY], json!("roll back"));

    let requests = harness.executor.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].incident_id, incident.id);
    assert_eq!(requests[0].description, incident.description);
    assert_eq!(requests[0].suggestions.as_deref(), Some("roll back"));
}

#[tokio::test]
async fn test_auto_repair_success_without_text_uses_default() {
    let harness = Setup {
        executor: ExecutorBehavior::Succeed(None),
        ..Setup::default()
    }
    .auto_repair()
    .build();

    let incident = harness.orchestrator.process(request()).await.unwrap();

    assert_eq!(incident.status, IncidentStatus::Resolved);
    assert_eq!(incident.resolution.as_deref(), Some(DEFAULT_REPAIR_RESOLUTION));
}

#[tokio::test]
async fn test_auto_repair_reported_failure_fails() {
    let harness = Setup {
        executor: ExecutorBehavior::Fail("tests still failing"),
        ..Setup::default()
    }
    .auto_repair()
    .build();

    let incident = harness.orchestrator.process(request()).await.unwrap();

    assert_eq!(incident.status, IncidentStatus::Failed);
    assert_eq!(
        incident.resolution.as_deref(),
        Some("Auto-repair failed: tests still failing")
    );
}

#[tokio::test]
async fn test_repair_timeout_fails() {
    let mut setup = Setup {
        executor: ExecutorBehavior::Hang,
        ..Setup::default()
    }
    .auto_repair();
    setup.config.repair_timeout = Duration::from_millis(50);
    let harness = setup.build();

    let incident = harness.orchestrator.process(request()).await.unwrap();

    assert_eq!(incident.status, IncidentStatus::Failed);
    let resolution = incident.resolution.unwrap();
    assert!(resolution.starts_with("Auto-repair failed: Timed out"));
}

#[tokio::test]
async fn test_executor_error_fails_by_default() {
    let harness = Setup {
        executor: ExecutorBehavior::Error,
        ..Setup::default()
    }
    .auto_repair()
    .build();

    let incident = harness.orchestrator.process(request()).await.unwrap();

    assert_eq!(incident.status, IncidentStatus::Failed);
    assert_eq!(
        incident.resolution.as_deref(),
        Some("Auto-repair error: Process error: cline: not found")
    );
}

#[tokio::test]
async fn test_executor_error_can_leave_repairing() {
    let mut setup = Setup {
        executor: ExecutorBehavior::Error,
        ..Setup::default()
    }
    .auto_repair();
    setup.config.repair_error_policy = RepairErrorPolicy::LeaveRepairing;
    let harness = setup.build();

    let incident = harness.orchestrator.process(request()).await.unwrap();

    assert_eq!(incident.status, IncidentStatus::Repairing);
    assert!(incident.resolution.is_none());
    assert_eq!(stored(&harness, &incident.id).status, IncidentStatus::Repairing);
}

#[tokio::test]
async fn test_metadata_keys_are_preserved() {
    let harness = Setup::default().auto_repair().build();

    let incident = harness
        .orchestrator
        .process(request_with_metadata(json!({
            "error_count": 150,
            ERROR_DETAILS_KEY: {"status": 500, "path": "/api/users"}
        })))
        .await
        .unwrap();

    assert_eq!(incident.metadata["error_count"], json!(150));
    assert_eq!(incident.metadata[ERROR_DETAILS_KEY]["status"], json!(500));
    assert!(incident.metadata.contains_key(AI_ANALYSIS_KEY));
    assert!(incident.metadata.contains_key(RESOLUTION_SUGGESTIONS_KEY));

    let suggestion = harness.advisor.last_suggestion.lock().unwrap().clone().unwrap();
    let details: Value = serde_json::from_str(&suggestion.error_details.unwrap()).unwrap();
    assert_eq!(details, json!({"status": 500, "path": "/api/users"}));
}

// ─────────────────────────────────────────────────────────────────────────────
// Fatal failures
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_validation_error_creates_nothing() {
    let harness = Setup::default().build();

    let err = harness
        .orchestrator
        .process(IncidentRequest {
            title: "   ".to_string(),
            ..request()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert!(harness.repository.db.list_incidents(0, 10).unwrap().is_empty());
}

#[tokio::test]
async fn test_create_failure_propagates_and_leaves_nothing() {
    let harness = Setup {
        repository: FakeRepository {
            fail_create: true,
            ..FakeRepository::new()
        },
        ..Setup::default()
    }
    .build();

    let err = harness.orchestrator.process(request()).await.unwrap_err();

    assert!(matches!(err, Error::Database(_)));
    assert!(harness.repository.db.list_incidents(0, 10).unwrap().is_empty());
}

#[tokio::test]
async fn test_repository_failure_mid_pipeline_marks_failed() {
    let harness = Setup {
        repository: FakeRepository {
            fail_on_status: Some(IncidentStatus::Repairing),
            ..FakeRepository::new()
        },
        ..Setup::default()
    }
    .auto_repair()
    .build();

    let err = harness.orchestrator.process(request()).await.unwrap_err();
    assert!(matches!(err, Error::Database(_)));

    let incidents = harness.repository.db.list_incidents(0, 10).unwrap();
    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].status, IncidentStatus::Failed);
    assert!(incidents[0]
        .resolution
        .as_deref()
        .unwrap()
        .starts_with("Processing failed: "));
}

#[tokio::test]
async fn test_unwritable_failure_is_logged_and_original_error_returned() {
    let harness = Setup {
        repository: FakeRepository {
            fail_on_status: Some(IncidentStatus::Failed),
            ..FakeRepository::new()
        },
        executor: ExecutorBehavior::Fail("boom"),
        ..Setup::default()
    }
    .auto_repair()
    .build();

    let err = harness.orchestrator.process(request()).await.unwrap_err();
    assert!(matches!(err, Error::Database(_)));

    let incidents = harness.repository.db.list_incidents(0, 10).unwrap();
    assert_eq!(incidents[0].status, IncidentStatus::Repairing);
}

// ─────────────────────────────────────────────────────────────────────────────
// Manual repair
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_trigger_repair_from_pending() {
    let harness = Setup::default().build();
    let pending = harness.orchestrator.process(request()).await.unwrap();

    let incident = harness.orchestrator.trigger_repair(&pending.id).await.unwrap();

    assert_eq!(incident.status, IncidentStatus::Resolved);
    assert_eq!(incident.resolution.as_deref(), Some("fixed"));
    assert_eq!(incident.workflow_execution_id.as_deref(), Some("exec-1"));
}

#[tokio::test]
async fn test_trigger_repair_retries_failed() {
    let harness = Setup {
        executor: ExecutorBehavior::Fail("flaky"),
        ..Setup::default()
    }
    .auto_repair()
    .build();
    let failed = harness.orchestrator.process(request()).await.unwrap();
    assert_eq!(failed.status, IncidentStatus::Failed);

    let retried = harness.orchestrator.trigger_repair(&failed.id).await.unwrap();
    assert_eq!(retried.status, IncidentStatus::Failed);
    assert_eq!(harness.executor.requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_trigger_repair_rejects_resolved() {
    let harness = Setup::default().auto_repair().build();
    let resolved = harness.orchestrator.process(request()).await.unwrap();

    let err = harness
        .orchestrator
        .trigger_repair(&resolved.id)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::InvalidTransition {
            from: IncidentStatus::Resolved,
            to: IncidentStatus::Repairing
        }
    ));
    assert_eq!(stored(&harness, &resolved.id), resolved);
}

#[tokio::test]
async fn test_trigger_repair_unknown_incident() {
    let harness = Setup::default().build();
    let err = harness
        .orchestrator
        .trigger_repair("inc_000000000000")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_trigger_repair_repository_failure_marks_failed() {
    let harness = Setup {
        repository: FakeRepository {
            fail_on_status: Some(IncidentStatus::Resolved),
            ..FakeRepository::new()
        },
        ..Setup::default()
    }
    .build();
    let pending = harness.orchestrator.process(request()).await.unwrap();

    harness
        .orchestrator
        .trigger_repair(&pending.id)
        .await
        .unwrap_err();

    let incident = stored(&harness, &pending.id);
    assert_eq!(incident.status, IncidentStatus::Failed);
    assert!(incident.resolution.unwrap().starts_with("Repair failed: "));
}

#[tokio::test]
async fn test_concurrent_manual_repairs_are_serialized() {
    let harness = Setup {
        executor: ExecutorBehavior::Slow(Duration::from_millis(50)),
        ..Setup::default()
    }
    .build();
    let pending = harness.orchestrator.process(request()).await.unwrap();

    let first = {
        let orchestrator = harness.orchestrator.clone();
        let id = pending.id.clone();
        tokio::spawn(async move { orchestrator.trigger_repair(&id).await })
    };
    let second = {
        let orchestrator = harness.orchestrator.clone();
        let id = pending.id.clone();
        tokio::spawn(async move { orchestrator.trigger_repair(&id).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(Error::InvalidTransition { .. }))));
    assert_eq!(harness.executor.requests.lock().unwrap().len(), 1);
    assert_eq!(stored(&harness, &pending.id).status, IncidentStatus::Resolved);
}

#[test]
fn test_repair_error_policy_parsing() {
    assert_eq!("fail".parse::<RepairErrorPolicy>().unwrap(), RepairErrorPolicy::Fail);
    assert_eq!(
        "leave_repairing".parse::<RepairErrorPolicy>().unwrap(),
        RepairErrorPolicy::LeaveRepairing
    );
    assert!("retry".parse::<RepairErrorPolicy>().is_err());
    assert_eq!(RepairErrorPolicy::default().to_string(), "fail");
}

#[test]
fn test_metadata_type_is_json_object() {
    let metadata: Metadata = json!({"a": 1}).as_object().cloned().unwrap();
    assert_eq!(metadata.len(), 1);
}
