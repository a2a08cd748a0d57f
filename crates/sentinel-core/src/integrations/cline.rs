//! Cline CLI repair executor.
//!
//! Each repair writes a task file describing the incident and runs
//! `<cli_path> run <task file>`. The child process is killed if the call is
//! dropped, which is how the orchestrator's repair timeout takes effect.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{RepairExecutor, RepairOutcome, RepairRequest};
use crate::config::ClineConfig;
use crate::error::{ConnectorError, ConnectorResult};

/// Maximum characters of CLI output kept as the resolution text
const MAX_RESOLUTION_CHARS: usize = 500;

/// Cline-backed `RepairExecutor`.
pub struct ClineExecutor {
    cli_path: String,
    task_dir: PathBuf,
}

impl ClineExecutor {
    pub fn new(config: &ClineConfig) -> Self {
        Self {
            cli_path: config.cli_path.clone(),
            task_dir: config.task_dir(),
        }
    }

    async fn write_task_file(&self, request: &RepairRequest) -> ConnectorResult<PathBuf> {
        tokio::fs::create_dir_all(&self.task_dir).await?;
        let task_file = self.task_dir.join(format!("{}.task.md", request.incident_id));
        tokio::fs::write(&task_file, task_content(request)).await?;
        Ok(task_file)
    }

    async fn run(&self, task_file: &Path) -> ConnectorResult<std::process::Output> {
        Command::new(&self.cli_path)
            .arg("run")
            .arg(task_file)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ConnectorError::Process(format!("Failed to run {}: {}", self.cli_path, e)))
    }
}

#[async_trait]
impl RepairExecutor for ClineExecutor {
    async fn execute_repair(&self, request: &RepairRequest) -> ConnectorResult<RepairOutcome> {
        info!(incident_id = %request.incident_id, "Running Cline repair");

        let task_file = self.write_task_file(request).await?;
        debug!(task_file = %task_file.display(), "Wrote Cline task file");

        let output = self.run(&task_file).await?;

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let resolution = truncate_chars(stdout.trim(), MAX_RESOLUTION_CHARS);
            Ok(RepairOutcome {
                success: true,
                resolution: (!resolution.is_empty()).then_some(resolution),
                error: None,
            })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(
                incident_id = %request.incident_id,
                exit_code = ?output.status.code(),
                "Cline repair exited with failure"
            );
            let error = if stderr.is_empty() {
                format!("Cline exited with {}", output.status)
            } else {
                format!("Cline failed: {}", stderr)
            };
            Ok(RepairOutcome::failed(error))
        }
    }
}

fn task_content(request: &RepairRequest) -> String {
    format!(
        "# Incident {}\n\n{}\n\n## Suggested resolution\n\n{}\n",
        request.incident_id,
        request.description,
        request.suggestions.as_deref().unwrap_or("N/A")
    )
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
