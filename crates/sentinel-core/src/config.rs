//! Configuration for the incident pipeline and its collaborators.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Environment variables (SENTINEL_*, GEMINI_*, KESTRA_*, CLINE_*)
//! 2. Config file ($SENTINEL_CONFIG or ~/.devsentinel/config.toml)
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::orchestrator::{OrchestratorConfig, RepairErrorPolicy};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// Lifecycle pipeline settings
    #[serde(default)]
    pub orchestrator: OrchestratorSettings,

    /// Analysis advisor (Gemini)
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Workflow trigger (Kestra)
    #[serde(default)]
    pub kestra: KestraConfig,

    /// Repair executor (Cline CLI)
    #[serde(default)]
    pub cline: ClineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorSettings {
    /// Run the repair step automatically after analysis
    #[serde(default)]
    pub auto_repair_enabled: bool,

    /// Bound on the workflow trigger call
    #[serde(default = "default_workflow_timeout")]
    pub workflow_timeout_secs: u64,

    /// Bound on the repair executor call
    #[serde(default = "default_repair_timeout")]
    pub repair_timeout_secs: u64,

    /// What happens to an incident when the repair executor call itself errors
    #[serde(default)]
    pub repair_error_policy: RepairErrorPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key; the advisor is unavailable without one
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_gemini_api_base")]
    pub api_base: String,

    #[serde(default = "default_gemini_temperature")]
    pub temperature: f32,

    /// Per-request HTTP timeout
    #[serde(default = "default_gemini_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KestraConfig {
    #[serde(default = "default_kestra_url")]
    pub url: String,

    /// Sent as a bearer token when set
    pub api_key: Option<String>,

    #[serde(default = "default_kestra_namespace")]
    pub namespace: String,

    #[serde(default = "default_kestra_flow_id")]
    pub flow_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClineConfig {
    #[serde(default = "default_cline_cli_path")]
    pub cli_path: String,

    /// Where task files are written (defaults to a directory under the system temp dir)
    pub runtime_dir: Option<PathBuf>,
}

// Default value functions
fn default_workflow_timeout() -> u64 {
    30
}

fn default_repair_timeout() -> u64 {
    300 // 5 minutes
}

fn default_gemini_model() -> String {
    "gemini-1.5-pro-latest".to_string()
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_temperature() -> f32 {
    0.7
}

fn default_gemini_timeout() -> u64 {
    60
}

fn default_kestra_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_kestra_namespace() -> String {
    "devsentinel".to_string()
}

fn default_kestra_flow_id() -> String {
    "incident_flow".to_string()
}

fn default_cline_cli_path() -> String {
    "cline".to_string()
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            auto_repair_enabled: false,
            workflow_timeout_secs: default_workflow_timeout(),
            repair_timeout_secs: default_repair_timeout(),
            repair_error_policy: RepairErrorPolicy::default(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            api_base: default_gemini_api_base(),
            temperature: default_gemini_temperature(),
            timeout_secs: default_gemini_timeout(),
        }
    }
}

impl Default for KestraConfig {
    fn default() -> Self {
        Self {
            url: default_kestra_url(),
            api_key: None,
            namespace: default_kestra_namespace(),
            flow_id: default_kestra_flow_id(),
        }
    }
}

impl Default for ClineConfig {
    fn default() -> Self {
        Self {
            cli_path: default_cline_cli_path(),
            runtime_dir: None,
        }
    }
}

impl OrchestratorSettings {
    /// Convert to the runtime form used by `IncidentOrchestrator`.
    pub fn to_orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            auto_repair_enabled: self.auto_repair_enabled,
            workflow_timeout: Duration::from_secs(self.workflow_timeout_secs),
            repair_timeout: Duration::from_secs(self.repair_timeout_secs),
            repair_error_policy: self.repair_error_policy,
        }
    }
}

impl ClineConfig {
    /// Resolved task file directory.
    pub fn task_dir(&self) -> PathBuf {
        self.runtime_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("devsentinel_cline_tasks"))
    }
}

/// Base directory for DevSentinel data (~/.devsentinel).
pub fn sentinel_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".devsentinel")
}

impl SentinelConfig {
    /// Load configuration from file and environment.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file(&Self::config_path())?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a TOML file, falling back to defaults when it does not exist.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("SENTINEL_CONFIG") {
            PathBuf::from(path)
        } else {
            sentinel_dir().join("config.toml")
        }
    }

    /// Apply environment-style overrides from `lookup`.
    ///
    /// Empty values are treated as unset.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SENTINEL_AUTO_REPAIR") {
            self.orchestrator.auto_repair_enabled = parse_bool("SENTINEL_AUTO_REPAIR", &v)?;
        }
        if let Some(v) = get("SENTINEL_WORKFLOW_TIMEOUT_SECS") {
            self.orchestrator.workflow_timeout_secs = parse_secs("SENTINEL_WORKFLOW_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("SENTINEL_REPAIR_TIMEOUT_SECS") {
            self.orchestrator.repair_timeout_secs = parse_secs("SENTINEL_REPAIR_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("SENTINEL_REPAIR_ERROR_POLICY") {
            self.orchestrator.repair_error_policy = v.parse()?;
        }

        if let Some(v) = get("GEMINI_API_KEY") {
            self.gemini.api_key = Some(v);
        }
        if let Some(v) = get("GEMINI_MODEL") {
            self.gemini.model = v;
        }

        if let Some(v) = get("KESTRA_URL") {
            self.kestra.url = v;
        }
        if let Some(v) = get("KESTRA_API_KEY") {
            self.kestra.api_key = Some(v);
        }
        if let Some(v) = get("KESTRA_NAMESPACE") {
            self.kestra.namespace = v;
        }
        if let Some(v) = get("KESTRA_FLOW_ID") {
            self.kestra.flow_id = v;
        }

        if let Some(v) = get("CLINE_CLI_PATH") {
            self.cline.cli_path = v;
        }
        if let Some(v) = get("CLINE_RUNTIME_DIR") {
            self.cline.runtime_dir = Some(PathBuf::from(v));
        }

        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{} must be a boolean, got '{}'", key, other))),
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a whole number of seconds, got '{}'", key, value)))
}
