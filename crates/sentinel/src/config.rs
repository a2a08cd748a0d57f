//! Configuration management for the sentinel CLI.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Environment variables (SENTINEL_API_URL)
//! 2. Config file (~/.devsentinel/cli.toml, or $SENTINEL_CLI_CONFIG)
//! 3. Default values

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// sentinel-server API settings
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for the sentinel-server API
    #[serde(default = "default_api_url")]
    pub url: String,

    /// Request timeout. Reports run the whole pipeline, so this is generous.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file(&Self::config_path())?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load a config file, falling back to defaults when it does not exist.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply environment-style overrides from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("SENTINEL_API_URL").filter(|v| !v.trim().is_empty()) {
            self.api.url = url;
        }
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("SENTINEL_CLI_CONFIG") {
            PathBuf::from(path)
        } else {
            sentinel_core::config::sentinel_dir().join("cli.toml")
        }
    }
}
