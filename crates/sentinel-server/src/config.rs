//! Server configuration.

use sentinel_core::config::sentinel_dir;
use sentinel_core::SentinelConfig;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_BIND: &str = "127.0.0.1:8000";
const DEFAULT_ACTIVITY_CAPACITY: usize = 200;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP API listens on
    pub bind: SocketAddr,
    /// Database path
    pub database_path: PathBuf,
    /// Number of recent activity events kept in memory
    pub activity_capacity: usize,
    /// Pipeline and collaborator settings
    pub sentinel: SentinelConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            database_path: sentinel_dir().join("devsentinel.db"),
            activity_capacity: DEFAULT_ACTIVITY_CAPACITY,
            sentinel: SentinelConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment and the core config file
    ///
    /// Standard directory structure:
    /// ```text
    /// ~/.devsentinel/
    /// ├── config.toml           # Pipeline configuration
    /// ├── devsentinel.db        # Database
    /// └── cli.toml              # CLI settings
    /// ```
    pub fn load() -> anyhow::Result<Self> {
        let sentinel = SentinelConfig::load()?;
        Self::from_lookup(sentinel, |key| std::env::var(key).ok())
    }

    fn from_lookup(
        sentinel: SentinelConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let bind = lookup("SENTINEL_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| anyhow::anyhow!("SENTINEL_BIND is not a socket address: {}", e))?;

        let database_path = lookup("SENTINEL_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| sentinel_dir().join("devsentinel.db"));

        let activity_capacity = match lookup("SENTINEL_ACTIVITY_CAPACITY") {
            Some(value) => value
                .parse()
                .map_err(|_| anyhow::anyhow!("SENTINEL_ACTIVITY_CAPACITY must be a number"))?,
            None => DEFAULT_ACTIVITY_CAPACITY,
        };

        Ok(Self {
            bind,
            database_path,
            activity_capacity,
            sentinel,
        })
    }

    /// Create the database's parent directory if needed
    pub fn ensure_dirs(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(SentinelConfig::default(), |key| env.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.bind.to_string(), "127.0.0.1:8000");
        assert!(config.database_path.ends_with("devsentinel.db"));
        assert_eq!(config.activity_capacity, 200);
    }

    #[test]
    fn test_defaults_without_env() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind, Config::default().bind);
        assert!(config.database_path.starts_with(sentinel_dir()));
    }

    #[test]
    fn test_env_overrides() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("incidents.db");

        let config = load(&[
            ("SENTINEL_BIND", "0.0.0.0:9000"),
            ("SENTINEL_DATABASE_PATH", db_path.to_str().unwrap()),
            ("SENTINEL_ACTIVITY_CAPACITY", "10"),
        ])
        .unwrap();

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.database_path, db_path);
        assert_eq!(config.activity_capacity, 10);
    }

    #[test]
    fn test_invalid_bind_rejected() {
        assert!(load(&[("SENTINEL_BIND", "not-an-address")]).is_err());
    }

    #[test]
    fn test_ensure_dirs_creates_parent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp_dir.path().join("nested").join("devsentinel.db"),
            ..Config::default()
        };

        config.ensure_dirs().unwrap();
        assert!(temp_dir.path().join("nested").is_dir());
    }
}
