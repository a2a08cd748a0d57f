//! sentinel-core - Core library for DevSentinel
//!
//! This crate provides the incident triage pipeline shared by the server and CLI:
//!
//! - **types**: Incident entity, requests, status state machine
//! - **db**: Direct SQLite persistence for incidents
//! - **repository**: Async repository interface consumed by the orchestrator
//! - **integrations**: Analysis advisor, workflow trigger and repair executor adapters
//! - **orchestrator**: Incident lifecycle state machine and failure classification
//! - **config**: TOML + environment configuration

pub mod config;
pub mod db;
pub mod error;
pub mod integrations;
pub mod orchestrator;
pub mod repository;
pub mod types;

// Re-export commonly used types
pub use config::SentinelConfig;
pub use db::Database;
pub use error::{ConnectorError, ConnectorResult, Error, Result};
pub use orchestrator::{IncidentOrchestrator, OrchestratorConfig, RepairErrorPolicy};
pub use repository::IncidentRepository;
pub use types::{Incident, IncidentRequest, IncidentSeverity, IncidentStatus, IncidentUpdate};
