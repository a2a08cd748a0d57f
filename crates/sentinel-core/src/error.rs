//! Error types for sentinel-core.

use std::time::Duration;

use thiserror::Error;

use crate::types::IncidentStatus;

/// Result type alias using sentinel-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for collaborator (connector) calls
pub type ConnectorResult<T> = std::result::Result<T, ConnectorError>;

/// Core error types for incident operations
#[derive(Error, Debug)]
pub enum Error {
    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Incident not found: {0}")]
    IncidentNotFound(String),

    // Lifecycle errors
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: IncidentStatus,
        to: IncidentStatus,
    },

    // Intake errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Collaborator errors that reach the caller (direct proxy calls only)
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an invalid transition error
    pub fn invalid_transition(from: IncidentStatus, to: IncidentStatus) -> Self {
        Self::InvalidTransition { from, to }
    }

    /// Check if this error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::IncidentNotFound(_))
    }
}

/// Errors raised by external collaborators (analysis, workflow, repair backends).
#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Unexpected response from {service}: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },

    #[error("Process error: {0}")]
    Process(String),

    #[error("Timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConnectorError {
    /// Create an invalid response error
    pub fn invalid_response(service: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service,
            message: message.into(),
        }
    }

    /// Check if this error is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
