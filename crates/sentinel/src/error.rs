//! Error types for the sentinel CLI.

use thiserror::Error;

/// Errors returned by the sentinel-server API client.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Incident not found: {0}")]
    IncidentNotFound(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Cannot reach sentinel-server at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
