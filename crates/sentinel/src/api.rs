//! API client for sentinel-server.
//!
//! Thin typed wrapper over the HTTP surface: incident intake and lookup,
//! manual repair, and the dashboard endpoints.

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use sentinel_core::types::IncidentStats;
use sentinel_core::{Incident, IncidentRequest};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;
use crate::error::{CliError, Result};

/// API client for sentinel-server.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client from config.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api.url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    /// Send a request and decode the JSON body.
    ///
    /// A 404 is reported as `IncidentNotFound` when `incident_id` is given.
    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        incident_id: Option<&str>,
    ) -> Result<T> {
        let response = req.send().await.map_err(|e| {
            if e.is_connect() {
                CliError::Unreachable {
                    url: self.base_url.clone(),
                    source: e,
                }
            } else {
                CliError::Http(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = response.text().await.unwrap_or_default();
        Err(match (status, incident_id) {
            (StatusCode::NOT_FOUND, Some(id)) => CliError::IncidentNotFound(id.to_string()),
            (s, _) if s.is_client_error() => CliError::Rejected {
                status: s.as_u16(),
                message,
            },
            (s, _) => CliError::Server {
                status: s.as_u16(),
                message,
            },
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Incidents
    // ─────────────────────────────────────────────────────────────────────────

    /// Report an incident. Returns once the pipeline has finished with it.
    pub async fn report(&self, request: &IncidentRequest) -> Result<Incident> {
        self.send(self.request(Method::POST, "/incidents").json(request), None)
            .await
    }

    pub async fn get_incident(&self, id: &str) -> Result<Incident> {
        let path = format!("/incidents/{}", id);
        self.send(self.request(Method::GET, &path), Some(id)).await
    }

    /// List incidents, newest first.
    pub async fn list_incidents(&self, skip: u32, limit: u32) -> Result<Vec<Incident>> {
        let req = self
            .request(Method::GET, "/incidents")
            .query(&[("skip", skip), ("limit", limit)]);
        self.send(req, None).await
    }

    pub async fn delete_incident(&self, id: &str) -> Result<DeleteResponse> {
        let path = format!("/incidents/{}", id);
        self.send(self.request(Method::DELETE, &path), Some(id)).await
    }

    /// Trigger a manual repair and wait for its outcome.
    pub async fn trigger_repair(&self, id: &str) -> Result<RepairResponse> {
        let body = RepairRequest { incident_id: id };
        self.send(self.request(Method::POST, "/repair").json(&body), Some(id))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Dashboard
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn stats(&self) -> Result<IncidentStats> {
        self.send(self.request(Method::GET, "/api/stats"), None).await
    }

    pub async fn activity(&self, limit: usize) -> Result<Vec<ActivityEvent>> {
        let req = self
            .request(Method::GET, "/api/activity")
            .query(&[("limit", limit)]);
        let response: ActivityResponse = self.send(req, None).await?;
        Ok(response.events)
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        self.send(self.request(Method::GET, "/health"), None).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct RepairRequest<'a> {
    incident_id: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairResponse {
    pub status: String,
    pub incident: Incident,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub status: String,
    pub incident_id: String,
}

#[derive(Debug, Deserialize)]
struct ActivityResponse {
    events: Vec<ActivityEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub timestamp: i64,
    pub kind: String,
    pub incident_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: HealthComponents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthComponents {
    pub database: bool,
    pub ai: bool,
    pub auto_repair: bool,
}
