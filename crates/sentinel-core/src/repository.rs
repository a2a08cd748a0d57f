//! Async persistence interface consumed by the orchestrator.
//!
//! `Database` is the production implementation. Tests substitute in-memory
//! fakes to inject storage failures.

use async_trait::async_trait;

use crate::db::Database;
use crate::error::Result;
use crate::types::{Incident, IncidentRequest, IncidentUpdate};

/// Storage for incident records.
///
/// `update` must validate the status transition against the stored status
/// and merge metadata inside the same transaction, returning the record as
/// written.
#[async_trait]
pub trait IncidentRepository: Send + Sync {
    /// Persist a new PENDING incident.
    async fn create(&self, request: &IncidentRequest) -> Result<Incident>;

    /// Fetch one incident, `None` when absent.
    async fn get(&self, incident_id: &str) -> Result<Option<Incident>>;

    /// Newest first.
    async fn list(&self, skip: u32, limit: u32) -> Result<Vec<Incident>>;

    /// Apply a partial update. Fails with `IncidentNotFound` or `InvalidTransition`.
    async fn update(&self, incident_id: &str, update: &IncidentUpdate) -> Result<Incident>;

    async fn delete(&self, incident_id: &str) -> Result<bool>;
}

#[async_trait]
impl IncidentRepository for Database {
    async fn create(&self, request: &IncidentRequest) -> Result<Incident> {
        self.create_incident(request)
    }

    async fn get(&self, incident_id: &str) -> Result<Option<Incident>> {
        self.get_incident(incident_id)
    }

    async fn list(&self, skip: u32, limit: u32) -> Result<Vec<Incident>> {
        self.list_incidents(skip, limit)
    }

    async fn update(&self, incident_id: &str, update: &IncidentUpdate) -> Result<Incident> {
        self.update_incident(incident_id, update)
    }

    async fn delete(&self, incident_id: &str) -> Result<bool> {
        self.delete_incident(incident_id)
    }
}
