//! Direct SQLite database access for DevSentinel.
//!
//! One row per incident in the `incidents` table. The `metadata` column holds
//! an open JSON document rather than a fixed schema.
//!
//! Every method acquires the connection for its own duration only; the guard
//! is dropped on every exit path, including errors.

pub mod types;

use crate::error::{Error, Result};
use crate::types::{
    Incident, IncidentRequest, IncidentStats, IncidentStatus, IncidentUpdate, RepairAction,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

use self::types::{metadata_from_sql, metadata_to_sql};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS incidents (
    id                    TEXT PRIMARY KEY,
    title                 TEXT NOT NULL,
    description           TEXT NOT NULL,
    severity              TEXT NOT NULL,
    status                TEXT NOT NULL DEFAULT 'pending',
    source                TEXT NOT NULL,
    resolution            TEXT,
    workflow_execution_id TEXT,
    metadata              TEXT,
    created_at            INTEGER NOT NULL,
    updated_at            INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_incidents_created_at ON incidents (created_at);
CREATE INDEX IF NOT EXISTS idx_incidents_status ON incidents (status);
";

const INCIDENT_COLUMNS: &str = "id, title, description, severity, status, source, resolution,
     workflow_execution_id, metadata, created_at, updated_at";

/// Database connection wrapper.
///
/// Thread-safe via internal Mutex. All database operations acquire the lock.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at a specific path and apply the schema
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(Error::Database)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::init(conn)
    }

    /// Open a private in-memory database (tests, ephemeral runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(Error::Database)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Check database connectivity
    pub fn ping(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("SELECT 1").map_err(Error::Database)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Incident Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a new incident in PENDING status
    pub fn create_incident(&self, request: &IncidentRequest) -> Result<Incident> {
        let id = new_incident_id();
        let now = chrono::Utc::now().timestamp_millis();
        let metadata = request.metadata.clone().unwrap_or_default();
        let metadata_json = metadata_to_sql(&metadata)?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO incidents
             (id, title, description, severity, status, source, resolution,
              workflow_execution_id, metadata, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, NULL, ?7, ?8, ?8)",
            params![
                id,
                request.title,
                request.description,
                request.severity,
                IncidentStatus::Pending,
                request.source,
                metadata_json,
                now,
            ],
        )?;

        debug!(incident_id = %id, "Inserted incident");

        Ok(Incident {
            id,
            title: request.title.clone(),
            description: request.description.clone(),
            severity: request.severity,
            status: IncidentStatus::Pending,
            source: request.source.clone(),
            resolution: None,
            workflow_execution_id: None,
            metadata,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get incident by ID
    pub fn get_incident(&self, incident_id: &str) -> Result<Option<Incident>> {
        let conn = self.lock()?;
        Self::fetch_incident(&conn, incident_id)
    }

    fn fetch_incident(conn: &Connection, incident_id: &str) -> Result<Option<Incident>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM incidents WHERE id = ?1",
            INCIDENT_COLUMNS
        ))?;

        Ok(stmt
            .query_row(params![incident_id], Self::map_incident)
            .optional()?)
    }

    /// List incidents, newest first
    ///
    /// Ties on `created_at` fall back to insertion order so the result is
    /// stable across calls.
    pub fn list_incidents(&self, skip: u32, limit: u32) -> Result<Vec<Incident>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM incidents
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?1 OFFSET ?2",
            INCIDENT_COLUMNS
        ))?;

        let incidents = stmt
            .query_map(params![limit, skip], Self::map_incident)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(incidents)
    }

    /// Apply a partial update inside a single transaction
    ///
    /// Status changes are checked against the lifecycle state machine using the
    /// stored status. Metadata entries are merged; existing keys are kept.
    pub fn update_incident(&self, incident_id: &str, update: &IncidentUpdate) -> Result<Incident> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut incident = Self::fetch_incident(&tx, incident_id)?
            .ok_or_else(|| Error::IncidentNotFound(incident_id.to_string()))?;

        if let Some(next) = update.status {
            incident.status.ensure_transition(next)?;
            incident.status = next;
        }
        if let Some(resolution) = &update.resolution {
            incident.resolution = Some(resolution.clone());
        }
        if let Some(execution_id) = &update.workflow_execution_id {
            incident.workflow_execution_id = Some(execution_id.clone());
        }
        for (key, value) in &update.metadata {
            incident.metadata.insert(key.clone(), value.clone());
        }
        incident.updated_at = chrono::Utc::now().timestamp_millis();

        tx.execute(
            "UPDATE incidents
             SET status = ?1, resolution = ?2, workflow_execution_id = ?3,
                 metadata = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                incident.status,
                incident.resolution,
                incident.workflow_execution_id,
                metadata_to_sql(&incident.metadata)?,
                incident.updated_at,
                incident_id,
            ],
        )?;
        tx.commit()?;

        Ok(incident)
    }

    /// Delete incident, returning whether a row was removed
    pub fn delete_incident(&self, incident_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM incidents WHERE id = ?1", params![incident_id])?;
        Ok(deleted > 0)
    }

    fn map_incident(row: &rusqlite::Row) -> rusqlite::Result<Incident> {
        Ok(Incident {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            severity: row.get(3)?,
            status: row.get(4)?,
            source: row.get(5)?,
            resolution: row.get(6)?,
            workflow_execution_id: row.get(7)?,
            metadata: metadata_from_sql(8, row.get(8)?)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reporting Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Count incidents by status
    pub fn incident_stats(&self) -> Result<IncidentStats> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM incidents GROUP BY status")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, IncidentStatus>(0)?, row.get::<_, u32>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stats = IncidentStats::default();
        for (status, count) in rows {
            match status {
                IncidentStatus::Pending => stats.pending = count,
                IncidentStatus::Analyzing => stats.analyzing = count,
                IncidentStatus::Repairing => stats.repairing = count,
                IncidentStatus::Resolved => stats.resolved = count,
                IncidentStatus::Failed => stats.failed = count,
            }
            stats.total += count;
        }
        stats.active = stats.pending + stats.analyzing + stats.repairing;
        stats.actions = stats.repairing + stats.resolved;

        Ok(stats)
    }

    /// Repairs recorded on incidents that are repairing or resolved
    pub fn list_repair_actions(&self) -> Result<Vec<RepairAction>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, status, resolution FROM incidents
             WHERE status IN ('repairing', 'resolved') AND resolution IS NOT NULL
             ORDER BY updated_at DESC, rowid DESC",
        )?;

        let actions = stmt
            .query_map([], |row| {
                let status: IncidentStatus = row.get(1)?;
                Ok(RepairAction {
                    incident_id: row.get(0)?,
                    action: "auto-repair".to_string(),
                    status: if status == IncidentStatus::Resolved {
                        "completed".to_string()
                    } else {
                        "in_progress".to_string()
                    },
                    notes: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(actions)
    }
}

/// Generate an opaque incident id (`inc_` + 12 hex chars)
fn new_incident_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("inc_{}", &uuid[..12])
}
