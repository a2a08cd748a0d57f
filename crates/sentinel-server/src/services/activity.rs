//! ActivityLog - bounded record of recent API events
//!
//! Kept in memory only; the log is empty after a restart. The oldest entry is
//! dropped once capacity is reached.

use serde::Serialize;
use std::collections::VecDeque;
use tokio::sync::RwLock;

/// Kind of event recorded by the API layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    IncidentProcessed,
    IncidentFailed,
    RepairTriggered,
    RepairFailed,
    IncidentDeleted,
}

/// A single recorded event
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEvent {
    pub timestamp: i64,
    pub kind: ActivityKind,
    pub incident_id: Option<String>,
    pub message: String,
}

/// Ring buffer of recent events
pub struct ActivityLog {
    events: RwLock<VecDeque<ActivityEvent>>,
    capacity: usize,
}

impl ActivityLog {
    /// Create a log holding at most `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            events: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Record an event, evicting the oldest when full
    pub async fn record(
        &self,
        kind: ActivityKind,
        incident_id: Option<&str>,
        message: impl Into<String>,
    ) {
        if self.capacity == 0 {
            return;
        }

        let event = ActivityEvent {
            timestamp: chrono::Utc::now().timestamp_millis(),
            kind,
            incident_id: incident_id.map(str::to_string),
            message: message.into(),
        };

        let mut events = self.events.write().await;
        while events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Most recent events, newest first
    pub async fn recent(&self, limit: usize) -> Vec<ActivityEvent> {
        let events = self.events.read().await;
        events.iter().rev().take(limit).cloned().collect()
    }
}
