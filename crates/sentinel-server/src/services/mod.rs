//! Service layer for sentinel-server
//!
//! State owned by the API layer rather than the core pipeline.

pub mod activity;

pub use activity::{ActivityEvent, ActivityKind, ActivityLog};
