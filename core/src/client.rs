//! Contract for the content repository the core talks to.
//!
//! The surrounding application supplies the implementation; the collector
//! and orchestrator only await these calls, one at a time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{DirectReferences, RecordReference, RecordSnapshot};

/// Failure to fetch one node. Affects that node only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Permission denied for {0}")]
    PermissionDenied(String),
    #[error("Network error: {0}")]
    Network(String),
}

/// Failure to publish one record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Version conflict: {0}")]
    Conflict(String),
    #[error("Network error: {0}")]
    Network(String),
}

/// Failure to create a scheduled publish action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Scheduling rejected: {0}")]
    Rejected(String),
    #[error("Network error: {0}")]
    Network(String),
}

/// Operations the core consumes from the content repository.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Fetch the records directly linked from `entry_id`.
    async fn get_direct_references(&self, entry_id: &str)
        -> Result<DirectReferences, FetchError>;

    /// Publish one entry immediately.
    async fn publish_entry(&self, id: &str, snapshot: &RecordSnapshot) -> Result<(), PublishError>;

    /// Publish one asset immediately.
    async fn publish_asset(&self, id: &str, snapshot: &RecordSnapshot) -> Result<(), PublishError>;

    /// Create a scheduled publish action and return its identifier.
    ///
    /// The reference carries the space, environment, kind and entity id.
    async fn schedule_action(
        &self,
        reference: &RecordReference,
        scheduled_for: DateTime<Utc>,
    ) -> Result<String, ScheduleError>;

    /// Current lifecycle metadata of the root record.
    async fn get_root_snapshot(&self) -> Result<RecordSnapshot, FetchError>;
}
