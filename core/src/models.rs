//! Core data types for linked content records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the content model a record lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Entry,
    Asset,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry => write!(f, "Entry"),
            Self::Asset => write!(f, "Asset"),
        }
    }
}

/// Publish lifecycle of a record at fetch time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Never published.
    Draft,
    /// Published previously, with unpublished changes since.
    Updated,
    /// Live version matches the latest version.
    Published,
}

impl LifecycleState {
    /// Derive the lifecycle from repository version counters.
    ///
    /// Publishing bumps the version once, so an unchanged published record has
    /// `version == published_version + 1`.
    pub fn from_versions(version: u64, published_version: Option<u64>) -> Self {
        match published_version {
            None => Self::Draft,
            Some(published) if version == published + 1 => Self::Published,
            Some(_) => Self::Updated,
        }
    }
}

/// Identity of a content record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordReference {
    pub id: String,
    pub kind: RecordKind,
    pub space_id: String,
    pub environment_id: String,
    /// Content type label, only meaningful for entries.
    pub content_category: Option<String>,
}

impl RecordReference {
    pub fn entry(
        id: impl Into<String>,
        space_id: impl Into<String>,
        environment_id: impl Into<String>,
        content_category: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: RecordKind::Entry,
            space_id: space_id.into(),
            environment_id: environment_id.into(),
            content_category,
        }
    }

    pub fn asset(
        id: impl Into<String>,
        space_id: impl Into<String>,
        environment_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: RecordKind::Asset,
            space_id: space_id.into(),
            environment_id: environment_id.into(),
            content_category: None,
        }
    }
}

impl fmt::Display for RecordReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// A fetched entry or asset.
///
/// Only valid as of the fetch that produced it; nothing refreshes it in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub reference: RecordReference,
    pub lifecycle: LifecycleState,
    pub published_at: Option<DateTime<Utc>>,
    /// Field payload, passed through to the repository untouched.
    #[serde(default)]
    pub fields: serde_json::Value,
}

impl RecordSnapshot {
    pub fn new(
        reference: RecordReference,
        lifecycle: LifecycleState,
        published_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            reference,
            lifecycle,
            published_at,
            fields: serde_json::Value::Null,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.reference.id
    }

    #[inline]
    pub fn kind(&self) -> RecordKind {
        self.reference.kind
    }

    pub fn is_draft(&self) -> bool {
        self.lifecycle == LifecycleState::Draft
    }

    pub fn is_updated(&self) -> bool {
        self.lifecycle == LifecycleState::Updated
    }

    pub fn is_published(&self) -> bool {
        self.lifecycle == LifecycleState::Published
    }
}

/// A link that could not be resolved while collecting references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionError {
    /// Id of the unresolved link, or of the node whose fetch failed.
    pub id: String,
    pub kind: RecordKind,
    pub message: String,
}

impl CollectionError {
    pub fn new(id: impl Into<String>, kind: RecordKind, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind, self.id, self.message)
    }
}

/// Records directly linked from one entry, as returned by the repository.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectReferences {
    /// Lifecycle of the entry that was asked about.
    pub root_lifecycle: Option<LifecycleState>,
    pub entries: Vec<RecordSnapshot>,
    pub assets: Vec<RecordSnapshot>,
    pub errors: Vec<CollectionError>,
}
