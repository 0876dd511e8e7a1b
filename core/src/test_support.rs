//! In-memory content repository for tests.
//!
//! Records every call in order so tests can assert on sequencing.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Mutex;

use crate::client::{ContentRepository, FetchError, PublishError, ScheduleError};
use crate::models::{
    CollectionError, DirectReferences, LifecycleState, RecordReference, RecordSnapshot,
};

pub const SPACE: &str = "space-1";
pub const ENVIRONMENT: &str = "master";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Fetch(String),
    PublishEntry(String),
    PublishAsset(String),
    Schedule(String, DateTime<Utc>),
    RootSnapshot,
}

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn entry(id: &str, lifecycle: LifecycleState) -> RecordSnapshot {
    RecordSnapshot::new(
        RecordReference::entry(id, SPACE, ENVIRONMENT, Some("article".to_string())),
        lifecycle,
        None,
    )
}

pub fn entry_in(id: &str, category: &str, lifecycle: LifecycleState) -> RecordSnapshot {
    RecordSnapshot::new(
        RecordReference::entry(id, SPACE, ENVIRONMENT, Some(category.to_string())),
        lifecycle,
        None,
    )
}

pub fn asset(id: &str, lifecycle: LifecycleState) -> RecordSnapshot {
    RecordSnapshot::new(RecordReference::asset(id, SPACE, ENVIRONMENT), lifecycle, None)
}

pub fn published_at(mut snapshot: RecordSnapshot, secs: i64) -> RecordSnapshot {
    snapshot.published_at = Some(ts(secs));
    snapshot
}

pub struct FakeRepository {
    root: RecordSnapshot,
    nodes: FxHashMap<String, DirectReferences>,
    failing_fetch: FxHashSet<String>,
    failing_publish: FxHashSet<String>,
    calls: Mutex<Vec<Call>>,
}

impl FakeRepository {
    pub fn new(root: RecordSnapshot) -> Self {
        Self {
            root,
            nodes: FxHashMap::default(),
            failing_fetch: FxHashSet::default(),
            failing_publish: FxHashSet::default(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn link_entry(mut self, from: &str, to: RecordSnapshot) -> Self {
        self.nodes.entry(from.to_string()).or_default().entries.push(to);
        self
    }

    pub fn link_asset(mut self, from: &str, to: RecordSnapshot) -> Self {
        self.nodes.entry(from.to_string()).or_default().assets.push(to);
        self
    }

    pub fn unresolved(mut self, from: &str, error: CollectionError) -> Self {
        self.nodes.entry(from.to_string()).or_default().errors.push(error);
        self
    }

    pub fn fail_fetch(mut self, id: &str) -> Self {
        self.failing_fetch.insert(id.to_string());
        self
    }

    pub fn fail_publish(mut self, id: &str) -> Self {
        self.failing_publish.insert(id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Fetch(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ContentRepository for FakeRepository {
    async fn get_direct_references(
        &self,
        entry_id: &str,
    ) -> Result<DirectReferences, FetchError> {
        self.record(Call::Fetch(entry_id.to_string()));
        if self.failing_fetch.contains(entry_id) {
            return Err(FetchError::Network(format!("timeout fetching {entry_id}")));
        }
        Ok(self.nodes.get(entry_id).cloned().unwrap_or_default())
    }

    async fn publish_entry(
        &self,
        id: &str,
        _snapshot: &RecordSnapshot,
    ) -> Result<(), PublishError> {
        self.record(Call::PublishEntry(id.to_string()));
        if self.failing_publish.contains(id) {
            return Err(PublishError::Validation(format!("{id} has invalid fields")));
        }
        Ok(())
    }

    async fn publish_asset(
        &self,
        id: &str,
        _snapshot: &RecordSnapshot,
    ) -> Result<(), PublishError> {
        self.record(Call::PublishAsset(id.to_string()));
        if self.failing_publish.contains(id) {
            return Err(PublishError::PermissionDenied(id.to_string()));
        }
        Ok(())
    }

    async fn schedule_action(
        &self,
        reference: &RecordReference,
        scheduled_for: DateTime<Utc>,
    ) -> Result<String, ScheduleError> {
        self.record(Call::Schedule(reference.id.clone(), scheduled_for));
        if self.failing_publish.contains(&reference.id) {
            return Err(ScheduleError::Rejected(reference.id.clone()));
        }
        Ok(format!("action-{}", reference.id))
    }

    async fn get_root_snapshot(&self) -> Result<RecordSnapshot, FetchError> {
        self.record(Call::RootSnapshot);
        if self.failing_fetch.contains(self.root.id()) {
            return Err(FetchError::NotFound(self.root.id().to_string()));
        }
        Ok(self.root.clone())
    }
}
