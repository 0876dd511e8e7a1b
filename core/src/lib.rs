//! Dependency-aware publishing for trees of linked content records.
//!
//! Given a root entry, the collector discovers every entry and asset it
//! transitively links to, the classifier works out what is still draft or
//! has unpublished changes, and the orchestrator publishes (or schedules)
//! those dependencies before finally publishing the root.

pub mod client;
pub mod collector;
mod config;
pub mod logging;
mod models;
pub mod publish;
pub mod status;

#[cfg(test)]
mod test_support;

pub use client::{ContentRepository, FetchError, PublishError, ScheduleError};
pub use collector::{CollectError, ReferenceCollector, ReferenceUniverse, TraversalProgress};
pub use config::{
    parse_scheduled_for, parse_scheduled_for_in, CollectorConfig, ConfigError, PublishOptions,
};
pub use models::{
    CollectionError, DirectReferences, LifecycleState, RecordKind, RecordReference,
    RecordSnapshot,
};
pub use publish::{
    ItemError, PublishOrchestrator, PublishOutcome, PublishReport, RootPublishError,
};
pub use status::{classify, StatusSummary};

/// Caller-facing entry point bundling a repository client with collector
/// configuration.
///
/// Every call starts from fresh fetches; nothing is cached between calls.
/// Callers must not start a second traversal or publish run while one is in
/// flight.
pub struct ReferencePublisher<C: ContentRepository> {
    client: C,
    config: CollectorConfig,
}

impl<C: ContentRepository> ReferencePublisher<C> {
    pub fn new(client: C, config: CollectorConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Collect the reference universe of `root_id`.
    pub async fn start_traversal<F>(
        &self,
        root_id: &str,
        on_progress: F,
    ) -> Result<ReferenceUniverse, CollectError>
    where
        F: FnMut(TraversalProgress),
    {
        ReferenceCollector::new(&self.client, &self.config)
            .collect(root_id, on_progress)
            .await
    }

    pub fn classify(&self, root: &RecordSnapshot, universe: &ReferenceUniverse) -> StatusSummary {
        classify(root, universe)
    }

    /// Publish or schedule everything pending in `summary`, then the root.
    pub async fn start_publish<F>(
        &self,
        summary: &StatusSummary,
        options: &PublishOptions,
        on_progress: F,
    ) -> PublishReport
    where
        F: FnMut(&PublishOutcome),
    {
        PublishOrchestrator::new(&self.client, options)
            .publish(summary, on_progress)
            .await
    }

    /// Load the root snapshot, traverse its references and classify them.
    pub async fn refresh<F>(&self, on_progress: F) -> Result<StatusSummary, CollectError>
    where
        F: FnMut(TraversalProgress),
    {
        let root = self
            .client
            .get_root_snapshot()
            .await
            .map_err(CollectError::RootUnavailable)?;
        let universe = self.start_traversal(root.id(), on_progress).await?;
        Ok(classify(&root, &universe))
    }
}
