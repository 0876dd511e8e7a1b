//! Breadth-first collection of every record reachable from a root entry.
//!
//! The content graph has no known shape: links may form cycles, point back at
//! the root, or fan out into hundreds of nodes. The traversal is iterative and
//! terminates because an id is queued at most once and visited at most once.

use rustc_hash::FxHashSet;
use serde::Serialize;
use std::collections::VecDeque;
use thiserror::Error;

use crate::client::{ContentRepository, FetchError};
use crate::config::CollectorConfig;
use crate::models::{
    CollectionError, DirectReferences, LifecycleState, RecordKind, RecordSnapshot,
};
use crate::{log_changes, log_checks, log_debug};

/// Errors that stop a traversal before it produces anything.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectError {
    #[error("No references could be loaded for root entry {root_id}: {source}")]
    NoReferences { root_id: String, source: FetchError },
    #[error("Root record could not be loaded: {0}")]
    RootUnavailable(#[source] FetchError),
}

/// Progress of one traversal, reported after every node visit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TraversalProgress {
    /// Nodes taken off the queue so far.
    pub processed: usize,
    /// Nodes ever queued, including the root.
    pub total: usize,
}

impl TraversalProgress {
    pub fn is_complete(&self) -> bool {
        self.processed == self.total
    }
}

/// Deduplicated result of one traversal.
///
/// Entries and assets keep discovery order. The traversal root is never part
/// of `entries`; it is handled on its own when publishing.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ReferenceUniverse {
    entries: Vec<RecordSnapshot>,
    assets: Vec<RecordSnapshot>,
    errors: Vec<CollectionError>,
    visited: FxHashSet<String>,
    root_lifecycle: Option<LifecycleState>,
    #[serde(skip)]
    entry_ids: FxHashSet<String>,
    #[serde(skip)]
    asset_ids: FxHashSet<String>,
}

impl ReferenceUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry unless one with the same id is already present.
    pub fn insert_entry(&mut self, snapshot: RecordSnapshot) -> bool {
        if !self.entry_ids.insert(snapshot.id().to_string()) {
            return false;
        }
        self.entries.push(snapshot);
        true
    }

    /// Add an asset unless one with the same id is already present.
    pub fn insert_asset(&mut self, snapshot: RecordSnapshot) -> bool {
        if !self.asset_ids.insert(snapshot.id().to_string()) {
            return false;
        }
        self.assets.push(snapshot);
        true
    }

    pub fn push_error(&mut self, error: CollectionError) {
        self.errors.push(error);
    }

    /// Mark an entry id as expanded. Returns false if it already was.
    pub fn mark_visited(&mut self, id: &str) -> bool {
        if self.visited.contains(id) {
            return false;
        }
        self.visited.insert(id.to_string())
    }

    pub fn entries(&self) -> &[RecordSnapshot] {
        &self.entries
    }

    pub fn assets(&self) -> &[RecordSnapshot] {
        &self.assets
    }

    pub fn errors(&self) -> &[CollectionError] {
        &self.errors
    }

    pub fn visited(&self) -> &FxHashSet<String> {
        &self.visited
    }

    /// Lifecycle of the root as reported by its own reference fetch.
    pub fn root_lifecycle(&self) -> Option<LifecycleState> {
        self.root_lifecycle
    }

    #[inline]
    pub fn contains_entry(&self, id: &str) -> bool {
        self.entry_ids.contains(id)
    }

    #[inline]
    pub fn contains_asset(&self, id: &str) -> bool {
        self.asset_ids.contains(id)
    }

    /// All snapshots, assets first.
    pub fn snapshots(&self) -> impl Iterator<Item = &RecordSnapshot> {
        self.assets.iter().chain(self.entries.iter())
    }
}

/// FIFO of entry ids awaiting expansion.
///
/// `queued` remembers every id ever pushed, so an id referenced from many
/// nodes is expanded once.
struct Frontier {
    queue: VecDeque<String>,
    queued: FxHashSet<String>,
}

impl Frontier {
    fn seeded(root_id: &str) -> Self {
        let mut frontier = Self {
            queue: VecDeque::new(),
            queued: FxHashSet::default(),
        };
        frontier.enqueue(root_id);
        frontier
    }

    fn enqueue(&mut self, id: &str) -> bool {
        if !self.queued.insert(id.to_string()) {
            return false;
        }
        self.queue.push_back(id.to_string());
        true
    }

    fn pop(&mut self) -> Option<String> {
        self.queue.pop_front()
    }
}

/// Walks the reference graph of one root entry.
pub struct ReferenceCollector<'a, C: ContentRepository + ?Sized> {
    client: &'a C,
    config: &'a CollectorConfig,
}

impl<'a, C: ContentRepository + ?Sized> ReferenceCollector<'a, C> {
    pub fn new(client: &'a C, config: &'a CollectorConfig) -> Self {
        Self { client, config }
    }

    /// Collect every entry and asset reachable from `root_id`.
    ///
    /// `on_progress` is called after each node visit with `processed <= total`;
    /// the two are equal only on the final call. A node whose fetch fails is
    /// recorded as a collection error and the walk continues, except for the
    /// root itself, which yields `CollectError::NoReferences`.
    pub async fn collect<F>(
        &self,
        root_id: &str,
        mut on_progress: F,
    ) -> Result<ReferenceUniverse, CollectError>
    where
        F: FnMut(TraversalProgress),
    {
        let verbosity = self.config.verbosity;
        let mut universe = ReferenceUniverse::new();
        let mut frontier = Frontier::seeded(root_id);
        let mut progress = TraversalProgress {
            processed: 0,
            total: 1,
        };

        log_changes!(verbosity, root = root_id, "Collecting references");

        while let Some(node_id) = frontier.pop() {
            if universe.mark_visited(&node_id) {
                log_checks!(verbosity, node = %node_id, "Visiting");

                match self.client.get_direct_references(&node_id).await {
                    Ok(references) => {
                        if node_id == root_id {
                            universe.root_lifecycle = references.root_lifecycle;
                        }
                        progress.total +=
                            self.absorb(root_id, references, &mut universe, &mut frontier);
                    }
                    Err(source) if node_id == root_id => {
                        tracing::warn!(root = root_id, error = %source, "Root entry unreachable");
                        return Err(CollectError::NoReferences {
                            root_id: root_id.to_string(),
                            source,
                        });
                    }
                    Err(err) => {
                        tracing::warn!(node = %node_id, error = %err, "Failed to load references");
                        universe.push_error(CollectionError::new(
                            node_id.clone(),
                            RecordKind::Entry,
                            err.to_string(),
                        ));
                    }
                }
            } else {
                log_debug!(verbosity, node = %node_id, "Already visited, skipping");
            }

            progress.processed += 1;
            on_progress(progress);
        }

        log_changes!(
            verbosity,
            entries = universe.entries.len(),
            assets = universe.assets.len(),
            errors = universe.errors.len(),
            "Collected references"
        );

        Ok(universe)
    }

    /// Merge one node's direct references into the universe.
    ///
    /// Returns the number of newly queued entry ids.
    fn absorb(
        &self,
        root_id: &str,
        references: DirectReferences,
        universe: &mut ReferenceUniverse,
        frontier: &mut Frontier,
    ) -> usize {
        let verbosity = self.config.verbosity;
        let mut newly_queued = 0;

        universe.errors.extend(references.errors);

        for asset in references.assets {
            if !universe.insert_asset(asset) {
                log_debug!(verbosity, "Duplicate asset ignored");
            }
        }

        for entry in references.entries {
            let id = entry.id().to_string();
            let excluded = self
                .config
                .is_excluded(entry.reference.content_category.as_deref());

            // Queueing is decided separately from set membership
            if id != root_id && !universe.insert_entry(entry) {
                log_debug!(verbosity, entry = %id, "Duplicate entry ignored");
            }

            if excluded {
                log_checks!(verbosity, entry = %id, "Excluded category, not expanding");
                continue;
            }

            if frontier.enqueue(&id) {
                newly_queued += 1;
                log_debug!(
                    verbosity,
                    entry = %id,
                    pending = frontier.queue.len(),
                    "Queued"
                );
            }
        }

        newly_queued
    }
}
