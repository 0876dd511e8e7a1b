//! Publishing or scheduling a classified reference tree.
//!
//! Dependencies go first, assets before entries, so no published entry ever
//! links to an unpublished asset. The root goes last and only when every
//! dependency went through.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::client::{ContentRepository, PublishError, ScheduleError};
use crate::config::PublishOptions;
use crate::models::{RecordKind, RecordReference, RecordSnapshot};
use crate::status::StatusSummary;
use crate::{log_changes, log_checks};

/// Why a single item could not be published or scheduled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// The root failed after all of its dependencies succeeded.
///
/// The dependencies stay published.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to publish root {reference}: {source}")]
pub struct RootPublishError {
    pub reference: RecordReference,
    pub source: ItemError,
}

/// Running tally of one publish run.
///
/// Each step produces a new value; callers receive a copy after every item.
/// `total` counts the root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failed_items: Vec<RecordReference>,
    pub scheduled: bool,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub scheduled_action_ids: Vec<String>,
}

impl PublishOutcome {
    fn started(total: usize, scheduled_for: Option<DateTime<Utc>>) -> Self {
        Self {
            total,
            scheduled: scheduled_for.is_some(),
            scheduled_for,
            ..Self::default()
        }
    }

    #[must_use]
    fn with_success(mut self, action_id: Option<String>) -> Self {
        self.succeeded += 1;
        self.scheduled_action_ids.extend(action_id);
        self
    }

    #[must_use]
    fn with_failure(mut self, reference: RecordReference) -> Self {
        self.failed += 1;
        self.failed_items.push(reference);
        self
    }

    /// Items attempted so far.
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Every item, root included, was attempted.
    pub fn is_finished(&self) -> bool {
        self.processed() == self.total
    }
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.scheduled {
            "scheduled"
        } else {
            "published"
        };
        write!(
            f,
            "{}/{} {}, {} failed",
            self.succeeded, self.total, verb, self.failed
        )?;
        if !self.failed_items.is_empty() {
            let items: Vec<String> = self.failed_items.iter().map(|r| r.to_string()).collect();
            write!(f, " ({})", items.join(", "))?;
        }
        Ok(())
    }
}

/// Final result of a publish run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishReport {
    pub outcome: PublishOutcome,
    /// Set when the root itself failed.
    pub root_error: Option<RootPublishError>,
    /// False when a dependency failure kept the root from being attempted.
    pub root_attempted: bool,
}

impl PublishReport {
    /// Dependencies and root all went through.
    pub fn is_complete(&self) -> bool {
        self.root_attempted && self.outcome.failed == 0
    }
}

/// Dependencies in publish order: draft assets, updated assets, draft entries,
/// updated entries.
pub fn publish_order(summary: &StatusSummary) -> impl Iterator<Item = &RecordSnapshot> {
    summary
        .draft_assets
        .iter()
        .chain(&summary.updated_assets)
        .chain(&summary.draft_entries)
        .chain(&summary.updated_entries)
}

/// Publishes or schedules the pending records of one summary.
pub struct PublishOrchestrator<'a, C: ContentRepository + ?Sized> {
    client: &'a C,
    options: &'a PublishOptions,
}

impl<'a, C: ContentRepository + ?Sized> PublishOrchestrator<'a, C> {
    pub fn new(client: &'a C, options: &'a PublishOptions) -> Self {
        Self { client, options }
    }

    /// Publish every pending dependency, then the root.
    ///
    /// Item failures are logged and counted, never propagated. `on_progress`
    /// receives the outcome after every item, root included.
    pub async fn publish<F>(&self, summary: &StatusSummary, mut on_progress: F) -> PublishReport
    where
        F: FnMut(&PublishOutcome),
    {
        let verbosity = self.options.verbosity;
        let dependencies: Vec<&RecordSnapshot> = publish_order(summary).collect();
        let mut outcome =
            PublishOutcome::started(dependencies.len() + 1, self.options.scheduled_for);

        log_changes!(
            verbosity,
            root = summary.root.id(),
            dependencies = dependencies.len(),
            scheduled = outcome.scheduled,
            "Starting publish run"
        );

        for snapshot in dependencies {
            outcome = match self.process(snapshot).await {
                Ok(action_id) => {
                    log_checks!(verbosity, item = %snapshot.reference, "Done");
                    outcome.with_success(action_id)
                }
                Err(err) => {
                    tracing::warn!(item = %snapshot.reference, error = %err, "Item failed");
                    outcome.with_failure(snapshot.reference.clone())
                }
            };
            on_progress(&outcome);
        }

        if outcome.failed > 0 {
            tracing::warn!(
                root = summary.root.id(),
                failed = outcome.failed,
                "Dependencies failed, leaving root untouched"
            );
            return PublishReport {
                outcome,
                root_error: None,
                root_attempted: false,
            };
        }

        let root = &summary.root;
        let root_error = match self.process(root).await {
            Ok(action_id) => {
                outcome = outcome.with_success(action_id);
                None
            }
            Err(source) => {
                tracing::warn!(root = %root.reference, error = %source, "Root failed");
                outcome = outcome.with_failure(root.reference.clone());
                Some(RootPublishError {
                    reference: root.reference.clone(),
                    source,
                })
            }
        };
        on_progress(&outcome);

        log_changes!(verbosity, "{}", outcome);

        PublishReport {
            outcome,
            root_error,
            root_attempted: true,
        }
    }

    /// Publish or schedule one record. Returns the schedule action id, if any.
    async fn process(&self, snapshot: &RecordSnapshot) -> Result<Option<String>, ItemError> {
        if let Some(at) = self.options.scheduled_for {
            let action_id = self.client.schedule_action(&snapshot.reference, at).await?;
            return Ok(Some(action_id));
        }

        match snapshot.kind() {
            RecordKind::Asset => self.client.publish_asset(snapshot.id(), snapshot).await?,
            RecordKind::Entry => self.client.publish_entry(snapshot.id(), snapshot).await?,
        }
        Ok(None)
    }
}
