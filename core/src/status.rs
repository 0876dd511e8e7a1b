//! Classification of a collected reference universe.

use serde::Serialize;

use crate::collector::ReferenceUniverse;
use crate::models::{CollectionError, RecordSnapshot};

/// What needs publishing before the root is fully live.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusSummary {
    pub root: RecordSnapshot,
    pub draft_entries: Vec<RecordSnapshot>,
    pub updated_entries: Vec<RecordSnapshot>,
    pub draft_assets: Vec<RecordSnapshot>,
    pub updated_assets: Vec<RecordSnapshot>,
    pub total_entries: usize,
    pub total_assets: usize,
    /// Root is published and no dependency was published after it.
    pub published: bool,
    /// Some dependency carries a `published_at` later than the root's.
    pub out_of_date: bool,
    pub errors: Vec<CollectionError>,
}

impl StatusSummary {
    /// Dependencies that would be published or scheduled, root excluded.
    pub fn pending_count(&self) -> usize {
        self.draft_entries.len()
            + self.updated_entries.len()
            + self.draft_assets.len()
            + self.updated_assets.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn needs_action(&self) -> bool {
        !self.published || self.pending_count() > 0
    }
}

/// Derive the status summary for `root` from a collected universe.
///
/// Pure: the same inputs always give the same summary.
pub fn classify(root: &RecordSnapshot, universe: &ReferenceUniverse) -> StatusSummary {
    let out_of_date = match root.published_at {
        Some(root_published) => universe
            .snapshots()
            .filter_map(|s| s.published_at)
            .any(|published| published > root_published),
        None => false,
    };

    StatusSummary {
        root: root.clone(),
        draft_entries: filter_cloned(universe.entries(), RecordSnapshot::is_draft),
        updated_entries: filter_cloned(universe.entries(), RecordSnapshot::is_updated),
        draft_assets: filter_cloned(universe.assets(), RecordSnapshot::is_draft),
        updated_assets: filter_cloned(universe.assets(), RecordSnapshot::is_updated),
        total_entries: universe.entries().len(),
        total_assets: universe.assets().len(),
        published: root.is_published() && !out_of_date,
        out_of_date,
        errors: universe.errors().to_vec(),
    }
}

fn filter_cloned(
    snapshots: &[RecordSnapshot],
    keep: fn(&RecordSnapshot) -> bool,
) -> Vec<RecordSnapshot> {
    snapshots.iter().filter(|s| keep(s)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LifecycleState::{Draft, Published, Updated};
    use crate::models::{CollectionError, RecordKind};
    use crate::test_support::{asset, entry, published_at};

    fn universe_of(entries: Vec<RecordSnapshot>, assets: Vec<RecordSnapshot>) -> ReferenceUniverse {
        let mut universe = ReferenceUniverse::new();
        for e in entries {
            universe.insert_entry(e);
        }
        for a in assets {
            universe.insert_asset(a);
        }
        universe
    }

    #[test]
    fn test_partitions_by_lifecycle() {
        let universe = universe_of(
            vec![
                entry("e1", Draft),
                entry("e2", Updated),
                entry("e3", Published),
            ],
            vec![asset("a1", Draft), asset("a2", Draft), asset("a3", Updated)],
        );
        let root = published_at(entry("root", Published), 100);

        let summary = classify(&root, &universe);

        assert_eq!(summary.draft_entries.len(), 1);
        assert_eq!(summary.updated_entries.len(), 1);
        assert_eq!(summary.draft_assets.len(), 2);
        assert_eq!(summary.updated_assets.len(), 1);
        assert_eq!(summary.total_entries, 3);
        assert_eq!(summary.total_assets, 3);
        assert_eq!(summary.pending_count(), 5);
        assert!(summary.published);
        assert!(summary.needs_action());
    }

    #[test]
    fn test_out_of_date_dependency() {
        let universe = universe_of(
            vec![published_at(entry("e1", Published), 90)],
            vec![published_at(asset("x", Published), 150)],
        );
        let root = published_at(entry("root", Published), 100);

        let summary = classify(&root, &universe);

        assert!(summary.out_of_date);
        assert!(!summary.published);
        assert_eq!(summary.pending_count(), 0);
        assert!(summary.needs_action());
    }

    #[test]
    fn test_equal_timestamp_is_not_out_of_date() {
        let universe = universe_of(vec![published_at(entry("e1", Published), 100)], vec![]);
        let root = published_at(entry("root", Published), 100);

        let summary = classify(&root, &universe);

        assert!(!summary.out_of_date);
        assert!(summary.published);
        assert!(!summary.needs_action());
    }

    #[test]
    fn test_never_published_root() {
        let universe = universe_of(vec![published_at(entry("e1", Published), 50)], vec![]);
        let root = entry("root", Draft);

        let summary = classify(&root, &universe);

        assert!(!summary.out_of_date);
        assert!(!summary.published);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let mut universe = universe_of(
            vec![entry("e1", Draft), published_at(entry("e2", Published), 120)],
            vec![asset("a1", Updated)],
        );
        universe.push_error(CollectionError::new("lost", RecordKind::Entry, "notResolvable"));
        let root = published_at(entry("root", Updated), 100);

        let first = classify(&root, &universe);
        let second = classify(&root, &universe);

        assert_eq!(first, second);
        assert_eq!(first.error_count(), 1);
        assert_eq!(universe.entries().len(), 2);
    }
}
