//! Versioned changeset history with a generational purge floor.

use super::changeset::Changeset;
use crate::types::{UpdateType, Version};
use std::collections::BTreeMap;
use std::ops::Bound;

/// One committed version: its severity and what it touched.
#[derive(Clone, Debug)]
struct ChangesetEntry<C> {
    update_type: UpdateType,
    changeset: C,
}

/// Keeps the changeset of every committed version above the purge floor.
///
/// Versions at or below [`earliest_changeset_version`](Self::earliest_changeset_version)
/// cannot be aggregated any more; asking for them yields `None` and the
/// caller must fall back to a full rebuild.
#[derive(Clone, Debug)]
pub struct ChangesetManager<C: Changeset> {
    /// Changeset being filled by the open update scope.
    current: C,

    /// Committed changesets by version.
    entries: BTreeMap<Version, ChangesetEntry<C>>,

    /// Purge floor. Only moves forward.
    earliest: Version,
}

impl<C: Changeset> ChangesetManager<C> {
    pub fn new() -> Self {
        Self {
            current: C::default(),
            entries: BTreeMap::new(),
            earliest: Version(0),
        }
    }

    /// The working changeset of the open scope.
    pub fn current_changeset(&self) -> &C {
        &self.current
    }

    pub fn current_changeset_mut(&mut self) -> &mut C {
        &mut self.current
    }

    /// Oldest version from which an aggregated changeset is authoritative.
    pub fn earliest_changeset_version(&self) -> Version {
        self.earliest
    }

    /// Number of retained versions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store the working changeset under `version` and start a fresh one.
    pub fn push_changeset(&mut self, version: Version, update_type: UpdateType) {
        let changeset = std::mem::take(&mut self.current);
        self.entries.insert(
            version,
            ChangesetEntry {
                update_type,
                changeset,
            },
        );
    }

    /// Remove every changeset keyed strictly below `until`.
    ///
    /// The floor becomes `until` clamped to `current`, unless it is already
    /// higher. Returns the resulting floor.
    pub fn purge_old_changesets(&mut self, until: Version, current: Version) -> Version {
        let floor = until.min(current);
        if floor > self.earliest {
            self.earliest = floor;
            self.entries = self.entries.split_off(&floor);
        }
        self.earliest
    }

    /// Drop all history, including the working changeset, and move the floor
    /// to `version`.
    pub fn purge_all(&mut self, version: Version) {
        self.current.clear();
        self.entries.clear();
        if version > self.earliest {
            self.earliest = version;
        }
    }

    /// Keep at most `max` committed versions, moving the floor as needed.
    pub fn limit_history(&mut self, max: usize, current: Version) {
        if self.entries.len() <= max {
            return;
        }
        if max == 0 {
            self.entries.clear();
            self.earliest = self.earliest.max(current);
            return;
        }

        let skip = self.entries.len() - max;
        if let Some(first_kept) = self.entries.keys().nth(skip).copied() {
            self.entries = self.entries.split_off(&first_kept);
            let floor = Version(first_kept.0.saturating_sub(1));
            self.earliest = self.earliest.max(floor);
        }
    }

    /// Union of every changeset in `(since, current]`.
    ///
    /// Returns `None` when `since` is below the floor: part of that range was
    /// purged, so any union would silently miss changes.
    pub fn aggregated_changeset(&self, since: Version, current: Version) -> Option<C> {
        if since < self.earliest {
            return None;
        }
        let mut aggregated = C::default();
        aggregated.aggregate_from(
            self.range(since, current)
                .map(|entry| &entry.changeset),
        );
        Some(aggregated)
    }

    /// Combined severity of the versions in `(since, current]`.
    ///
    /// `Complete` when `since` is below the floor.
    pub fn update_type_since(&self, since: Version, current: Version) -> UpdateType {
        if since >= current {
            return UpdateType::None;
        }
        if since < self.earliest {
            return UpdateType::Complete;
        }
        UpdateType::combine_all(self.range(since, current).map(|entry| entry.update_type))
    }

    fn range(
        &self,
        since: Version,
        current: Version,
    ) -> impl Iterator<Item = &ChangesetEntry<C>> + '_ {
        let upper = if current > since { current } else { since };
        self.entries
            .range((Bound::Excluded(since), Bound::Included(upper)))
            .map(|(_, entry)| entry)
    }
}

impl<C: Changeset> Default for ChangesetManager<C> {
    fn default() -> Self {
        Self::new()
    }
}
