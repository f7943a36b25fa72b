//! Changeset types.

use crate::types::ElementId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A delta record produced by one update scope.
///
/// Aggregation is always clear-then-union: the result of
/// [`aggregate_from`](Changeset::aggregate_from) covers every changeset it was
/// given and nothing else.
pub trait Changeset: Clone + Default + fmt::Debug + 'static {
    /// Reset to the empty changeset.
    fn clear(&mut self);

    /// Whether nothing is recorded.
    fn is_empty(&self) -> bool;

    /// Add everything recorded in `other` to `self`.
    fn union_with(&mut self, other: &Self);

    /// Replace `self` with the union of `changesets`.
    fn aggregate_from<'a, I>(&mut self, changesets: I)
    where
        I: IntoIterator<Item = &'a Self>,
        Self: 'a,
    {
        self.clear();
        for changeset in changesets {
            self.union_with(changeset);
        }
    }
}

/// Changeset for components that only track versions and severities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoChangeset;

impl Changeset for NoChangeset {
    fn clear(&mut self) {}

    fn is_empty(&self) -> bool {
        true
    }

    fn union_with(&mut self, _other: &Self) {}
}

/// Set of graph elements touched during the covered versions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementChangeset {
    changed: BTreeSet<ElementId>,
}

impl ElementChangeset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` as changed.
    pub fn add_changed(&mut self, id: ElementId) {
        self.changed.insert(id);
    }

    /// Record every id in `ids` as changed.
    pub fn add_changed_all(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        self.changed.extend(ids);
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.changed.contains(id)
    }

    pub fn changed(&self) -> &BTreeSet<ElementId> {
        &self.changed
    }

    pub fn len(&self) -> usize {
        self.changed.len()
    }
}

impl Changeset for ElementChangeset {
    fn clear(&mut self) {
        self.changed.clear();
    }

    fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    fn union_with(&mut self, other: &Self) {
        self.changed.extend(other.changed.iter().copied());
    }
}
