//! Undo records and reference resolution.

use crate::types::ElementId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serialized components attached to one undo step, keyed by
/// [`ComponentKey::record_name`](crate::types::ComponentKey::record_name).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoRecord {
    entries: BTreeMap<String, String>,
}

impl UndoRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, serialized: impl Into<String>) {
        self.entries.insert(name.into(), serialized.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Looks up stable identifiers in the live domain graph.
///
/// Used after an undo/redo restore to drop references to elements that no
/// longer exist.
pub trait ReferenceResolver {
    fn resolves(&self, id: &ElementId) -> bool;
}

impl<F> ReferenceResolver for F
where
    F: Fn(&ElementId) -> bool,
{
    fn resolves(&self, id: &ElementId) -> bool {
        self(id)
    }
}

/// Resolver that accepts every identifier.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResolveAll;

impl ReferenceResolver for ResolveAll {
    fn resolves(&self, _id: &ElementId) -> bool {
        true
    }
}
