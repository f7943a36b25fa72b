//! Undo/redo of an explicit allow-list of components.

use super::record::{ReferenceResolver, UndoRecord};
use crate::commands::Command;
use crate::error::Result;
use crate::state::{ComponentData, State, StateComponent};
use crate::types::{ComponentKey, IdentityKey};
use std::collections::VecDeque;

/// Default maximum number of undo steps.
pub const DEFAULT_UNDO_DEPTH: usize = 100;

/// A named undo step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoStep {
    /// Name of the command that recorded the step.
    pub name: String,
    /// The allow-listed components as they were before (undo side) or after
    /// (redo side) the step.
    pub record: UndoRecord,
}

/// A component on the allow-list, with the typed restore for its entries.
struct TrackedComponent {
    key: ComponentKey,
    restore: fn(&mut State, IdentityKey, &str) -> Result<()>,
}

/// Parse `serialized` as `D`, then replace the component's data as a complete
/// update. The component is created only once the entry has parsed.
fn restore_component<D: ComponentData>(
    state: &mut State,
    identity: IdentityKey,
    serialized: &str,
) -> Result<()> {
    let key = ComponentKey::new(D::KIND, identity);
    let data = StateComponent::<D>::parse_undo_entry(&key, serialized)?;
    state.get_or_create::<D>(identity)?.update_scope().replace(data);
    Ok(())
}

/// Linear undo history over snapshots of the tracked components.
///
/// Steps below the cursor can be undone, steps at or above it redone. Undo
/// and redo swap the step's record with a snapshot of the current state, so
/// the same step serves both directions.
pub struct UndoStack {
    tracked: Vec<TrackedComponent>,
    steps: VecDeque<UndoStep>,
    cursor: usize,
    max_depth: usize,
}

impl UndoStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            tracked: Vec::new(),
            steps: VecDeque::new(),
            cursor: 0,
            max_depth,
        }
    }

    /// Add the component of type `D` for `identity` to the allow-list.
    pub fn track<D: ComponentData>(&mut self, identity: IdentityKey) {
        let key = ComponentKey::new(D::KIND, identity);
        if self.is_tracked(&key) {
            return;
        }
        self.tracked.push(TrackedComponent {
            key,
            restore: restore_component::<D>,
        });
    }

    /// Remove every allow-list entry whose identity matches.
    pub fn untrack_where(&mut self, matches: impl Fn(&IdentityKey) -> bool) {
        self.tracked.retain(|t| !matches(&t.key.identity));
    }

    pub fn is_tracked(&self, key: &ComponentKey) -> bool {
        self.tracked.iter().any(|t| t.key == *key)
    }

    pub fn tracked_keys(&self) -> Vec<ComponentKey> {
        self.tracked.iter().map(|t| t.key).collect()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.steps.len()
    }

    pub fn undo_len(&self) -> usize {
        self.cursor
    }

    pub fn redo_len(&self) -> usize {
        self.steps.len() - self.cursor
    }

    /// Name of the step the next `undo` would revert.
    pub fn undo_name(&self) -> Option<&str> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.steps.get(i))
            .map(|s| s.name.as_str())
    }

    pub fn clear(&mut self) {
        self.steps.clear();
        self.cursor = 0;
    }

    /// Serialize every tracked component that currently exists.
    pub fn serialize_to_undo(&self, state: &State) -> Result<UndoRecord> {
        let mut record = UndoRecord::new();
        for tracked in &self.tracked {
            if let Some(component) = state.get(&tracked.key) {
                record.insert(tracked.key.record_name(), component.serialize_for_undo()?);
            }
        }
        Ok(record)
    }

    /// Record an undo step for `command` if it is undoable.
    ///
    /// Must be called before the command's handler runs. Returns whether a
    /// step was recorded.
    pub fn push_undo<C: Command>(&mut self, state: &State, command: &C) -> Result<bool> {
        if !command.is_undoable() {
            return Ok(false);
        }
        let record = self.serialize_to_undo(state)?;
        self.push_step(command.name(), record);
        Ok(true)
    }

    /// Record a step, discarding any redo history.
    pub fn push_step(&mut self, name: impl Into<String>, record: UndoRecord) {
        self.steps.truncate(self.cursor);
        self.steps.push_back(UndoStep {
            name: name.into(),
            record,
        });
        while self.steps.len() > self.max_depth {
            self.steps.pop_front();
        }
        self.cursor = self.steps.len();
        tracing::debug!(
            step = self.undo_name().unwrap_or_default(),
            depth = self.cursor,
            "undo step recorded"
        );
    }

    /// Restore every tracked component named in `record`, then repair the
    /// references of the restored components.
    ///
    /// Tracked components missing from the record are left untouched. Entries
    /// that fail to deserialize are logged and skipped. Returns the restored
    /// keys.
    pub fn deserialize_from_undo(
        &self,
        state: &mut State,
        record: &UndoRecord,
        resolver: &dyn ReferenceResolver,
    ) -> Vec<ComponentKey> {
        let mut restored = Vec::new();
        for tracked in &self.tracked {
            let Some(serialized) = record.get(&tracked.key.record_name()) else {
                continue;
            };
            match (tracked.restore)(state, tracked.key.identity, serialized) {
                Ok(()) => restored.push(tracked.key),
                Err(e) => {
                    tracing::warn!(key = %tracked.key, error = %e, "skipping undo entry");
                }
            }
        }

        for key in &restored {
            if let Some(component) = state.get_erased_mut(key) {
                let dropped = component.validate_after_deserialize(resolver);
                if dropped > 0 {
                    tracing::warn!(key = %key, dropped, "dropped dangling references after restore");
                }
            }
        }
        restored
    }

    /// Revert the most recent step. Returns false when there is nothing to undo.
    pub fn undo(&mut self, state: &mut State, resolver: &dyn ReferenceResolver) -> Result<bool> {
        if !self.can_undo() {
            return Ok(false);
        }
        let index = self.cursor - 1;
        self.swap_and_restore(index, state, resolver)?;
        self.cursor = index;
        Ok(true)
    }

    /// Re-apply the most recently undone step. Returns false when there is
    /// nothing to redo.
    pub fn redo(&mut self, state: &mut State, resolver: &dyn ReferenceResolver) -> Result<bool> {
        if !self.can_redo() {
            return Ok(false);
        }
        self.swap_and_restore(self.cursor, state, resolver)?;
        self.cursor += 1;
        Ok(true)
    }

    fn swap_and_restore(
        &mut self,
        index: usize,
        state: &mut State,
        resolver: &dyn ReferenceResolver,
    ) -> Result<()> {
        let current = self.serialize_to_undo(state)?;
        let Some(step) = self.steps.get_mut(index) else {
            return Ok(());
        };
        let record = std::mem::replace(&mut step.record, current);
        tracing::debug!(step = %step.name, "restoring undo step");
        self.deserialize_from_undo(state, &record, resolver);
        Ok(())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changesets::NoChangeset;
    use crate::error::StateError;
    use crate::types::{Guid, UpdateType, Version};
    use crate::undo::ResolveAll;
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;

    #[derive(Default, Serialize, Deserialize)]
    struct Title {
        text: String,
    }

    impl ComponentData for Title {
        const KIND: &'static str = "title";
        type Changeset = NoChangeset;
    }

    /// Keyed by a non-string type, which JSON objects cannot hold.
    #[derive(Default, Serialize, Deserialize)]
    struct Positions {
        at: HashMap<Guid, u32>,
    }

    impl ComponentData for Positions {
        const KIND: &'static str = "positions";
        type Changeset = NoChangeset;
    }

    #[derive(Debug)]
    struct Rename(&'static str);

    impl Command for Rename {
        fn is_undoable(&self) -> bool {
            true
        }
    }

    #[derive(Debug)]
    struct Peek;

    impl Command for Peek {}

    fn asset() -> IdentityKey {
        IdentityKey::Asset(Guid::from_u128(1))
    }

    fn rename(undo: &mut UndoStack, state: &mut State, text: &'static str) {
        undo.push_undo(state, &Rename(text)).unwrap();
        state
            .update::<Title, _, _>(asset(), |scope| {
                scope.data_mut().text = text.to_string();
                scope.set_update_type(UpdateType::Partial);
            })
            .unwrap();
    }

    fn title(state: &State) -> String {
        state.component::<Title>(asset()).unwrap().data().text.clone()
    }

    #[test]
    fn test_undo_redo_roundtrip() {
        let mut state = State::new();
        let mut undo = UndoStack::default();
        undo.track::<Title>(asset());
        state.get_or_create::<Title>(asset()).unwrap();

        rename(&mut undo, &mut state, "first");
        rename(&mut undo, &mut state, "second");
        assert_eq!(undo.undo_len(), 2);
        assert_eq!(undo.undo_name(), Some("Rename"));

        assert!(undo.undo(&mut state, &ResolveAll).unwrap());
        assert_eq!(title(&state), "first");
        assert!(undo.undo(&mut state, &ResolveAll).unwrap());
        assert_eq!(title(&state), "");
        assert!(!undo.undo(&mut state, &ResolveAll).unwrap());

        assert!(undo.redo(&mut state, &ResolveAll).unwrap());
        assert_eq!(title(&state), "first");
        assert!(undo.redo(&mut state, &ResolveAll).unwrap());
        assert_eq!(title(&state), "second");
        assert!(!undo.can_redo());
    }

    #[test]
    fn test_restore_is_complete_update() {
        let mut state = State::new();
        let mut undo = UndoStack::default();
        undo.track::<Title>(asset());
        state.get_or_create::<Title>(asset()).unwrap();
        rename(&mut undo, &mut state, "first");

        undo.undo(&mut state, &ResolveAll).unwrap();
        let component = state.component::<Title>(asset()).unwrap();
        assert_eq!(component.update_type_since(Version(1)), UpdateType::Complete);
    }

    #[test]
    fn test_non_undoable_command_records_nothing() {
        let state = State::new();
        let mut undo = UndoStack::default();
        undo.track::<Title>(asset());
        assert!(!undo.push_undo(&state, &Peek).unwrap());
        assert!(!undo.can_undo());
    }

    #[test]
    fn test_push_discards_redo_history() {
        let mut state = State::new();
        let mut undo = UndoStack::default();
        undo.track::<Title>(asset());
        state.get_or_create::<Title>(asset()).unwrap();
        rename(&mut undo, &mut state, "first");
        rename(&mut undo, &mut state, "second");
        undo.undo(&mut state, &ResolveAll).unwrap();

        rename(&mut undo, &mut state, "third");
        assert!(!undo.can_redo());
        assert_eq!(undo.undo_len(), 2);
    }

    #[test]
    fn test_depth_limit_drops_oldest() {
        let mut state = State::new();
        let mut undo = UndoStack::new(2);
        undo.track::<Title>(asset());
        state.get_or_create::<Title>(asset()).unwrap();
        rename(&mut undo, &mut state, "a");
        rename(&mut undo, &mut state, "b");
        rename(&mut undo, &mut state, "c");

        assert_eq!(undo.undo_len(), 2);
        undo.undo(&mut state, &ResolveAll).unwrap();
        undo.undo(&mut state, &ResolveAll).unwrap();
        assert_eq!(title(&state), "a");
    }

    #[test]
    fn test_absent_entry_leaves_component_untouched() {
        let mut state = State::new();
        let mut undo = UndoStack::default();
        undo.track::<Title>(asset());
        rename(&mut undo, &mut state, "created later");
        let version = state.component::<Title>(asset()).unwrap().current_version();

        // Recorded before the component existed, so the record is empty.
        assert!(undo.undo(&mut state, &ResolveAll).unwrap());
        assert_eq!(title(&state), "created later");
        assert_eq!(
            state.component::<Title>(asset()).unwrap().current_version(),
            version
        );
    }

    #[test]
    fn test_corrupt_entry_is_skipped() {
        let mut state = State::new();
        let mut undo = UndoStack::default();
        undo.track::<Title>(asset());
        let key = ComponentKey::new(Title::KIND, asset());
        let mut record = UndoRecord::new();
        record.insert(key.record_name(), "{ not json");

        let restored = undo.deserialize_from_undo(&mut state, &record, &ResolveAll);
        assert!(restored.is_empty());
        assert!(!state.contains(&key));
    }

    #[test]
    fn test_corrupt_entry_leaves_existing_component_untouched() {
        let mut state = State::new();
        let mut undo = UndoStack::default();
        undo.track::<Title>(asset());
        rename(&mut undo, &mut state, "kept");
        let version = state.component::<Title>(asset()).unwrap().current_version();

        let mut record = UndoRecord::new();
        record.insert(ComponentKey::new(Title::KIND, asset()).record_name(), "[1, 2");
        let restored = undo.deserialize_from_undo(&mut state, &record, &ResolveAll);

        assert!(restored.is_empty());
        assert_eq!(title(&state), "kept");
        assert_eq!(
            state.component::<Title>(asset()).unwrap().current_version(),
            version
        );
    }

    #[test]
    fn test_failed_snapshot_keeps_cursor() {
        let mut state = State::new();
        let mut undo = UndoStack::default();
        undo.track::<Title>(asset());
        undo.track::<Positions>(asset());
        state.get_or_create::<Title>(asset()).unwrap();
        state.get_or_create::<Positions>(asset()).unwrap();
        rename(&mut undo, &mut state, "after");

        state
            .update::<Positions, _, _>(asset(), |scope| {
                scope.data_mut().at.insert(Guid::from_u128(7), 3);
            })
            .unwrap();

        let result = undo.undo(&mut state, &ResolveAll);
        assert!(matches!(result, Err(StateError::Serialization(_))));
        assert!(undo.can_undo());
        assert!(!undo.can_redo());
        assert_eq!(undo.undo_len(), 1);
        assert_eq!(title(&state), "after");

        state
            .update::<Positions, _, _>(asset(), |scope| scope.data_mut().at.clear())
            .unwrap();
        assert!(undo.undo(&mut state, &ResolveAll).unwrap());
        assert_eq!(title(&state), "");
        assert!(undo.can_redo());
    }
}
