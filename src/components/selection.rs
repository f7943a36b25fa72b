//! Element selection of one graph in one view.

use crate::changesets::ElementChangeset;
use crate::commands::Command;
use crate::error::Result;
use crate::state::{ComponentData, State, UpdateScope};
use crate::types::{ElementId, IdentityKey, UpdateType};
use crate::undo::ReferenceResolver;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Selected graph elements.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    selected: BTreeSet<ElementId>,
}

impl SelectionState {
    pub fn is_selected(&self, id: &ElementId) -> bool {
        self.selected.contains(id)
    }

    pub fn selected(&self) -> &BTreeSet<ElementId> {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

impl ComponentData for SelectionState {
    const KIND: &'static str = "selection";
    type Changeset = ElementChangeset;

    fn validate_after_deserialize(&mut self, resolver: &dyn ReferenceResolver) -> usize {
        let before = self.selected.len();
        self.selected.retain(|id| resolver.resolves(id));
        before - self.selected.len()
    }
}

impl UpdateScope<'_, SelectionState> {
    /// Select or deselect `ids`.
    ///
    /// Every id passed is recorded in the changeset, including ids whose
    /// selection did not change.
    pub fn select_elements(&mut self, ids: impl IntoIterator<Item = ElementId>, select: bool) {
        let (data, changeset) = self.parts_mut();
        let mut touched = false;
        for id in ids {
            if select {
                data.selected.insert(id);
            } else {
                data.selected.remove(&id);
            }
            changeset.add_changed(id);
            touched = true;
        }
        if touched {
            self.set_update_type(UpdateType::Partial);
        }
    }

    /// Deselect everything.
    pub fn clear_selection(&mut self) {
        let (data, changeset) = self.parts_mut();
        if data.selected.is_empty() {
            return;
        }
        changeset.add_changed_all(std::mem::take(&mut data.selected));
        self.set_update_type(UpdateType::Partial);
    }
}

/// How [`SelectElements`] combines with the current selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionMode {
    /// Deselect everything else first.
    Replace,
    Add,
    Remove,
}

/// Change the selection of one graph view.
#[derive(Clone, Debug)]
pub struct SelectElements {
    pub identity: IdentityKey,
    pub mode: SelectionMode,
    pub elements: Vec<ElementId>,
}

impl Command for SelectElements {
    fn is_undoable(&self) -> bool {
        true
    }
}

/// Deselect everything in one graph view.
#[derive(Clone, Debug)]
pub struct ClearSelection {
    pub identity: IdentityKey,
}

impl Command for ClearSelection {
    fn is_undoable(&self) -> bool {
        true
    }
}

pub(crate) fn handle_select_elements(state: &mut State, command: &SelectElements) -> Result<()> {
    state.update::<SelectionState, _, _>(command.identity, |scope| {
        let elements = command.elements.iter().copied();
        match command.mode {
            SelectionMode::Replace => {
                scope.clear_selection();
                scope.select_elements(elements, true);
            }
            SelectionMode::Add => scope.select_elements(elements, true),
            SelectionMode::Remove => scope.select_elements(elements, false),
        }
    })
}

pub(crate) fn handle_clear_selection(state: &mut State, command: &ClearSelection) -> Result<()> {
    state.update::<SelectionState, _, _>(command.identity, |scope| scope.clear_selection())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Guid, Version};

    fn identity() -> IdentityKey {
        IdentityKey::AssetView {
            asset: Guid::from_u128(1),
            view: Guid::from_u128(2),
        }
    }

    fn e(n: u128) -> ElementId {
        Guid::from_u128(n)
    }

    #[test]
    fn test_select_records_partial_changeset() {
        let mut state = State::new();
        state
            .update::<SelectionState, _, _>(identity(), |scope| {
                scope.select_elements([e(1), e(2)], true)
            })
            .unwrap();

        let selection = state.component::<SelectionState>(identity()).unwrap();
        assert_eq!(selection.update_type_since(Version(0)), UpdateType::Partial);
        let changed = selection.aggregated_changeset(Version(0)).unwrap();
        assert_eq!(changed.changed(), &BTreeSet::from([e(1), e(2)]));
        assert!(selection.data().is_selected(&e(1)));
    }

    #[test]
    fn test_deselecting_unselected_element_is_still_recorded() {
        let mut state = State::new();
        state
            .update::<SelectionState, _, _>(identity(), |scope| {
                scope.select_elements([e(1), e(2)], true);
                scope.select_elements([e(3)], false);
                assert_eq!(scope.update_type(), UpdateType::Partial);
            })
            .unwrap();

        let selection = state.component::<SelectionState>(identity()).unwrap();
        assert_eq!(selection.data().len(), 2);
        let changed = selection.aggregated_changeset(Version(0)).unwrap();
        assert!(changed.contains(&e(3)));
        assert_eq!(changed.len(), 3);
    }

    #[test]
    fn test_clear_records_previous_selection() {
        let mut state = State::new();
        handle_select_elements(
            &mut state,
            &SelectElements {
                identity: identity(),
                mode: SelectionMode::Add,
                elements: vec![e(1), e(2)],
            },
        )
        .unwrap();
        handle_clear_selection(&mut state, &ClearSelection { identity: identity() }).unwrap();

        let selection = state.component::<SelectionState>(identity()).unwrap();
        assert!(selection.data().is_empty());
        assert_eq!(selection.aggregated_changeset(Version(1)).unwrap().len(), 2);
    }

    #[test]
    fn test_clear_empty_selection_is_none() {
        let mut state = State::new();
        handle_clear_selection(&mut state, &ClearSelection { identity: identity() }).unwrap();
        let selection = state.component::<SelectionState>(identity()).unwrap();
        assert_eq!(selection.current_version(), Version(1));
        assert_eq!(selection.update_type_since(Version(0)), UpdateType::None);
    }

    #[test]
    fn test_replace_mode() {
        let mut state = State::new();
        let select = |state: &mut State, mode: SelectionMode, elements: Vec<ElementId>| {
            handle_select_elements(
                state,
                &SelectElements {
                    identity: identity(),
                    mode,
                    elements,
                },
            )
            .unwrap()
        };
        select(&mut state, SelectionMode::Add, vec![e(1), e(2)]);
        select(&mut state, SelectionMode::Replace, vec![e(3)]);

        let selection = state.component::<SelectionState>(identity()).unwrap();
        assert_eq!(selection.data().selected(), &BTreeSet::from([e(3)]));
    }

    #[test]
    fn test_validate_drops_unresolved() {
        let mut data = SelectionState::default();
        data.selected.extend([e(1), e(2), e(3)]);
        let live = |id: &ElementId| *id != e(2);
        assert_eq!(data.validate_after_deserialize(&live), 1);
        assert!(!data.is_selected(&e(2)));
    }
}
