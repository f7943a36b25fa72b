//! Blackboard view state: which variable declarations are expanded.

use crate::changesets::ElementChangeset;
use crate::commands::Command;
use crate::error::Result;
use crate::state::{ComponentData, State, UpdateScope};
use crate::types::{ElementId, IdentityKey, UpdateType};
use crate::undo::ReferenceResolver;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackboardViewState {
    expanded: BTreeSet<ElementId>,
}

impl BlackboardViewState {
    pub fn is_expanded(&self, variable: &ElementId) -> bool {
        self.expanded.contains(variable)
    }

    pub fn expanded(&self) -> &BTreeSet<ElementId> {
        &self.expanded
    }
}

impl ComponentData for BlackboardViewState {
    const KIND: &'static str = "blackboard_view";
    type Changeset = ElementChangeset;

    fn validate_after_deserialize(&mut self, resolver: &dyn ReferenceResolver) -> usize {
        let before = self.expanded.len();
        self.expanded.retain(|id| resolver.resolves(id));
        before - self.expanded.len()
    }
}

impl UpdateScope<'_, BlackboardViewState> {
    /// Expand or collapse variable declarations. Only variables whose state
    /// actually flips are recorded.
    pub fn set_variable_declaration_expanded(
        &mut self,
        variables: impl IntoIterator<Item = ElementId>,
        expanded: bool,
    ) {
        let (data, changeset) = self.parts_mut();
        let mut changed = false;
        for variable in variables {
            let flipped = if expanded {
                data.expanded.insert(variable)
            } else {
                data.expanded.remove(&variable)
            };
            if flipped {
                changeset.add_changed(variable);
                changed = true;
            }
        }
        if changed {
            self.set_update_type(UpdateType::Partial);
        }
    }
}

/// Expand or collapse variable declarations in one blackboard.
#[derive(Clone, Debug)]
pub struct SetVariableDeclarationExpanded {
    pub identity: IdentityKey,
    pub variables: Vec<ElementId>,
    pub expanded: bool,
}

impl Command for SetVariableDeclarationExpanded {}

pub(crate) fn handle_set_variable_declaration_expanded(
    state: &mut State,
    command: &SetVariableDeclarationExpanded,
) -> Result<()> {
    state.update::<BlackboardViewState, _, _>(command.identity, |scope| {
        scope.set_variable_declaration_expanded(command.variables.iter().copied(), command.expanded)
    })
}
