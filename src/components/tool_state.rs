//! Per-window tool state: which graph asset is loaded.

use crate::changesets::NoChangeset;
use crate::commands::Command;
use crate::error::Result;
use crate::state::{ComponentData, State, UpdateScope};
use crate::types::{Guid, IdentityKey, UpdateType};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolState {
    current_graph: Option<Guid>,
    /// Previously loaded graphs, oldest first.
    history: Vec<Guid>,
}

impl ToolState {
    pub fn current_graph(&self) -> Option<Guid> {
        self.current_graph
    }

    pub fn history(&self) -> &[Guid] {
        &self.history
    }
}

impl ComponentData for ToolState {
    const KIND: &'static str = "tool";
    type Changeset = NoChangeset;
}

impl UpdateScope<'_, ToolState> {
    /// Make `asset` the current graph. Returns the graph it replaced.
    pub fn load_graph(&mut self, asset: Guid) -> Option<Guid> {
        let data = self.data_mut();
        let previous = data.current_graph.replace(asset);
        if let Some(previous) = previous {
            data.history.push(previous);
        }
        self.force_update_type(UpdateType::Complete);
        previous
    }
}

/// Load a graph asset into a window.
///
/// Components bound to the previously loaded asset are dropped, so anything
/// observing them sees fresh instances.
#[derive(Clone, Debug)]
pub struct LoadGraph {
    pub view: Guid,
    pub asset: Guid,
}

impl Command for LoadGraph {}

pub(crate) fn handle_load_graph(state: &mut State, command: &LoadGraph) -> Result<()> {
    let previous = state.update::<ToolState, _, _>(IdentityKey::View(command.view), |scope| {
        scope.load_graph(command.asset)
    })?;
    if let Some(previous) = previous.filter(|p| *p != command.asset) {
        state.reset_asset(&previous);
    }
    Ok(())
}
