//! State components of a node-graph editor window.
//!
//! - [`SelectionState`]: selected elements per graph and view (undoable).
//! - [`BlackboardViewState`]: expanded variable declarations (view only).
//! - [`ToolState`]: the graph asset loaded in a window.

mod blackboard;
mod selection;
mod tool_state;

pub use blackboard::{BlackboardViewState, SetVariableDeclarationExpanded};
pub use selection::{ClearSelection, SelectElements, SelectionMode, SelectionState};
pub use tool_state::{LoadGraph, ToolState};

use crate::commands::Dispatcher;
use crate::error::Result;

/// Register the handlers of every command in this module.
pub fn register_command_handlers(dispatcher: &mut Dispatcher) -> Result<()> {
    dispatcher.register_command_handler(selection::handle_select_elements)?;
    dispatcher.register_command_handler(selection::handle_clear_selection)?;
    dispatcher.register_command_handler(blackboard::handle_set_variable_declaration_expanded)?;
    dispatcher.register_command_handler(tool_state::handle_load_graph)?;
    Ok(())
}
