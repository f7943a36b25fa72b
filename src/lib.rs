//! # Graph State
//!
//! Versioned editor state for node-graph tools, with command dispatch,
//! change observers and undo.
//!
//! ## Core Concepts
//!
//! - **State components**: Independently versioned slices of editor state,
//!   changed only through update scopes
//! - **Changesets**: Per-version deltas so consumers can patch instead of
//!   rebuilding
//! - **Commands**: Immutable requests routed to exactly one handler
//! - **Observers**: Consumers of component deltas, run once per update
//! - **Undo**: Snapshots of an explicit allow-list of components
//!
//! ## Example
//!
//! ```ignore
//! use graphstate::{components, GraphTool, ToolConfig, IdentityKey, SelectElements};
//!
//! let mut tool = GraphTool::new(ToolConfig::default());
//! components::register_command_handlers(tool.dispatcher_mut())?;
//! tool.track_undo::<SelectionState>(identity);
//!
//! tool.dispatch(&SelectElements {
//!     identity,
//!     mode: SelectionMode::Add,
//!     elements: vec![node],
//! })?;
//!
//! // Observers see one partial change to the selection
//! tool.update();
//! ```

pub mod changesets;
pub mod commands;
pub mod components;
pub mod error;
pub mod observers;
pub mod state;
pub mod tool;
pub mod types;
pub mod undo;

// Re-exports
pub use changesets::{Changeset, ChangesetManager, ElementChangeset, NoChangeset};
pub use commands::{Command, DispatchDiagnostics, DispatchPreferences, Dispatcher, Preferences};
pub use components::{
    BlackboardViewState, ClearSelection, LoadGraph, SelectElements, SelectionMode,
    SelectionState, SetVariableDeclarationExpanded, ToolState,
};
pub use error::{Result, StateError};
pub use observers::{Observer, ObserverManager, ObserverOrdering, PumpReport};
pub use state::{AnyComponent, ComponentData, Observation, State, StateComponent, UpdateScope};
pub use tool::{GraphTool, ToolConfig};
pub use types::{
    Bookmark, ComponentKey, ElementId, Guid, IdentityKey, InstanceId, UpdateType, Version,
};
pub use undo::{ReferenceResolver, ResolveAll, UndoRecord, UndoStack, UndoStep};
