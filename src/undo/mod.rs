//! Undo/redo snapshots of an explicit allow-list of components.
//!
//! Only tracked components take part in undo; view-only state is left out by
//! not tracking it. Before an undoable command runs, the tracked components
//! are serialized into an [`UndoRecord`] attached to a new step. Activating a
//! step restores every tracked component named in its record and then lets
//! each restored component drop references the live graph no longer has.

mod record;
mod stack;

pub use record::{ReferenceResolver, ResolveAll, UndoRecord};
pub use stack::{UndoStack, UndoStep, DEFAULT_UNDO_DEPTH};
