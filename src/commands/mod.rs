//! Command routing.
//!
//! A [`Command`] is an immutable request. The [`Dispatcher`] routes it to the
//! single handler registered for its concrete type; the handler mutates the
//! [`State`](crate::state::State) through update scopes and returns. Follow-up
//! work belongs to observers, never to nested dispatches.
//!
//! # Example
//!
//! ```ignore
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.register_command_handler(|state: &mut State, cmd: &SelectElements| {
//!     state.update::<SelectionState, _, _>(cmd.identity, |scope| {
//!         scope.select_elements(cmd.elements.iter().copied(), true)
//!     })
//! })?;
//!
//! dispatcher.dispatch(&mut state, &SelectElements { .. })?;
//! ```

mod command;
mod dispatcher;
mod preferences;

pub use command::Command;
pub use dispatcher::{DispatchDiagnostics, Dispatcher};
pub use preferences::{DispatchPreferences, Preferences};
