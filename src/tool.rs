//! Main GraphTool struct tying state, dispatch, observers and undo together.

use crate::commands::{Command, DispatchDiagnostics, Dispatcher, Preferences};
use crate::error::Result;
use crate::observers::{Observer, ObserverManager, ObserverOrdering, PumpReport};
use crate::state::{ComponentData, State, DEFAULT_MAX_RETAINED_CHANGESETS};
use crate::types::{Guid, IdentityKey};
use crate::undo::{ReferenceResolver, UndoStack, DEFAULT_UNDO_DEPTH};
use std::sync::Arc;

/// Tool configuration.
#[derive(Clone, Debug)]
pub struct ToolConfig {
    /// Maximum changesets a component keeps, observed or not.
    pub max_retained_changesets: usize,

    /// Maximum undo steps.
    pub undo_depth: usize,

    /// Log every dispatched command.
    pub log_all_commands: bool,

    /// Reject commands dispatched from inside a running handler.
    pub error_on_recursive_dispatch: bool,

    /// Observer run order.
    pub observer_ordering: ObserverOrdering,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            max_retained_changesets: DEFAULT_MAX_RETAINED_CHANGESETS,
            undo_depth: DEFAULT_UNDO_DEPTH,
            log_all_commands: false,
            error_on_recursive_dispatch: true,
            observer_ordering: ObserverOrdering::Registration,
        }
    }
}

/// The state machinery of one graph editor.
///
/// One cycle is: [`dispatch`](Self::dispatch) any number of commands, then
/// [`update`](Self::update) to run the observers once.
pub struct GraphTool {
    config: ToolConfig,
    preferences: Arc<Preferences>,
    state: State,
    dispatcher: Dispatcher,
    observers: ObserverManager,
    undo: UndoStack,
}

impl GraphTool {
    pub fn new(config: ToolConfig) -> Self {
        let preferences = Arc::new(Preferences::new(
            config.log_all_commands,
            config.error_on_recursive_dispatch,
        ));
        let dispatcher = Dispatcher::with_preferences(preferences.clone());

        Self {
            state: State::with_max_retained_changesets(config.max_retained_changesets),
            dispatcher,
            observers: ObserverManager::with_ordering(config.observer_ordering),
            undo: UndoStack::new(config.undo_depth),
            preferences,
            config,
        }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Diagnostic flags, togglable at runtime.
    pub fn preferences(&self) -> &Arc<Preferences> {
        &self.preferences
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Mutable state, for setup outside of commands.
    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    pub fn observers(&self) -> &ObserverManager {
        &self.observers
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo
    }

    // --- Registration ---

    pub fn register_command_handler<C, F>(&mut self, handler: F) -> Result<()>
    where
        C: Command,
        F: Fn(&mut State, &C) -> Result<()> + Send + Sync + 'static,
    {
        self.dispatcher.register_command_handler(handler)
    }

    pub fn register_observer(&mut self, observer: Box<dyn Observer>) -> Result<()> {
        self.observers.register_observer(observer)
    }

    pub fn unregister_observer(&mut self, name: &str) -> Option<Box<dyn Observer>> {
        self.observers.unregister_observer(name)
    }

    /// Put the component of type `D` for `identity` on the undo allow-list.
    pub fn track_undo<D: ComponentData>(&mut self, identity: IdentityKey) {
        self.undo.track::<D>(identity);
    }

    // --- Command Operations ---

    /// Dispatch a command.
    ///
    /// Undoable commands with a registered handler record an undo step
    /// before the handler runs.
    pub fn dispatch<C: Command>(&mut self, command: &C) -> Result<()> {
        if command.is_undoable() && self.dispatcher.has_handler::<C>() {
            self.undo.push_undo(&self.state, command)?;
        }
        self.dispatcher.dispatch(&mut self.state, command)
    }

    /// Run every observer once and trim changeset history.
    pub fn update(&mut self) -> PumpReport {
        let report = self.observers.pump(&mut self.state);
        self.state.enforce_history_limit();
        report
    }

    pub fn diagnostics(&self) -> DispatchDiagnostics {
        self.dispatcher.diagnostics()
    }

    // --- Undo Operations ---

    pub fn undo(&mut self, resolver: &dyn ReferenceResolver) -> Result<bool> {
        self.undo.undo(&mut self.state, resolver)
    }

    pub fn redo(&mut self, resolver: &dyn ReferenceResolver) -> Result<bool> {
        self.undo.redo(&mut self.state, resolver)
    }

    // --- Lifecycle ---

    /// Drop every component bound to `asset`.
    ///
    /// The components come back at version 0 on next access; observers see
    /// them as completely changed.
    pub fn reset_asset(&mut self, asset: &Guid) -> usize {
        self.state.reset_asset(asset)
    }

    /// Drop every component bound to `view` and stop tracking them for undo.
    pub fn close_view(&mut self, view: &Guid) -> usize {
        self.undo.untrack_where(|identity| identity.mentions_view(view));
        self.state.reset_view(view)
    }
}

impl Default for GraphTool {
    fn default() -> Self {
        Self::new(ToolConfig::default())
    }
}
