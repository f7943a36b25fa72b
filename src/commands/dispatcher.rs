//! Routes each command to its single registered handler.

use super::command::{short_type_name, Command};
use super::preferences::{DispatchPreferences, Preferences};
use crate::error::{Result, StateError};
use crate::state::State;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type ErasedHandler = Box<dyn Fn(&mut State, &dyn Any) -> Result<()> + Send + Sync>;

struct RegisteredHandler {
    name: &'static str,
    handler: ErasedHandler,
}

/// Counters and last-seen values recorded by the pre-dispatch hook.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchDiagnostics {
    /// Name of the last command passed to `dispatch`.
    pub last_dispatched: Option<&'static str>,
    /// Commands that reached their handler.
    pub dispatch_count: u64,
    /// Commands rejected for a missing handler or recursive dispatch.
    pub rejected_count: u64,
}

/// Command router.
///
/// Handlers are registered once per command type; a second registration for
/// the same type fails. Dispatch runs the handler to completion before
/// returning. A dispatch issued while another handler is running is reported,
/// and rejected when [`DispatchPreferences::error_on_recursive_dispatch`] is
/// set.
pub struct Dispatcher {
    handlers: HashMap<TypeId, RegisteredHandler>,
    preferences: Arc<dyn DispatchPreferences>,
    /// Names of the handlers currently running, outermost first.
    running: Mutex<Vec<&'static str>>,
    diagnostics: Mutex<DispatchDiagnostics>,
}

impl Dispatcher {
    /// Create a dispatcher with default preferences.
    pub fn new() -> Self {
        Self::with_preferences(Arc::new(Preferences::default()))
    }

    pub fn with_preferences(preferences: Arc<dyn DispatchPreferences>) -> Self {
        Self {
            handlers: HashMap::new(),
            preferences,
            running: Mutex::new(Vec::new()),
            diagnostics: Mutex::new(DispatchDiagnostics::default()),
        }
    }

    /// Register the handler for command type `C`.
    pub fn register_command_handler<C, F>(&mut self, handler: F) -> Result<()>
    where
        C: Command,
        F: Fn(&mut State, &C) -> Result<()> + Send + Sync + 'static,
    {
        let name = short_type_name(std::any::type_name::<C>());
        let type_id = TypeId::of::<C>();
        if self.handlers.contains_key(&type_id) {
            return Err(StateError::DuplicateHandler(name));
        }

        let handler: ErasedHandler = Box::new(move |state, command| {
            match command.downcast_ref::<C>() {
                Some(command) => handler(state, command),
                None => Err(StateError::handler(name, "command type mismatch")),
            }
        });
        self.handlers
            .insert(type_id, RegisteredHandler { name, handler });
        Ok(())
    }

    pub fn has_handler<C: Command>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<C>())
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Names of the registered command types, sorted.
    pub fn registered_commands(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.values().map(|h| h.name).collect();
        names.sort_unstable();
        names
    }

    pub fn preferences(&self) -> &Arc<dyn DispatchPreferences> {
        &self.preferences
    }

    pub fn diagnostics(&self) -> DispatchDiagnostics {
        self.diagnostics.lock().clone()
    }

    /// Whether a handler is currently running.
    pub fn is_dispatching(&self) -> bool {
        !self.running.lock().is_empty()
    }

    /// Route `command` to its handler.
    ///
    /// Fails with [`StateError::NoHandler`] when no handler is registered and
    /// with [`StateError::RecursiveDispatch`] when called from a running
    /// handler while the recursion check is enabled. In both cases the state
    /// is not touched.
    pub fn dispatch<C: Command>(&self, state: &mut State, command: &C) -> Result<()> {
        let name = command.name();
        self.pre_dispatch(name, command)?;

        let Some(entry) = self.handlers.get(&TypeId::of::<C>()) else {
            self.diagnostics.lock().rejected_count += 1;
            tracing::error!(command = name, "no handler registered for command");
            return Err(StateError::NoHandler(name));
        };

        self.diagnostics.lock().dispatch_count += 1;
        let _running = RunningGuard::enter(&self.running, name);
        let result = (entry.handler)(state, command);
        if let Err(ref e) = result {
            tracing::debug!(command = name, error = %e, "command handler failed");
        }
        result
    }

    fn pre_dispatch<C: Command>(&self, name: &'static str, command: &C) -> Result<()> {
        self.diagnostics.lock().last_dispatched = Some(name);

        if self.preferences.log_all_dispatched_commands() {
            tracing::info!(command = name, ?command, "dispatching command");
        }

        let outer = self.running.lock().last().copied();
        if let Some(running) = outer {
            if self.preferences.error_on_recursive_dispatch() {
                self.diagnostics.lock().rejected_count += 1;
                tracing::error!(
                    command = name,
                    running,
                    "recursive dispatch rejected: handlers must not dispatch commands"
                );
                return Err(StateError::RecursiveDispatch {
                    command: name,
                    running: running.to_string(),
                });
            }
            tracing::warn!(command = name, running, "recursive dispatch");
        }
        Ok(())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Marks a handler as running for the guard's lifetime, unwinding included.
struct RunningGuard<'a> {
    running: &'a Mutex<Vec<&'static str>>,
}

impl<'a> RunningGuard<'a> {
    fn enter(running: &'a Mutex<Vec<&'static str>>, name: &'static str) -> Self {
        running.lock().push(name);
        Self { running }
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.running.lock().pop();
    }
}
