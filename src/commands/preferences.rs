//! Diagnostic flags queried by the dispatcher on every dispatch.

use std::sync::atomic::{AtomicBool, Ordering};

/// Source of the dispatcher's diagnostic flags.
pub trait DispatchPreferences: Send + Sync {
    /// Log the type of every dispatched command.
    fn log_all_dispatched_commands(&self) -> bool;

    /// Reject dispatches issued from inside a running handler.
    fn error_on_recursive_dispatch(&self) -> bool;
}

/// Runtime-togglable preferences.
#[derive(Debug)]
pub struct Preferences {
    log_all_dispatched_commands: AtomicBool,
    error_on_recursive_dispatch: AtomicBool,
}

impl Preferences {
    pub fn new(log_all_dispatched_commands: bool, error_on_recursive_dispatch: bool) -> Self {
        Self {
            log_all_dispatched_commands: AtomicBool::new(log_all_dispatched_commands),
            error_on_recursive_dispatch: AtomicBool::new(error_on_recursive_dispatch),
        }
    }

    pub fn set_log_all_dispatched_commands(&self, enabled: bool) {
        self.log_all_dispatched_commands
            .store(enabled, Ordering::Relaxed);
    }

    pub fn set_error_on_recursive_dispatch(&self, enabled: bool) {
        self.error_on_recursive_dispatch
            .store(enabled, Ordering::Relaxed);
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self::new(false, true)
    }
}

impl DispatchPreferences for Preferences {
    fn log_all_dispatched_commands(&self) -> bool {
        self.log_all_dispatched_commands.load(Ordering::Relaxed)
    }

    fn error_on_recursive_dispatch(&self) -> bool {
        self.error_on_recursive_dispatch.load(Ordering::Relaxed)
    }
}
