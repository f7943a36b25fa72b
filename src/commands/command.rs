//! The command trait.

use std::any::Any;
use std::fmt;

/// An immutable request to change the state.
///
/// Each concrete command type has exactly one handler in a
/// [`Dispatcher`](super::Dispatcher).
pub trait Command: Any + fmt::Debug {
    /// Short type name, used in logs and diagnostics.
    fn name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Whether dispatching this command records an undo step.
    fn is_undoable(&self) -> bool {
        false
    }
}

/// `graphstate::components::SelectElements` -> `SelectElements`.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
