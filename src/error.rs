//! Error types for the state machinery.

use crate::types::ComponentKey;
use thiserror::Error;

/// Main error type for state, dispatch, observer and undo operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Handler already registered for command: {0}")]
    DuplicateHandler(&'static str),

    #[error("No handler registered for command: {0}")]
    NoHandler(&'static str),

    #[error("Recursive dispatch of {command} while {running} is running")]
    RecursiveDispatch {
        command: &'static str,
        running: String,
    },

    #[error("Component not found: {0}")]
    ComponentNotFound(ComponentKey),

    #[error("Component {key} is not a {expected}")]
    ComponentTypeMismatch {
        key: ComponentKey,
        expected: &'static str,
    },

    #[error("Observer already registered: {0}")]
    DuplicateObserver(String),

    #[error("Observer dependency cycle: {0:?}")]
    ObserverCycle(Vec<String>),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Handler for {command} failed: {message}")]
    Handler {
        command: &'static str,
        message: String,
    },
}

impl StateError {
    /// Build a handler failure for `command`.
    pub fn handler(command: &'static str, message: impl Into<String>) -> Self {
        StateError::Handler {
            command,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for StateError {
    fn from(e: serde_json::Error) -> Self {
        StateError::Serialization(e.to_string())
    }
}

/// Result type for state operations.
pub type Result<T> = std::result::Result<T, StateError>;
