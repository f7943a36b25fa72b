//! Observers: consumers of component deltas.
//!
//! An [`Observer`] declares which components it reads and which it writes.
//! The [`ObserverManager`] runs every observer once per pump, hands it one
//! [`Observation`](crate::state::Observation) per observed component, and
//! then purges changeset history that no observer's bookmark still needs.
//!
//! Observers run in registration order unless the manager was built with
//! [`ObserverOrdering::Dependencies`].

mod manager;
mod observer;

pub use manager::{ObserverManager, ObserverOrdering, PumpReport};
pub use observer::Observer;
