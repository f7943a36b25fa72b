//! Versioned state components.
//!
//! Each component is an independently versioned slice of editor state. Its
//! data can only be changed through an [`UpdateScope`], which commits exactly
//! one version increment and records the change severity when it is dropped.
//! Consumers read deltas through [`Observation`]s keyed by their own
//! bookmarks.

mod component;
mod observation;
mod store;

pub use component::{AnyComponent, ComponentData, StateComponent, UpdateScope};
pub use observation::Observation;
pub use store::{State, DEFAULT_MAX_RETAINED_CHANGESETS};
