//! Per-version delta records and their bounded history.
//!
//! A [`Changeset`] names what changed during one update scope. The
//! [`ChangesetManager`] keeps one changeset per committed version so that a
//! consumer can ask "what changed since version N" and patch instead of
//! rebuilding. History below the purge floor is gone for good: a request that
//! starts there must be treated as a complete change.

mod changeset;
mod manager;

pub use changeset::{Changeset, ElementChangeset, NoChangeset};
pub use manager::ChangesetManager;
