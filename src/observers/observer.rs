//! The observer trait.

use crate::error::Result;
use crate::state::{Observation, State};
use crate::types::ComponentKey;

/// A consumer of component deltas.
///
/// The observed and modified sets are fixed for the observer's lifetime; the
/// manager allocates one bookmark per observed component at registration.
pub trait Observer {
    /// Unique name within an [`ObserverManager`](super::ObserverManager).
    fn name(&self) -> &str;

    /// Components this observer reads.
    fn observed_components(&self) -> &[ComponentKey];

    /// Components this observer writes through their own update scopes.
    fn modified_components(&self) -> &[ComponentKey] {
        &[]
    }

    /// React to the changes since the last run.
    ///
    /// Called only when at least one observation has a severity above
    /// `None`. `observations` follows the order of
    /// [`observed_components`](Self::observed_components).
    fn observe(&mut self, state: &mut State, observations: &[Observation<'_>]) -> Result<()>;
}
