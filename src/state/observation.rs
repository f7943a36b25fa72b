//! Read-only observations of a component between two versions.

use super::component::ComponentData;
use super::store::State;
use crate::types::{Bookmark, ComponentKey, UpdateType, Version};

/// What changed in one component since an observer last looked.
///
/// Holds the observer's bookmark and moves it to the observed version on drop,
/// exactly once, whether or not the observer used the observation.
pub struct Observation<'b> {
    key: ComponentKey,
    bookmark: &'b mut Bookmark,
    since: Bookmark,
    target: Bookmark,
    update_type: UpdateType,
}

impl<'b> Observation<'b> {
    pub(crate) fn new(
        key: ComponentKey,
        bookmark: &'b mut Bookmark,
        since: Bookmark,
        target: Bookmark,
        update_type: UpdateType,
    ) -> Self {
        Self {
            key,
            bookmark,
            since,
            target,
            update_type,
        }
    }

    pub fn key(&self) -> ComponentKey {
        self.key
    }

    pub fn update_type(&self) -> UpdateType {
        self.update_type
    }

    /// Version the observer had seen before this observation.
    pub fn since_version(&self) -> Version {
        self.since.version
    }

    /// Version the bookmark moves to.
    pub fn observed_version(&self) -> Version {
        self.target.version
    }

    /// Aggregated changeset for a partial update.
    ///
    /// `None` unless the severity is [`UpdateType::Partial`] and the history
    /// for the observed range is still retained; the caller then rebuilds.
    pub fn changeset<D: ComponentData>(&self, state: &State) -> Option<D::Changeset> {
        if self.update_type != UpdateType::Partial || self.key.kind != D::KIND {
            return None;
        }
        let component = state.component::<D>(self.key.identity)?;
        if Some(component.instance()) != self.since.instance {
            return None;
        }
        component.aggregated_changeset_until(self.since.version, self.target.version)
    }
}

impl Drop for Observation<'_> {
    fn drop(&mut self) {
        *self.bookmark = self.target;
    }
}
