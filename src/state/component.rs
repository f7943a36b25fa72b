//! Versioned state components and their scoped updaters.

use crate::changesets::{Changeset, ChangesetManager};
use crate::error::{Result, StateError};
use crate::types::{ComponentKey, IdentityKey, InstanceId, UpdateType, Version};
use crate::undo::ReferenceResolver;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::ops::Deref;

/// The data held by a state component.
///
/// Implementors are plain structs; they become mutable only through an
/// [`UpdateScope`] on the owning [`StateComponent`]. Typed mutation
/// operations are written as inherent methods on `UpdateScope<'_, Self>`.
pub trait ComponentData: Default + Serialize + DeserializeOwned + 'static {
    /// Kind name, used in component keys and undo records.
    const KIND: &'static str;

    /// Delta type recorded by each update scope.
    type Changeset: Changeset;

    /// Drop references that no longer resolve after an undo/redo restore.
    ///
    /// Returns how many references were dropped.
    fn validate_after_deserialize(&mut self, _resolver: &dyn ReferenceResolver) -> usize {
        0
    }
}

/// An independently versioned slice of state.
pub struct StateComponent<D: ComponentData> {
    key: ComponentKey,
    instance: InstanceId,
    version: Version,
    /// Severity of the open scope.
    pending: UpdateType,
    changesets: ChangesetManager<D::Changeset>,
    data: D,
}

impl<D: ComponentData> StateComponent<D> {
    pub(crate) fn new(identity: IdentityKey, instance: InstanceId) -> Self {
        Self {
            key: ComponentKey::new(D::KIND, identity),
            instance,
            version: Version(0),
            pending: UpdateType::None,
            changesets: ChangesetManager::new(),
            data: D::default(),
        }
    }

    pub fn key(&self) -> ComponentKey {
        self.key
    }

    pub fn identity(&self) -> IdentityKey {
        self.key.identity
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn current_version(&self) -> Version {
        self.version
    }

    /// Read-only view of the data.
    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn earliest_changeset_version(&self) -> Version {
        self.changesets.earliest_changeset_version()
    }

    /// Number of retained changesets.
    pub fn changeset_count(&self) -> usize {
        self.changesets.len()
    }

    /// Combined severity of everything committed after `since`.
    pub fn update_type_since(&self, since: Version) -> UpdateType {
        self.changesets.update_type_since(since, self.version)
    }

    /// Union of the changesets committed after `since`, or `None` when that
    /// history has been purged and the caller must rebuild completely.
    pub fn aggregated_changeset(&self, since: Version) -> Option<D::Changeset> {
        self.changesets.aggregated_changeset(since, self.version)
    }

    pub(crate) fn aggregated_changeset_until(
        &self,
        since: Version,
        until: Version,
    ) -> Option<D::Changeset> {
        self.changesets.aggregated_changeset(since, until)
    }

    /// Purge changesets below `until`. Returns the new floor.
    pub fn purge_changesets(&mut self, until: Version) -> Version {
        self.changesets.purge_old_changesets(until, self.version)
    }

    /// Parse an undo entry for the component `key` without touching any
    /// component.
    pub fn parse_undo_entry(key: &ComponentKey, serialized: &str) -> Result<D> {
        serde_json::from_str(serialized)
            .map_err(|e| StateError::Deserialization(format!("{}: {}", key, e)))
    }

    /// Open the only mutation path into this component.
    ///
    /// The version is incremented exactly once when the returned scope is
    /// dropped, on every exit path.
    pub fn update_scope(&mut self) -> UpdateScope<'_, D> {
        self.pending = UpdateType::None;
        UpdateScope { component: self }
    }

    fn commit(&mut self, aborted: bool) {
        let update_type = if aborted {
            UpdateType::Complete
        } else {
            self.pending
        };
        self.pending = UpdateType::None;
        self.version = self.version.next();

        if update_type == UpdateType::Complete {
            self.changesets.purge_all(self.version);
        } else {
            self.changesets.push_changeset(self.version, update_type);
        }

        tracing::trace!(
            key = %self.key,
            version = %self.version,
            update_type = %update_type,
            "component updated"
        );
    }
}

/// Scoped mutation capability for a [`StateComponent`].
///
/// Dropping the scope commits it: the version advances by one and the
/// requested severity is recorded. A scope dropped while unwinding from a
/// panic commits as [`UpdateType::Complete`].
pub struct UpdateScope<'a, D: ComponentData> {
    component: &'a mut StateComponent<D>,
}

impl<'a, D: ComponentData> UpdateScope<'a, D> {
    /// Escalate the pending severity. Never downgrades.
    pub fn set_update_type(&mut self, update_type: UpdateType) {
        self.component.pending = self.component.pending.combine(update_type);
    }

    /// Set the pending severity unconditionally.
    ///
    /// Used when the data is replaced wholesale.
    pub fn force_update_type(&mut self, update_type: UpdateType) {
        self.component.pending = update_type;
    }

    /// Severity the scope will commit with if dropped now.
    pub fn update_type(&self) -> UpdateType {
        self.component.pending
    }

    pub fn data_mut(&mut self) -> &mut D {
        &mut self.component.data
    }

    /// Changeset being recorded by this scope.
    pub fn changeset_mut(&mut self) -> &mut D::Changeset {
        self.component.changesets.current_changeset_mut()
    }

    pub fn changeset(&self) -> &D::Changeset {
        self.component.changesets.current_changeset()
    }

    /// Split borrow of data and changeset.
    pub fn parts_mut(&mut self) -> (&mut D, &mut D::Changeset) {
        let component = &mut *self.component;
        (
            &mut component.data,
            component.changesets.current_changeset_mut(),
        )
    }

    /// Replace the data wholesale and force a complete update.
    pub fn replace(&mut self, data: D) {
        self.component.data = data;
        self.force_update_type(UpdateType::Complete);
    }
}

impl<'a, D: ComponentData> Deref for UpdateScope<'a, D> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.component.data
    }
}

impl<'a, D: ComponentData> Drop for UpdateScope<'a, D> {
    fn drop(&mut self) {
        self.component.commit(std::thread::panicking());
    }
}

/// Type-erased view of a component, as stored in the
/// [`State`](crate::state::State).
pub trait AnyComponent: Any {
    fn key(&self) -> ComponentKey;
    fn instance(&self) -> InstanceId;
    fn current_version(&self) -> Version;
    fn earliest_changeset_version(&self) -> Version;
    fn update_type_since(&self, since: Version) -> UpdateType;
    fn purge_changesets(&mut self, until: Version) -> Version;
    fn limit_changesets(&mut self, max: usize);

    /// Serialize the data for an undo record.
    fn serialize_for_undo(&self) -> Result<String>;

    /// Repair references after a restore. Returns the number dropped.
    fn validate_after_deserialize(&mut self, resolver: &dyn ReferenceResolver) -> usize;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<D: ComponentData> AnyComponent for StateComponent<D> {
    fn key(&self) -> ComponentKey {
        self.key
    }

    fn instance(&self) -> InstanceId {
        self.instance
    }

    fn current_version(&self) -> Version {
        self.version
    }

    fn earliest_changeset_version(&self) -> Version {
        self.changesets.earliest_changeset_version()
    }

    fn update_type_since(&self, since: Version) -> UpdateType {
        StateComponent::update_type_since(self, since)
    }

    fn purge_changesets(&mut self, until: Version) -> Version {
        StateComponent::purge_changesets(self, until)
    }

    fn limit_changesets(&mut self, max: usize) {
        self.changesets.limit_history(max, self.version);
    }

    fn serialize_for_undo(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.data)?)
    }

    fn validate_after_deserialize(&mut self, resolver: &dyn ReferenceResolver) -> usize {
        let mut scope = self.update_scope();
        let dropped = scope.data_mut().validate_after_deserialize(resolver);
        if dropped > 0 {
            scope.set_update_type(UpdateType::Complete);
        }
        dropped
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
