//! The state container: a factory and cache of components keyed by kind and
//! identity.

use super::component::{AnyComponent, ComponentData, StateComponent, UpdateScope};
use super::observation::Observation;
use crate::error::{Result, StateError};
use crate::types::{Bookmark, ComponentKey, Guid, IdentityKey, InstanceId, UpdateType, Version};
use std::collections::HashMap;

/// Default cap on retained changesets per component.
pub const DEFAULT_MAX_RETAINED_CHANGESETS: usize = 256;

/// Owns every state component.
///
/// Components are created lazily on first access and dropped wholesale when
/// their owning context resets. A replaced component starts again at version 0
/// with a new [`InstanceId`].
pub struct State {
    components: HashMap<ComponentKey, Box<dyn AnyComponent>>,
    next_instance: u64,
    max_retained_changesets: usize,
}

impl State {
    pub fn new() -> Self {
        Self::with_max_retained_changesets(DEFAULT_MAX_RETAINED_CHANGESETS)
    }

    pub fn with_max_retained_changesets(max: usize) -> Self {
        Self {
            components: HashMap::new(),
            next_instance: 1,
            max_retained_changesets: max,
        }
    }

    /// Get the component of type `D` for `identity`, creating it if needed.
    pub fn get_or_create<D: ComponentData>(
        &mut self,
        identity: IdentityKey,
    ) -> Result<&mut StateComponent<D>> {
        let key = ComponentKey::new(D::KIND, identity);
        if !self.components.contains_key(&key) {
            let instance = InstanceId(self.next_instance);
            self.next_instance += 1;
            tracing::debug!(key = %key, instance = instance.0, "creating state component");
            self.components
                .insert(key, Box::new(StateComponent::<D>::new(identity, instance)));
        }

        self.components
            .get_mut(&key)
            .and_then(|c| c.as_any_mut().downcast_mut::<StateComponent<D>>())
            .ok_or(StateError::ComponentTypeMismatch {
                key,
                expected: std::any::type_name::<D>(),
            })
    }

    /// Existing component of type `D` for `identity`.
    pub fn component<D: ComponentData>(&self, identity: IdentityKey) -> Option<&StateComponent<D>> {
        self.components
            .get(&ComponentKey::new(D::KIND, identity))
            .and_then(|c| c.as_any().downcast_ref::<StateComponent<D>>())
    }

    pub fn component_mut<D: ComponentData>(
        &mut self,
        identity: IdentityKey,
    ) -> Option<&mut StateComponent<D>> {
        self.components
            .get_mut(&ComponentKey::new(D::KIND, identity))
            .and_then(|c| c.as_any_mut().downcast_mut::<StateComponent<D>>())
    }

    /// Run `f` inside one update scope of the component, creating it if needed.
    pub fn update<D, F, R>(&mut self, identity: IdentityKey, f: F) -> Result<R>
    where
        D: ComponentData,
        F: FnOnce(&mut UpdateScope<'_, D>) -> R,
    {
        let component = self.get_or_create::<D>(identity)?;
        let mut scope = component.update_scope();
        Ok(f(&mut scope))
    }

    /// Type-erased access by key.
    pub fn get(&self, key: &ComponentKey) -> Option<&dyn AnyComponent> {
        self.components.get(key).map(|c| c.as_ref())
    }

    pub(crate) fn get_erased_mut(
        &mut self,
        key: &ComponentKey,
    ) -> Option<&mut (dyn AnyComponent + 'static)> {
        self.components.get_mut(key).map(|c| c.as_mut())
    }

    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.components.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Keys of every live component, sorted.
    pub fn keys(&self) -> Vec<ComponentKey> {
        let mut keys: Vec<ComponentKey> = self.components.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Current version of a component, if it exists.
    pub fn version_of(&self, key: &ComponentKey) -> Option<Version> {
        self.components.get(key).map(|c| c.current_version())
    }

    /// Drop one component. The next access creates a fresh instance.
    pub fn remove(&mut self, key: &ComponentKey) -> bool {
        let removed = self.components.remove(key).is_some();
        if removed {
            tracing::debug!(key = %key, "state component removed");
        }
        removed
    }

    /// Drop every component bound to `asset`, e.g. when a different graph is
    /// loaded. Returns how many were dropped.
    pub fn reset_asset(&mut self, asset: &Guid) -> usize {
        self.reset_where(|identity| identity.mentions_asset(asset))
    }

    /// Drop every component bound to `view`, e.g. when a window closes.
    pub fn reset_view(&mut self, view: &Guid) -> usize {
        self.reset_where(|identity| identity.mentions_view(view))
    }

    fn reset_where(&mut self, matches: impl Fn(&IdentityKey) -> bool) -> usize {
        let before = self.components.len();
        self.components.retain(|key, _| !matches(&key.identity));
        let dropped = before - self.components.len();
        if dropped > 0 {
            tracing::debug!(dropped, "state components reset");
        }
        dropped
    }

    /// Severity of the changes to `key` since `bookmark`, without advancing it.
    pub fn update_type_since(&self, key: &ComponentKey, bookmark: &Bookmark) -> UpdateType {
        match self.components.get(key) {
            None => UpdateType::None,
            Some(c) if bookmark.instance != Some(c.instance()) => UpdateType::Complete,
            Some(c) => c.update_type_since(bookmark.version),
        }
    }

    /// Open an observation of `key` from `bookmark`.
    ///
    /// The bookmark is advanced to the component's current version when the
    /// observation is dropped, whether or not the caller acted on it.
    pub fn observe<'b>(&self, key: ComponentKey, bookmark: &'b mut Bookmark) -> Observation<'b> {
        let since = *bookmark;
        let (update_type, target) = match self.components.get(&key) {
            None => (UpdateType::None, since),
            Some(c) => (
                self.update_type_since(&key, &since),
                Bookmark::at(c.instance(), c.current_version()),
            ),
        };
        Observation::new(key, bookmark, since, target, update_type)
    }

    /// Purge changesets of `key` below `until`. Returns the new floor.
    pub fn purge_changesets(&mut self, key: &ComponentKey, until: Version) -> Result<Version> {
        self.components
            .get_mut(key)
            .map(|c| c.purge_changesets(until))
            .ok_or(StateError::ComponentNotFound(*key))
    }

    /// Apply the retained-changeset cap to every component.
    pub fn enforce_history_limit(&mut self) {
        let max = self.max_retained_changesets;
        for component in self.components.values_mut() {
            component.limit_changesets(max);
        }
    }

    pub fn max_retained_changesets(&self) -> usize {
        self.max_retained_changesets
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changesets::NoChangeset;
    use serde::{Deserialize, Serialize};

    #[derive(Default, Serialize, Deserialize)]
    struct Counter {
        value: u32,
    }

    impl ComponentData for Counter {
        const KIND: &'static str = "counter";
        type Changeset = NoChangeset;
    }

    #[derive(Default, Serialize, Deserialize)]
    struct Impostor;

    impl ComponentData for Impostor {
        const KIND: &'static str = "counter";
        type Changeset = NoChangeset;
    }

    fn asset(n: u128) -> IdentityKey {
        IdentityKey::Asset(Guid::from_u128(n))
    }

    fn bump(state: &mut State, identity: IdentityKey) {
        state
            .update::<Counter, _, _>(identity, |scope| {
                scope.data_mut().value += 1;
                scope.set_update_type(UpdateType::Partial);
            })
            .unwrap();
    }

    #[test]
    fn test_get_or_create_is_cached() {
        let mut state = State::new();
        bump(&mut state, asset(1));
        bump(&mut state, asset(1));

        let counter = state.component::<Counter>(asset(1)).unwrap();
        assert_eq!(counter.data().value, 2);
        assert_eq!(counter.current_version(), Version(2));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_identities_are_independent() {
        let mut state = State::new();
        bump(&mut state, asset(1));
        bump(&mut state, asset(2));
        bump(&mut state, asset(2));

        assert_eq!(state.component::<Counter>(asset(1)).unwrap().current_version(), Version(1));
        assert_eq!(state.component::<Counter>(asset(2)).unwrap().current_version(), Version(2));
    }

    #[test]
    fn test_kind_collision_is_type_mismatch() {
        let mut state = State::new();
        bump(&mut state, asset(1));

        let result = state.get_or_create::<Impostor>(asset(1));
        assert!(matches!(result, Err(StateError::ComponentTypeMismatch { .. })));
    }

    #[test]
    fn test_reset_asset_restarts_version() {
        let mut state = State::new();
        let view = Guid::from_u128(50);
        let asset_view = IdentityKey::AssetView {
            asset: Guid::from_u128(1),
            view,
        };
        bump(&mut state, asset_view);
        bump(&mut state, asset_view);
        bump(&mut state, IdentityKey::View(view));
        let old_instance = state.component::<Counter>(asset_view).unwrap().instance();

        assert_eq!(state.reset_asset(&Guid::from_u128(1)), 1);
        assert!(state.component::<Counter>(asset_view).is_none());

        let fresh = state.get_or_create::<Counter>(asset_view).unwrap();
        assert_eq!(fresh.current_version(), Version(0));
        assert_ne!(fresh.instance(), old_instance);
        assert!(state.component::<Counter>(IdentityKey::View(view)).is_some());
    }

    #[test]
    fn test_observe_advances_bookmark_once() {
        let mut state = State::new();
        bump(&mut state, asset(1));
        let key = ComponentKey::new(Counter::KIND, asset(1));
        let mut bookmark = Bookmark::default();

        {
            let observation = state.observe(key, &mut bookmark);
            assert_eq!(observation.update_type(), UpdateType::Complete);
        }
        assert_eq!(bookmark.version, Version(1));

        let observation = state.observe(key, &mut bookmark);
        assert_eq!(observation.update_type(), UpdateType::None);
        drop(observation);

        bump(&mut state, asset(1));
        let observation = state.observe(key, &mut bookmark);
        assert_eq!(observation.update_type(), UpdateType::Partial);
    }

    #[test]
    fn test_observe_missing_component_is_none() {
        let state = State::new();
        let mut bookmark = Bookmark::default();
        let observation = state.observe(ComponentKey::new("counter", asset(9)), &mut bookmark);
        assert_eq!(observation.update_type(), UpdateType::None);
        drop(observation);
        assert_eq!(bookmark, Bookmark::default());
    }

    #[test]
    fn test_enforce_history_limit() {
        let mut state = State::with_max_retained_changesets(2);
        for _ in 0..5 {
            bump(&mut state, asset(1));
        }
        state.enforce_history_limit();
        let counter = state.component::<Counter>(asset(1)).unwrap();
        assert_eq!(counter.changeset_count(), 2);
        assert_eq!(counter.earliest_changeset_version(), Version(3));
    }
}
