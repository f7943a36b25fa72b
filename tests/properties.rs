//! Property tests for versioning, escalation and changeset aggregation.

use graphstate::{ElementId, Guid, IdentityKey, SelectionState, State, UpdateType, Version};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn identity() -> IdentityKey {
    IdentityKey::Asset(Guid::from_u128(42))
}

fn update_type() -> impl Strategy<Value = UpdateType> {
    prop_oneof![
        Just(UpdateType::None),
        Just(UpdateType::Partial),
        Just(UpdateType::Complete),
    ]
}

/// One scope's worth of touched elements.
fn touched() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..32, 0..6)
}

fn ids(raw: &[u8]) -> Vec<ElementId> {
    raw.iter().map(|n| Guid::from_u128(*n as u128)).collect()
}

/// Run one selection scope per entry and return the state.
fn run_scopes(scopes: &[Vec<u8>]) -> State {
    let mut state = State::new();
    for raw in scopes {
        state
            .update::<SelectionState, _, _>(identity(), |scope| {
                scope.select_elements(ids(raw), true)
            })
            .unwrap();
    }
    state
}

proptest! {
    #[test]
    fn prop_update_type_never_downgrades(requests in prop::collection::vec(update_type(), 0..12)) {
        let mut state = State::new();
        let final_type = state
            .update::<SelectionState, _, _>(identity(), |scope| {
                let mut previous = scope.update_type();
                for request in &requests {
                    scope.set_update_type(*request);
                    prop_assert!(scope.update_type() >= previous);
                    previous = scope.update_type();
                }
                Ok(scope.update_type())
            })
            .unwrap()?;

        prop_assert_eq!(final_type, UpdateType::combine_all(requests.iter().copied()));
        let component = state.component::<SelectionState>(identity()).unwrap();
        prop_assert_eq!(component.update_type_since(Version(0)), final_type);
    }

    #[test]
    fn prop_version_counts_scopes(scopes in prop::collection::vec(touched(), 0..20)) {
        let mut state = run_scopes(&scopes);
        let component = state.get_or_create::<SelectionState>(identity()).unwrap();
        prop_assert_eq!(component.current_version(), Version(scopes.len() as u64));
    }

    #[test]
    fn prop_aggregate_is_union_of_deltas(
        scopes in prop::collection::vec(touched(), 1..20),
        since in 0usize..20,
    ) {
        let since = since.min(scopes.len());
        let state = run_scopes(&scopes);
        let component = state.component::<SelectionState>(identity()).unwrap();

        let expected: BTreeSet<ElementId> =
            scopes[since..].iter().flat_map(|raw| ids(raw)).collect();
        let aggregated = component.aggregated_changeset(Version(since as u64)).unwrap();
        prop_assert_eq!(aggregated.changed(), &expected);
    }

    #[test]
    fn prop_purge_floor_bounds_retrievable_history(
        scopes in prop::collection::vec(touched(), 1..20),
        until in 0u64..30,
    ) {
        let mut state = run_scopes(&scopes);
        let component = state.get_or_create::<SelectionState>(identity()).unwrap();
        let current = component.current_version();

        let floor = component.purge_changesets(Version(until));
        prop_assert!(floor <= Version(until));
        prop_assert!(floor <= current);
        prop_assert_eq!(component.earliest_changeset_version(), floor);

        for since in 0..=current.0 {
            let aggregated = component.aggregated_changeset(Version(since));
            prop_assert_eq!(aggregated.is_some(), Version(since) >= floor);
        }
    }
}
