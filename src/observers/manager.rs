//! Observer registration and scheduling.

use super::observer::Observer;
use crate::error::{Result, StateError};
use crate::state::{Observation, State};
use crate::types::{Bookmark, ComponentKey, UpdateType, Version};
use std::collections::{BTreeSet, HashMap};

/// Order in which observers run during a pump.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ObserverOrdering {
    /// Registration order.
    #[default]
    Registration,
    /// Writers of a component run before its readers; ties keep registration
    /// order. Registering an observer that closes a cycle fails.
    Dependencies,
}

/// Outcome of one pump.
#[derive(Clone, Debug, Default)]
pub struct PumpReport {
    /// Observers that did work, in run order.
    pub ran: Vec<String>,
    /// Observers skipped because nothing they observe changed.
    pub skipped: Vec<String>,
    /// Observers whose `observe` failed, with the error message.
    pub errors: Vec<(String, String)>,
}

/// An observer and its private bookmarks.
struct RegisteredObserver {
    observer: Box<dyn Observer>,
    bookmarks: Vec<(ComponentKey, Bookmark)>,
}

impl RegisteredObserver {
    fn writes_into(&self, reader: &RegisteredObserver) -> bool {
        self.observer
            .modified_components()
            .iter()
            .any(|key| reader.observer.observed_components().contains(key))
    }
}

/// Runs observers once per pump and keeps changeset history bounded by their
/// bookmarks.
pub struct ObserverManager {
    observers: Vec<RegisteredObserver>,
    ordering: ObserverOrdering,
    /// Indices into `observers`, in run order.
    order: Vec<usize>,
}

impl ObserverManager {
    pub fn new() -> Self {
        Self::with_ordering(ObserverOrdering::default())
    }

    pub fn with_ordering(ordering: ObserverOrdering) -> Self {
        Self {
            observers: Vec::new(),
            ordering,
            order: Vec::new(),
        }
    }

    pub fn ordering(&self) -> ObserverOrdering {
        self.ordering
    }

    /// Register an observer. Names must be unique.
    pub fn register_observer(&mut self, observer: Box<dyn Observer>) -> Result<()> {
        let name = observer.name().to_string();
        if self.observers.iter().any(|r| r.observer.name() == name) {
            return Err(StateError::DuplicateObserver(name));
        }

        let bookmarks = observer
            .observed_components()
            .iter()
            .map(|key| (*key, Bookmark::default()))
            .collect();
        self.observers.push(RegisteredObserver {
            observer,
            bookmarks,
        });

        match compute_order(&self.observers, self.ordering) {
            Ok(order) => {
                self.order = order;
                tracing::debug!(observer = %name, "observer registered");
                Ok(())
            }
            Err(e) => {
                self.observers.pop();
                Err(e)
            }
        }
    }

    /// Remove an observer by name, returning it.
    pub fn unregister_observer(&mut self, name: &str) -> Option<Box<dyn Observer>> {
        let index = self
            .observers
            .iter()
            .position(|r| r.observer.name() == name)?;
        let removed = self.observers.remove(index);
        self.order = compute_order(&self.observers, self.ordering)
            .unwrap_or_else(|_| (0..self.observers.len()).collect());
        Some(removed.observer)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Observer names in run order.
    pub fn observer_names(&self) -> Vec<&str> {
        self.order
            .iter()
            .map(|&i| self.observers[i].observer.name())
            .collect()
    }

    /// The bookmark `observer` holds for `key`.
    pub fn bookmark(&self, observer: &str, key: &ComponentKey) -> Option<Bookmark> {
        self.observers
            .iter()
            .find(|r| r.observer.name() == observer)?
            .bookmarks
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, bookmark)| *bookmark)
    }

    /// Run every observer once, then purge changesets no bookmark needs.
    ///
    /// Each observed component is observed exactly once per observer per pump;
    /// its bookmark advances even when the observer is skipped or fails.
    pub fn pump(&mut self, state: &mut State) -> PumpReport {
        let mut report = PumpReport::default();

        for &index in &self.order {
            let RegisteredObserver {
                observer,
                bookmarks,
            } = &mut self.observers[index];

            let observations: Vec<Observation<'_>> = bookmarks
                .iter_mut()
                .map(|(key, bookmark)| state.observe(*key, bookmark))
                .collect();
            let combined =
                UpdateType::combine_all(observations.iter().map(|o| o.update_type()));

            if combined == UpdateType::None {
                tracing::trace!(observer = observer.name(), "observer skipped");
                report.skipped.push(observer.name().to_string());
                continue;
            }

            tracing::debug!(observer = observer.name(), update_type = %combined, "running observer");
            match observer.observe(state, &observations) {
                Ok(()) => report.ran.push(observer.name().to_string()),
                Err(e) => {
                    tracing::error!(observer = observer.name(), error = %e, "observer failed");
                    report
                        .errors
                        .push((observer.name().to_string(), e.to_string()));
                }
            }
        }

        self.purge_observed(state);
        report
    }

    /// Move each observed component's floor up to the oldest bookmark that
    /// still refers to its current instance.
    fn purge_observed(&self, state: &mut State) {
        let mut floors: HashMap<ComponentKey, Version> = HashMap::new();
        for registered in &self.observers {
            for (key, bookmark) in &registered.bookmarks {
                let Some(component) = state.get(key) else {
                    continue;
                };
                let floor = floors.entry(*key).or_insert(component.current_version());
                if bookmark.instance == Some(component.instance()) {
                    *floor = (*floor).min(bookmark.version);
                }
            }
        }

        for (key, until) in floors {
            if let Ok(floor) = state.purge_changesets(&key, until) {
                tracing::trace!(key = %key, floor = %floor, "changesets purged");
            }
        }
    }
}

impl Default for ObserverManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Run order for `observers`.
fn compute_order(
    observers: &[RegisteredObserver],
    ordering: ObserverOrdering,
) -> Result<Vec<usize>> {
    let count = observers.len();
    if ordering == ObserverOrdering::Registration {
        return Ok((0..count).collect());
    }

    let mut readers: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut pending_writers = vec![0usize; count];
    for (w, writer) in observers.iter().enumerate() {
        for (r, reader) in observers.iter().enumerate() {
            if w != r && writer.writes_into(reader) {
                readers[w].push(r);
                pending_writers[r] += 1;
            }
        }
    }

    let mut ready: BTreeSet<usize> = (0..count).filter(|&i| pending_writers[i] == 0).collect();
    let mut order = Vec::with_capacity(count);
    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &r in &readers[next] {
            pending_writers[r] -= 1;
            if pending_writers[r] == 0 {
                ready.insert(r);
            }
        }
    }

    if order.len() < count {
        let cycle = (0..count)
            .filter(|&i| pending_writers[i] > 0)
            .map(|i| observers[i].observer.name().to_string())
            .collect();
        return Err(StateError::ObserverCycle(cycle));
    }
    Ok(order)
}
