//! Effect Implementation
//!
//! An effect is a side-effecting callback bound to a fixed list of state
//! cells.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs once immediately ("run on mount").
//!
//! 2. [`Store::run_effects`] re-runs every effect that has at least one
//!    dirty dependency, in creation order. Each effect runs at most once per
//!    call, however many of its dependencies are dirty.
//!
//! 3. Writes never run effects by themselves. The host calls
//!    `run_effects` directly or commits a batch, which calls it.
//!
//! # Differences from Observers
//!
//! - Observers are bound to one cell and fire inline with each write.
//! - Effects are bound to many cells and fire when the host asks, once per
//!   round, based on the dirty flags.
//!
//! Effects cannot be removed; they live as long as their store.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, trace};

use super::ids::{EffectId, StateHandle};
use super::store::Store;
use crate::error::{Result, StateError};
use crate::graph::Dependent;

/// Effect callback.
pub type EffectFn = Arc<dyn Fn(&Store) + Send + Sync>;

pub(crate) struct EffectEntry {
    run: EffectFn,
    run_count: usize,
}

impl Store {
    /// Register an effect over `deps` and run it once.
    pub fn effect_create<F>(&self, deps: &[StateHandle], effect: F) -> Result<EffectId>
    where
        F: Fn(&Store) + Send + Sync + 'static,
    {
        let run: EffectFn = Arc::new(effect);

        let id = {
            let mut inner = self.lock();
            inner.effects.try_reserve(1)?;
            let id = EffectId::next();
            inner.effects.insert(
                id,
                EffectEntry {
                    run: Arc::clone(&run),
                    run_count: 0,
                },
            );
            inner.deps.add(Dependent::Effect(id), deps);
            trace!(edges = inner.deps.edge_count(), "dependency index grew");
            id
        };

        debug!(effect = %id, deps = deps.len(), "effect created");
        self.execute_effect(id, &run);
        Ok(id)
    }

    /// Run every effect with a dirty dependency. Returns how many ran.
    pub fn run_effects(&self) -> usize {
        let due: Vec<(EffectId, EffectFn)> = {
            let guard = self.lock();
            let inner = &*guard;
            let triggered: HashSet<EffectId> = inner
                .cells
                .values()
                .filter(|cell| cell.is_dirty())
                .flat_map(|cell| inner.deps.effects_for(cell.id()))
                .collect();

            inner
                .effects
                .iter()
                .filter(|(id, _)| triggered.contains(id))
                .map(|(id, entry)| (*id, Arc::clone(&entry.run)))
                .collect()
        };

        for (id, run) in &due {
            self.execute_effect(*id, run);
        }
        if !due.is_empty() {
            debug!(ran = due.len(), "effects run");
        }
        due.len()
    }

    /// Number of times an effect has run, creation included.
    pub fn effect_run_count(&self, id: EffectId) -> Result<usize> {
        self.lock()
            .effects
            .get(&id)
            .map(|entry| entry.run_count)
            .ok_or(StateError::EffectNotFound(id))
    }

    /// The handles the effect was declared over, without duplicates.
    pub fn effect_dependencies(&self, id: EffectId) -> Result<Vec<StateHandle>> {
        let inner = self.lock();
        if !inner.effects.contains_key(&id) {
            return Err(StateError::EffectNotFound(id));
        }
        Ok(inner.deps.dependencies_of(Dependent::Effect(id)).to_vec())
    }

    fn execute_effect(&self, id: EffectId, run: &EffectFn) {
        trace!(effect = %id, "running effect");
        run(self);
        if let Some(entry) = self.lock().effects.get_mut(&id) {
            entry.run_count += 1;
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    fn counting_effect(store: &Store, deps: &[StateHandle]) -> (EffectId, Arc<AtomicI32>) {
        let runs = Arc::new(AtomicI32::new(0));
        let runs_clone = runs.clone();
        let id = store
            .effect_create(deps, move |_| {
                runs_clone.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        (id, runs)
    }

    #[test]
    fn effect_runs_on_creation() {
        let store = Store::new();
        let a = store.create_int(0).unwrap();
        let (id, runs) = counting_effect(&store, &[a]);

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(store.effect_run_count(id), Ok(1));
    }

    #[test]
    fn runs_only_when_a_dependency_is_dirty() {
        let store = Store::new();
        let a = store.create_int(0).unwrap();
        let b = store.create_int(0).unwrap();
        let (_, runs) = counting_effect(&store, &[a]);

        assert_eq!(store.run_effects(), 0);

        store.set_int(b, 1);
        assert_eq!(store.run_effects(), 0);
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        store.set_int(a, 1);
        assert_eq!(store.run_effects(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn runs_once_per_round_with_many_dirty_deps() {
        let store = Store::new();
        let a = store.create_int(0).unwrap();
        let b = store.create_bool(false).unwrap();
        let (id, _) = counting_effect(&store, &[a, b]);

        store.set_int(a, 1);
        store.set_bool(b, true);
        store.run_effects();

        assert_eq!(store.effect_run_count(id), Ok(2));
    }

    #[test]
    fn stays_triggered_until_dirty_flags_clear() {
        let store = Store::new();
        let a = store.create_int(0).unwrap();
        let (_, runs) = counting_effect(&store, &[a]);

        store.set_int(a, 1);
        store.run_effects();
        store.run_effects();
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        store.clear_dirty();
        store.run_effects();
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn effects_run_in_creation_order() {
        let store = Store::new();
        let a = store.create_int(0).unwrap();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for tag in 0..3 {
            let order = order.clone();
            store
                .effect_create(&[a], move |_| order.lock().push(tag))
                .unwrap();
        }
        order.lock().clear();

        store.set_int(a, 1);
        store.run_effects();
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn effect_reads_store_without_deadlock() {
        let store = Store::new();
        let name = store.create_string("Guest").unwrap();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        store
            .effect_create(&[name], move |s| {
                seen_clone.lock().push(s.get_string(name));
            })
            .unwrap();
        store.set_string(name, "Alice");
        store.run_effects();

        assert_eq!(*seen.lock(), vec!["Guest".to_string(), "Alice".to_string()]);
    }

    #[test]
    fn missing_effect_is_reported() {
        let store = Store::new();
        let missing = EffectId::from_raw(u64::MAX);
        assert_eq!(
            store.effect_run_count(missing),
            Err(StateError::EffectNotFound(missing))
        );
        assert_eq!(
            store.effect_dependencies(missing),
            Err(StateError::EffectNotFound(missing))
        );
    }

    #[test]
    fn dependencies_come_back_deduplicated() {
        let store = Store::new();
        let a = store.create_int(0).unwrap();
        let b = store.create_int(0).unwrap();
        let (id, _) = counting_effect(&store, &[b, a, b]);

        assert_eq!(store.effect_dependencies(id), Ok(vec![b, a]));
    }
}
