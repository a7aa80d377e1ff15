//! Computed Values
//!
//! A computed value is a cached `f64` derived from a fixed list of state
//! cells. It is evaluated once at creation and afterwards only when it has
//! been re-armed.
//!
//! # How Computed Values Work
//!
//! 1. `computed_create` registers the value and its dependency edges, then
//!    runs the compute function and caches the result with
//!    `needs_recompute = false`.
//!
//! 2. In [`ComputedMode::Live`] every changing write to a declared
//!    dependency sets `needs_recompute`, found through the store's
//!    reverse-dependency index.
//!
//! 3. `computed_get` returns the cache, re-evaluating first only if
//!    `needs_recompute` is set.
//!
//! In [`ComputedMode::Snapshot`] step 2 never happens: the value stays the
//! one computed at creation until [`Store::computed_invalidate`] is called.
//!
//! The compute function receives the store and runs without the store's
//! lock, so it reads its inputs through the ordinary getters. Every re-arm
//! bumps an epoch; a result is only marked fresh if the epoch did not move
//! while it was being computed. Otherwise it is returned to the caller but
//! the value stays armed.

use std::sync::Arc;

use tracing::{debug, trace};

use super::ids::{ComputedId, StateHandle};
use super::store::Store;
use crate::config::ComputedMode;
use crate::error::{Result, StateError};
use crate::graph::Dependent;

/// Compute function of a computed value.
pub type ComputeFn = Arc<dyn Fn(&Store) -> f64 + Send + Sync>;

pub(crate) struct ComputedEntry {
    id: ComputedId,
    compute: ComputeFn,
    cached_value: f64,
    needs_recompute: bool,
    /// Bumped by every re-arm.
    epoch: u64,
    evaluations: usize,
}

impl ComputedEntry {
    pub(crate) fn invalidate(&mut self) {
        if !self.needs_recompute {
            trace!(computed = %self.id, "computed value re-armed");
        }
        self.needs_recompute = true;
        self.epoch = self.epoch.wrapping_add(1);
    }
}

impl Store {
    /// Register a computed value over `deps` and evaluate it once.
    pub fn computed_create<F>(&self, deps: &[StateHandle], compute: F) -> Result<ComputedId>
    where
        F: Fn(&Store) -> f64 + Send + Sync + 'static,
    {
        let id = {
            let mut inner = self.lock();
            inner.computed.try_reserve(1)?;
            let id = ComputedId::next();
            inner.computed.insert(
                id,
                ComputedEntry {
                    id,
                    compute: Arc::new(compute),
                    cached_value: 0.0,
                    needs_recompute: true,
                    epoch: 0,
                    evaluations: 0,
                },
            );
            inner.deps.add(Dependent::Computed(id), deps);
            trace!(edges = inner.deps.edge_count(), "dependency index grew");
            id
        };

        let value = self.try_computed_get(id)?;
        debug!(computed = %id, deps = deps.len(), value, "computed value created");
        Ok(id)
    }

    /// The cached value, re-evaluated first if it has been re-armed.
    pub fn try_computed_get(&self, id: ComputedId) -> Result<f64> {
        let (compute, epoch) = {
            let inner = self.lock();
            let entry = inner
                .computed
                .get(&id)
                .ok_or(StateError::ComputedNotFound(id))?;
            if !entry.needs_recompute {
                return Ok(entry.cached_value);
            }
            (Arc::clone(&entry.compute), entry.epoch)
        };

        let value = compute(self);

        let mut inner = self.lock();
        if let Some(entry) = inner.computed.get_mut(&id) {
            entry.cached_value = value;
            entry.evaluations += 1;
            if entry.epoch == epoch {
                entry.needs_recompute = false;
            } else {
                trace!(computed = %id, "dependency changed during evaluation");
            }
        }
        trace!(computed = %id, value, "computed value evaluated");
        Ok(value)
    }

    /// Like [`try_computed_get`](Self::try_computed_get), returning `0.0` on a miss.
    pub fn computed_get(&self, id: ComputedId) -> f64 {
        self.try_computed_get(id).unwrap_or(0.0)
    }

    /// Force the next read to re-evaluate, whatever the [`ComputedMode`].
    pub fn computed_invalidate(&self, id: ComputedId) -> Result<()> {
        let mut inner = self.lock();
        let entry = inner
            .computed
            .get_mut(&id)
            .ok_or(StateError::ComputedNotFound(id))?;
        entry.invalidate();
        Ok(())
    }

    pub fn computed_needs_recompute(&self, id: ComputedId) -> Result<bool> {
        self.with_computed(id, |entry| entry.needs_recompute)
    }

    /// How many times the compute function has run, creation included.
    pub fn computed_evaluations(&self, id: ComputedId) -> Result<usize> {
        self.with_computed(id, |entry| entry.evaluations)
    }

    /// The handles the computed value was declared over, without duplicates.
    pub fn computed_dependencies(&self, id: ComputedId) -> Result<Vec<StateHandle>> {
        let inner = self.lock();
        if !inner.computed.contains_key(&id) {
            return Err(StateError::ComputedNotFound(id));
        }
        Ok(inner.deps.dependencies_of(Dependent::Computed(id)).to_vec())
    }

    pub fn computed_mode(&self) -> ComputedMode {
        self.config().computed_mode
    }

    fn with_computed<R>(&self, id: ComputedId, f: impl FnOnce(&ComputedEntry) -> R) -> Result<R> {
        let inner = self.lock();
        inner
            .computed
            .get(&id)
            .map(f)
            .ok_or(StateError::ComputedNotFound(id))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
