//! State Store
//!
//! The store is the central coordinator. It owns every state cell, computed
//! value and effect, the dependency index and the batch flag.
//!
//! # How It Works
//!
//! 1. `create_*` allocates a cell, assigns the next id and links it into
//!    the registry. Cells are never removed.
//!
//! 2. `set_*` normalizes the value, compares it with the current one and,
//!    on change, updates the cell, re-arms dependent computed values and
//!    notifies the cell's observers.
//!
//! 3. `collect_diffs`, `clear_dirty` and the batch operations (see the
//!    `diff` and `batch` modules) read and reset the dirty flags.
//!
//! # Locking
//!
//! All engine state sits behind one `parking_lot::Mutex`. The lock is never
//! held while user code runs: observer, compute and effect callbacks are
//! cloned out and invoked after it is released, so callbacks may read and
//! write the store re-entrantly.
//!
//! # Lookup misses
//!
//! The unchecked accessors keep the forgiving behavior UI code relies on:
//! getters return the type default and setters do nothing when a handle
//! does not resolve or names a cell of another type. Every one of them has
//! a `try_*` twin that reports the [`StateError`] instead.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace, warn};

use super::batch::DeferredChange;
use super::cell::{Notification, ObserverEntry, ObserverFn, StateCell};
use super::computed::ComputedEntry;
use super::effect::EffectEntry;
use super::ids::{ComputedId, EffectId, ObserverId, StateHandle, StateId};
use super::value::{StateType, StateValue, Value};
use crate::config::{ComputedMode, ObserverMode, StoreConfig, StringPolicy};
use crate::error::{Result, StateError};
use crate::graph::DependencyIndex;

/// Everything guarded by the store's lock.
#[derive(Default)]
pub(crate) struct StoreInner {
    /// Creation order is the scan order for diffs and clears.
    pub(crate) cells: IndexMap<StateId, StateCell>,
    pub(crate) computed: IndexMap<ComputedId, ComputedEntry>,
    pub(crate) effects: IndexMap<EffectId, EffectEntry>,
    pub(crate) deps: DependencyIndex,
    pub(crate) batching: bool,
    /// Per cell written inside the open batch: its value and subscribers
    /// before the first write. Only filled in `ObserverMode::Deferred`.
    pub(crate) batch_origins: IndexMap<StateId, DeferredChange>,
}

/// A registry of reactive state cells with change tracking.
///
/// # Example
///
/// ```rust
/// use reox_state::reactive::Store;
///
/// let store = Store::new();
/// let counter = store.create_int(0).unwrap();
///
/// store.set_int(counter, 5);
/// assert_eq!(store.get_int(counter), 5);
///
/// let diffs = store.collect_diffs().unwrap();
/// assert_eq!(diffs.len(), 1);
/// ```
pub struct Store {
    config: StoreConfig,
    inner: Mutex<StoreInner>,
}

impl Store {
    /// Create a store with the default configuration.
    pub fn new() -> Self {
        Self {
            config: StoreConfig::default(),
            inner: Mutex::new(StoreInner::default()),
        }
    }

    /// Create a store with a validated configuration.
    pub fn with_config(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            inner: Mutex::new(StoreInner::default()),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Skip validation, for exercising failure paths.
    #[cfg(test)]
    pub(crate) fn with_unchecked_config(config: StoreConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(StoreInner::default()),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock()
    }

    // ------------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------------

    /// Allocate a new cell holding `initial`.
    ///
    /// Strings go through the configured [`StringPolicy`] first.
    pub fn create(&self, initial: Value) -> Result<StateHandle> {
        let initial = self.normalize(initial)?;
        let state_type = initial.state_type();

        let mut inner = self.lock();
        inner.cells.try_reserve(1)?;
        let id = StateId::next();
        inner.cells.insert(id, StateCell::new(id, initial));
        drop(inner);

        debug!(state = %id, %state_type, "state created");
        Ok(id)
    }

    /// Create a cell from any [`StateValue`].
    pub fn create_value<T: StateValue>(&self, initial: T) -> Result<StateHandle> {
        self.create(initial.into_value())
    }

    /// Whether `handle` resolves to a cell in this store.
    pub fn contains(&self, handle: StateHandle) -> bool {
        self.lock().cells.contains_key(&handle)
    }

    pub fn state_type(&self, handle: StateHandle) -> Result<StateType> {
        self.with_cell(handle, |cell| cell.state_type())
    }

    /// The current value of a cell, whatever its type.
    pub fn value(&self, handle: StateHandle) -> Result<Value> {
        self.with_cell(handle, |cell| cell.value().clone())
    }

    /// The value the last changing write replaced (or the initial value).
    pub fn previous(&self, handle: StateHandle) -> Result<Value> {
        self.with_cell(handle, |cell| cell.previous().clone())
    }

    pub fn is_dirty(&self, handle: StateHandle) -> Result<bool> {
        self.with_cell(handle, |cell| cell.is_dirty())
    }

    /// Number of live cells.
    pub fn len(&self) -> usize {
        self.lock().cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of cells currently dirty.
    pub fn dirty_count(&self) -> usize {
        self.lock().cells.values().filter(|c| c.is_dirty()).count()
    }

    fn with_cell<R>(&self, handle: StateHandle, f: impl FnOnce(&StateCell) -> R) -> Result<R> {
        let inner = self.lock();
        inner
            .cells
            .get(&handle)
            .map(f)
            .ok_or(StateError::NotFound(handle))
    }

    // ------------------------------------------------------------------------
    // Generic typed access
    // ------------------------------------------------------------------------

    /// Read a cell as `T`, failing on a miss or a type mismatch.
    pub fn try_get<T: StateValue>(&self, handle: StateHandle) -> Result<T> {
        self.with_cell(handle, |cell| {
            T::from_value(cell.value()).ok_or(StateError::TypeMismatch {
                id: handle,
                expected: T::STATE_TYPE,
                found: cell.state_type(),
            })
        })?
    }

    /// Read a cell as `T`, returning the type default on any failure.
    pub fn get<T: StateValue>(&self, handle: StateHandle) -> T {
        self.try_get(handle).unwrap_or_else(|err| {
            report_degraded("get", &err);
            T::fallback()
        })
    }

    /// Write a cell. Returns `Ok(true)` if the value changed.
    pub fn try_set<T: StateValue>(&self, handle: StateHandle, value: T) -> Result<bool> {
        self.write(handle, value.into_value())
    }

    /// Write a cell, silently ignoring misses, mismatches and rejections.
    pub fn set<T: StateValue>(&self, handle: StateHandle, value: T) {
        if let Err(err) = self.try_set(handle, value) {
            report_degraded("set", &err);
        }
    }

    /// Replace a cell's value with `f(current)`.
    pub fn update<T, F>(&self, handle: StateHandle, f: F) -> Result<bool>
    where
        T: StateValue,
        F: FnOnce(&T) -> T,
    {
        let current = self.try_get::<T>(handle)?;
        self.try_set(handle, f(&current))
    }

    /// The write path shared by every setter.
    pub(crate) fn write(&self, handle: StateHandle, value: Value) -> Result<bool> {
        let value = self.normalize(value)?;

        let notification = {
            let mut guard = self.lock();
            let inner = &mut *guard;

            let cell = inner
                .cells
                .get_mut(&handle)
                .ok_or(StateError::NotFound(handle))?;
            if cell.state_type() != value.state_type() {
                return Err(StateError::TypeMismatch {
                    id: handle,
                    expected: value.state_type(),
                    found: cell.state_type(),
                });
            }

            let Some((old, new)) = cell.write(value) else {
                return Ok(false);
            };

            if self.config.computed_mode == ComputedMode::Live {
                for computed_id in inner.deps.computed_for(handle) {
                    if let Some(entry) = inner.computed.get_mut(&computed_id) {
                        entry.invalidate();
                    }
                }
            }

            if inner.batching && self.config.observer_mode == ObserverMode::Deferred {
                inner
                    .batch_origins
                    .entry(handle)
                    .or_insert_with(|| DeferredChange {
                        origin: old,
                        observers: cell.observer_ids(),
                    });
                None
            } else {
                Some(Notification {
                    state_id: handle,
                    old,
                    new,
                    observers: cell.observer_callbacks(),
                })
            }
        };

        if let Some(notification) = notification {
            notification.dispatch();
        }
        Ok(true)
    }

    /// Apply the string policy. Other values pass through untouched.
    fn normalize(&self, value: Value) -> Result<Value> {
        let Value::String(mut s) = value else {
            return Ok(value);
        };

        let max = self.config.max_string_len;
        if s.len() > max {
            match self.config.string_policy {
                StringPolicy::Truncate => {
                    let cut = (0..=max)
                        .rev()
                        .find(|&i| s.is_char_boundary(i))
                        .unwrap_or(0);
                    trace!(len = s.len(), cut, "truncating string state");
                    s.truncate(cut);
                }
                StringPolicy::Reject => {
                    return Err(StateError::StringTooLong { len: s.len(), max });
                }
            }
        }
        Ok(Value::String(s))
    }

    // ------------------------------------------------------------------------
    // Typed accessors
    // ------------------------------------------------------------------------

    pub fn create_int(&self, initial: i64) -> Result<StateHandle> {
        self.create_value(initial)
    }

    pub fn get_int(&self, handle: StateHandle) -> i64 {
        self.get(handle)
    }

    pub fn try_get_int(&self, handle: StateHandle) -> Result<i64> {
        self.try_get(handle)
    }

    pub fn set_int(&self, handle: StateHandle, value: i64) {
        self.set(handle, value)
    }

    pub fn try_set_int(&self, handle: StateHandle, value: i64) -> Result<bool> {
        self.try_set(handle, value)
    }

    pub fn create_float(&self, initial: f64) -> Result<StateHandle> {
        self.create_value(initial)
    }

    pub fn get_float(&self, handle: StateHandle) -> f64 {
        self.get(handle)
    }

    pub fn try_get_float(&self, handle: StateHandle) -> Result<f64> {
        self.try_get(handle)
    }

    pub fn set_float(&self, handle: StateHandle, value: f64) {
        self.set(handle, value)
    }

    pub fn try_set_float(&self, handle: StateHandle, value: f64) -> Result<bool> {
        self.try_set(handle, value)
    }

    pub fn create_bool(&self, initial: bool) -> Result<StateHandle> {
        self.create_value(initial)
    }

    pub fn get_bool(&self, handle: StateHandle) -> bool {
        self.get(handle)
    }

    pub fn try_get_bool(&self, handle: StateHandle) -> Result<bool> {
        self.try_get(handle)
    }

    pub fn set_bool(&self, handle: StateHandle, value: bool) {
        self.set(handle, value)
    }

    pub fn try_set_bool(&self, handle: StateHandle, value: bool) -> Result<bool> {
        self.try_set(handle, value)
    }

    pub fn create_string(&self, initial: impl Into<String>) -> Result<StateHandle> {
        self.create_value(initial.into())
    }

    pub fn get_string(&self, handle: StateHandle) -> String {
        self.get(handle)
    }

    pub fn try_get_string(&self, handle: StateHandle) -> Result<String> {
        self.try_get(handle)
    }

    pub fn set_string(&self, handle: StateHandle, value: impl Into<String>) {
        self.set(handle, value.into())
    }

    pub fn try_set_string(&self, handle: StateHandle, value: impl Into<String>) -> Result<bool> {
        self.try_set(handle, value.into())
    }

    pub fn create_object(&self, initial: serde_json::Value) -> Result<StateHandle> {
        self.create_value(initial)
    }

    pub fn get_object(&self, handle: StateHandle) -> serde_json::Value {
        self.get(handle)
    }

    pub fn try_get_object(&self, handle: StateHandle) -> Result<serde_json::Value> {
        self.try_get(handle)
    }

    pub fn set_object(&self, handle: StateHandle, value: serde_json::Value) {
        self.set(handle, value)
    }

    pub fn try_set_object(&self, handle: StateHandle, value: serde_json::Value) -> Result<bool> {
        self.try_set(handle, value)
    }

    // ------------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------------

    /// Subscribe to changes of one cell.
    ///
    /// The callback runs synchronously for every changing write made after
    /// this call, in subscription order. Writes that happened earlier are
    /// never replayed.
    pub fn observe<F>(&self, handle: StateHandle, callback: F) -> Result<ObserverId>
    where
        F: Fn(StateId, &Value, &Value) + Send + Sync + 'static,
    {
        let callback: ObserverFn = Arc::new(callback);
        let mut inner = self.lock();
        let cell = inner
            .cells
            .get_mut(&handle)
            .ok_or(StateError::NotFound(handle))?;

        let id = ObserverId::next();
        cell.add_observer(ObserverEntry { id, callback })?;
        trace!(state = %handle, observer = %id, "observer attached");
        Ok(id)
    }

    /// Subscribe with values already projected to `T`.
    ///
    /// Fails with `TypeMismatch` if the cell does not hold a `T`.
    pub fn observe_as<T, F>(&self, handle: StateHandle, callback: F) -> Result<ObserverId>
    where
        T: StateValue,
        F: Fn(StateId, T, T) + Send + Sync + 'static,
    {
        let found = self.state_type(handle)?;
        if found != T::STATE_TYPE {
            return Err(StateError::TypeMismatch {
                id: handle,
                expected: T::STATE_TYPE,
                found,
            });
        }

        self.observe(handle, move |id, old, new| {
            if let (Some(old), Some(new)) = (T::from_value(old), T::from_value(new)) {
                callback(id, old, new);
            }
        })
    }

    /// Remove an observer. Returns `false` if nothing matched.
    pub fn unobserve(&self, handle: StateHandle, observer_id: ObserverId) -> bool {
        let mut inner = self.lock();
        let removed = inner
            .cells
            .get_mut(&handle)
            .is_some_and(|cell| cell.remove_observer(observer_id));
        if removed {
            trace!(state = %handle, observer = %observer_id, "observer detached");
        }
        removed
    }

    /// Number of observers on a cell (0 for a miss).
    pub fn observer_count(&self, handle: StateHandle) -> usize {
        self.with_cell(handle, |cell| cell.observer_count())
            .unwrap_or(0)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Store")
            .field("states", &inner.cells.len())
            .field("computed", &inner.computed.len())
            .field("effects", &inner.effects.len())
            .field("batching", &inner.batching)
            .finish()
    }
}

/// Log an error the unchecked accessors swallow.
fn report_degraded(op: &str, err: &StateError) {
    match err {
        StateError::NotFound(_) => trace!(op, %err, "lookup miss, using default"),
        _ => warn!(op, %err, "state access degraded to default"),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
