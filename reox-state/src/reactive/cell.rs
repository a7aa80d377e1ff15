//! State Cell Implementation
//!
//! A state cell is the fundamental reactive value. It holds its current
//! value, the value it replaced, a dirty flag and its own observer list.
//!
//! # How Cells Work
//!
//! 1. A write compares the incoming value with the current one. An equal
//!    write has no side effects at all.
//!
//! 2. A changing write moves the current value into `previous`, stores the
//!    new one and raises `dirty`.
//!
//! 3. The store then notifies every observer with `(id, previous, value)`.
//!
//! 4. Clearing sets `previous = value` and drops the dirty flag.
//!
//! Every changing write also bumps the cell's generation. A diff entry
//! remembers the generation it saw, so a commit can tell whether the cell
//! moved again after it was collected.
//!
//! Cells never run callbacks themselves. [`StateCell::write`] hands back a
//! [`Notification`] snapshot that the store dispatches after releasing its
//! lock, so observers may read and write the store freely.

use std::sync::Arc;

use smallvec::SmallVec;
use tracing::trace;

use super::ids::{ObserverId, StateId};
use super::value::{StateType, Value};
use crate::error::{Result, StateError};

/// Observer callback: `(state id, old value, new value)`.
///
/// Anything the callback needs (the old C API's `userdata`) is captured by
/// the closure.
pub type ObserverFn = Arc<dyn Fn(StateId, &Value, &Value) + Send + Sync>;

pub(crate) struct ObserverEntry {
    pub(crate) id: ObserverId,
    pub(crate) callback: ObserverFn,
}

/// A single reactive value owned by the store.
pub(crate) struct StateCell {
    id: StateId,
    state_type: StateType,
    value: Value,
    previous: Value,
    dirty: bool,
    /// Number of changing writes since creation.
    generation: u64,
    /// Invoked in subscription order (oldest first).
    observers: SmallVec<[ObserverEntry; 2]>,
}

impl StateCell {
    pub(crate) fn new(id: StateId, initial: Value) -> Self {
        Self {
            id,
            state_type: initial.state_type(),
            previous: initial.clone(),
            value: initial,
            dirty: false,
            generation: 0,
            observers: SmallVec::new(),
        }
    }

    pub(crate) fn id(&self) -> StateId {
        self.id
    }

    pub(crate) fn state_type(&self) -> StateType {
        self.state_type
    }

    pub(crate) fn value(&self) -> &Value {
        &self.value
    }

    pub(crate) fn previous(&self) -> &Value {
        &self.previous
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Store `value` if it differs from the current one.
    ///
    /// Returns `(old, new)` only when the value changed. The caller has
    /// already checked that `value` has this cell's type.
    pub(crate) fn write(&mut self, value: Value) -> Option<(Value, Value)> {
        debug_assert_eq!(value.state_type(), self.state_type);

        if self.value == value {
            return None;
        }

        self.previous = std::mem::replace(&mut self.value, value);
        self.dirty = true;
        self.generation += 1;
        trace!(state = %self.id, generation = self.generation, old = %self.previous, new = %self.value, "state changed");

        Some((self.previous.clone(), self.value.clone()))
    }

    /// Snapshot `previous = value` and clear the dirty flag.
    ///
    /// Returns whether the cell was dirty.
    pub(crate) fn clear(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.previous = self.value.clone();
        self.dirty = false;
        true
    }

    pub(crate) fn add_observer(&mut self, entry: ObserverEntry) -> Result<()> {
        self.observers
            .try_reserve(1)
            .map_err(|_| StateError::OutOfMemory)?;
        self.observers.push(entry);
        Ok(())
    }

    pub(crate) fn remove_observer(&mut self, observer_id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|entry| entry.id != observer_id);
        self.observers.len() != before
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn observer_callbacks(&self) -> SmallVec<[ObserverFn; 2]> {
        self.observers
            .iter()
            .map(|entry| Arc::clone(&entry.callback))
            .collect()
    }

    pub(crate) fn observer_ids(&self) -> SmallVec<[ObserverId; 2]> {
        self.observers.iter().map(|entry| entry.id).collect()
    }

    /// Callbacks of the observers in `ids` that are still subscribed.
    pub(crate) fn observer_callbacks_among(&self, ids: &[ObserverId]) -> SmallVec<[ObserverFn; 2]> {
        self.observers
            .iter()
            .filter(|entry| ids.contains(&entry.id))
            .map(|entry| Arc::clone(&entry.callback))
            .collect()
    }
}

/// A pending observer dispatch, detached from the store's lock.
pub(crate) struct Notification {
    pub(crate) state_id: StateId,
    pub(crate) old: Value,
    pub(crate) new: Value,
    pub(crate) observers: SmallVec<[ObserverFn; 2]>,
}

impl Notification {
    pub(crate) fn dispatch(self) {
        if self.observers.is_empty() {
            return;
        }
        trace!(state = %self.state_id, observers = self.observers.len(), "notifying observers");
        for observer in &self.observers {
            observer(self.state_id, &self.old, &self.new);
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
