//! Diff Collection
//!
//! A diff batch is a snapshot of every dirty cell at the moment of
//! collection: its id, type, the value it replaced and its current value.
//! Collecting does not consume anything. Calling [`Store::collect_diffs`]
//! twice without a [`Store::clear_dirty`] in between yields the same set.
//!
//! Entries own copies of the values, so a batch stays valid across later
//! writes and clears.
//!
//! [`Store::clear_dirty`] clears every dirty cell. A batch commit clears
//! only the changes its batch reported: a cell written again after
//! collection (by another thread, or by an effect during the commit)
//! stays dirty and shows up in the next diff.

use std::fmt;

use serde::Serialize;
use tracing::trace;

use super::cell::StateCell;
use super::ids::StateId;
use super::store::Store;
use super::value::{StateType, Value};
use crate::error::Result;

/// One changed cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffEntry {
    pub state_id: StateId,
    pub state_type: StateType,
    pub old_value: Value,
    pub new_value: Value,
    /// Cell generation at collection time.
    #[serde(skip)]
    pub(crate) generation: u64,
}

impl DiffEntry {
    fn from_cell(cell: &StateCell) -> Self {
        Self {
            state_id: cell.id(),
            state_type: cell.state_type(),
            old_value: cell.previous().clone(),
            new_value: cell.value().clone(),
            generation: cell.generation(),
        }
    }
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "State #{}: {} -> {}",
            self.state_id, self.old_value, self.new_value
        )
    }
}

/// The dirty cells of a store, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DiffBatch {
    entries: Vec<DiffEntry>,
}

impl DiffBatch {
    /// Snapshot the dirty cells among `cells`.
    ///
    /// Storage starts at `initial_capacity` and doubles when full.
    pub(crate) fn collect<'a>(
        cells: impl Iterator<Item = &'a StateCell>,
        initial_capacity: usize,
    ) -> Result<Self> {
        let mut entries: Vec<DiffEntry> = Vec::new();
        entries.try_reserve_exact(initial_capacity.max(1))?;

        for cell in cells.filter(|c| c.is_dirty()) {
            if entries.len() == entries.capacity() {
                entries.try_reserve_exact(entries.capacity())?;
            }
            entries.push(DiffEntry::from_cell(cell));
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiffEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    /// The entry for one cell, if it was dirty.
    pub fn get(&self, state_id: StateId) -> Option<&DiffEntry> {
        self.entries.iter().find(|e| e.state_id == state_id)
    }

    pub fn contains(&self, state_id: StateId) -> bool {
        self.get(state_id).is_some()
    }

    /// Render the batch as a JSON array for downstream consumers.
    pub fn to_json(&self) -> serde_json::Value {
        // Plain data with string keys; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl IntoIterator for DiffBatch {
    type Item = DiffEntry;
    type IntoIter = std::vec::IntoIter<DiffEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a DiffBatch {
    type Item = &'a DiffEntry;
    type IntoIter = std::slice::Iter<'a, DiffEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Store {
    /// Snapshot every cell whose dirty flag is set.
    pub fn collect_diffs(&self) -> Result<DiffBatch> {
        let inner = self.lock();
        let batch = DiffBatch::collect(inner.cells.values(), self.config().initial_diff_capacity)?;
        trace!(diffs = batch.len(), "diffs collected");
        Ok(batch)
    }

    /// Set `previous = value` and clear the flag on every dirty cell.
    ///
    /// Returns how many cells were cleared.
    pub fn clear_dirty(&self) -> usize {
        let mut inner = self.lock();
        let cleared = inner
            .cells
            .values_mut()
            .map(|cell| cell.clear())
            .filter(|&was_dirty| was_dirty)
            .count();
        trace!(cleared, "dirty flags cleared");
        cleared
    }

    /// Clear the cells `batch` reported, unless they changed since.
    pub(crate) fn clear_reported(&self, batch: &DiffBatch) -> usize {
        let mut inner = self.lock();
        let mut cleared = 0;
        for entry in batch {
            let Some(cell) = inner.cells.get_mut(&entry.state_id) else {
                continue;
            };
            if cell.generation() == entry.generation {
                cleared += usize::from(cell.clear());
            } else {
                trace!(state = %entry.state_id, "state moved after collection, kept dirty");
            }
        }
        trace!(cleared, "reported dirty flags cleared");
        cleared
    }
}
