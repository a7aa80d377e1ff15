//! Batch Updates
//!
//! A batch groups several writes so that diff collection, effect execution
//! and dirty-clearing happen once, at commit.
//!
//! # Commit
//!
//! [`Store::batch_commit`] performs, in order:
//!
//! 1. Collect the diff batch and close the batch, under one lock.
//! 2. If the diff is non-empty, run effects.
//! 3. Clear the dirty flags of the reported cells.
//! 4. In [`ObserverMode::Deferred`], notify observers of the cells the
//!    batch changed.
//!
//! The collected batch is returned to the caller. Committing without an
//! open batch performs the same steps. If collection fails the batch stays
//! open and nothing is cleared, so the commit can be retried.
//!
//! Step 3 skips any reported cell that was written again after step 1,
//! whether by another thread or by an effect in step 2. Such a cell keeps
//! its dirty flag and its newer change is reported by the next diff.
//!
//! # Observers during a batch
//!
//! In [`ObserverMode::Immediate`] a batch does not hold back observers:
//! they fire at each write exactly as outside a batch. Only the diff,
//! effects and clearing wait for the commit.
//!
//! In [`ObserverMode::Deferred`] observers stay silent while the batch is
//! open. At commit each changed cell notifies once with the value it held
//! before its first write in the batch and the value it holds at commit.
//! A cell written back to its starting value is not notified. Only
//! observers subscribed before the cell's first write in the batch are
//! notified. Deferred notifications run after the dirty flags are cleared,
//! so writes made by those observers show up in the next diff.

use smallvec::SmallVec;
use tracing::{debug, warn};

use super::cell::Notification;
use super::diff::DiffBatch;
use super::ids::ObserverId;
use super::store::Store;
use super::value::Value;
use crate::config::ObserverMode;
use crate::error::Result;

/// A cell's state before its first write in a deferred batch.
pub(crate) struct DeferredChange {
    pub(crate) origin: Value,
    pub(crate) observers: SmallVec<[ObserverId; 2]>,
}

impl Store {
    /// Open a batch.
    pub fn batch_begin(&self) {
        let mut inner = self.lock();
        if inner.batching {
            debug!("batch already open");
        }
        inner.batching = true;
    }

    /// Whether a batch is open.
    pub fn is_batching(&self) -> bool {
        self.lock().batching
    }

    /// Close the batch and apply it. Returns the diffs it produced.
    pub fn batch_commit(&self) -> Result<DiffBatch> {
        let (diffs, origins) = {
            let mut inner = self.lock();
            let diffs =
                DiffBatch::collect(inner.cells.values(), self.config().initial_diff_capacity)?;
            inner.batching = false;
            (diffs, std::mem::take(&mut inner.batch_origins))
        };

        if !diffs.is_empty() {
            debug!(changes = diffs.len(), "committing state changes");
            for diff in &diffs {
                debug!("{diff}");
            }
            self.run_effects();
        }

        self.clear_reported(&diffs);

        if self.config().observer_mode == ObserverMode::Deferred && !origins.is_empty() {
            let notifications: Vec<Notification> = {
                let inner = self.lock();
                origins
                    .into_iter()
                    .filter_map(|(id, change)| {
                        let cell = inner.cells.get(&id)?;
                        (cell.value() != &change.origin).then(|| Notification {
                            state_id: id,
                            old: change.origin,
                            new: cell.value().clone(),
                            observers: cell.observer_callbacks_among(&change.observers),
                        })
                    })
                    .collect()
            };
            for notification in notifications {
                notification.dispatch();
            }
        }

        Ok(diffs)
    }

    /// Open a batch that commits when the returned guard is dropped.
    ///
    /// ```rust
    /// use reox_state::reactive::Store;
    ///
    /// let store = Store::new();
    /// let a = store.create_int(0).unwrap();
    /// let b = store.create_int(0).unwrap();
    ///
    /// let tx = store.transaction();
    /// store.set_int(a, 1);
    /// store.set_int(b, 2);
    /// let diffs = tx.commit().unwrap();
    ///
    /// assert_eq!(diffs.len(), 2);
    /// assert_eq!(store.dirty_count(), 0);
    /// ```
    pub fn transaction(&self) -> Transaction<'_> {
        self.batch_begin();
        Transaction {
            store: self,
            committed: false,
        }
    }
}

/// Guard for an open batch.
///
/// Commits on drop unless [`commit`](Transaction::commit) was called. A
/// commit failure during drop is logged, not raised.
#[must_use = "dropping the transaction commits it immediately"]
pub struct Transaction<'a> {
    store: &'a Store,
    committed: bool,
}

impl Transaction<'_> {
    /// Commit now and return the diffs.
    pub fn commit(mut self) -> Result<DiffBatch> {
        self.committed = true;
        self.store.batch_commit()
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(err) = self.store.batch_commit() {
            warn!(%err, "transaction commit failed");
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
