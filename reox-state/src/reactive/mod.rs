//! Reactive State
//!
//! This module implements the state and diff engine: typed state cells,
//! observers, diff collection, computed values, effects and batches.
//!
//! # Concepts
//!
//! ## State cells
//!
//! A state cell holds one typed value plus the value it replaced and a
//! dirty flag. Writes are change-only: writing the current value again does
//! nothing at all.
//!
//! ## Observers
//!
//! An observer is a callback on one cell, invoked synchronously with the
//! old and new value on every changing write.
//!
//! ## Diffs
//!
//! A diff batch lists every dirty cell with its old and new value. The UI
//! layer collects it to decide what to re-layout and re-render, then clears
//! the dirty flags.
//!
//! ## Computed values and effects
//!
//! Both are bound to an explicit list of cells. A computed value caches an
//! `f64` and re-evaluates lazily once a dependency changed. An effect is a
//! callback re-run by `run_effects` while any dependency is dirty.
//!
//! ## Batches
//!
//! A batch defers diff collection, effects and clearing to one commit.
//!
//! # Implementation Notes
//!
//! Everything lives in a [`Store`] behind a single lock. Dependencies are
//! declared, not discovered, so there is no tracking context: the store
//! keeps an explicit reverse-dependency index instead.

mod batch;
mod cell;
mod computed;
mod diff;
mod effect;
mod ids;
mod store;
mod value;

pub use batch::Transaction;
pub use cell::ObserverFn;
pub use computed::ComputeFn;
pub use diff::{DiffBatch, DiffEntry};
pub use effect::EffectFn;
pub use ids::{ComputedId, EffectId, ObserverId, StateHandle, StateId};
pub use store::Store;
pub use value::{StateType, StateValue, Value};
