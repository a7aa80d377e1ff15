//! REOX State
//!
//! This crate provides the reactive state and diff engine of the REOX UI
//! runtime. It implements:
//!
//! - Typed state cells with change-only writes
//! - Per-cell observers notified synchronously on change
//! - Diff collection over dirty cells, for the renderer to consume
//! - Computed values and effects over declared dependencies
//! - Batched transactions with a single commit point
//!
//! Widgets, layout and rendering live elsewhere and only consume this
//! crate's output (dirty flags and diff batches).
//!
//! # Architecture
//!
//! - `reactive`: the [`Store`](reactive::Store) and everything it owns
//! - `graph`: the reverse-dependency index behind computed values and effects
//! - `config`: string, observer and computed policies
//! - `global`: a process-wide store with free-function accessors
//! - `error`: the [`StateError`](error::StateError) taxonomy
//!
//! # Example
//!
//! ```rust
//! use reox_state::reactive::Store;
//!
//! let store = Store::new();
//! let counter = store.create_int(5).unwrap();
//! let name = store.create_string("Alice").unwrap();
//!
//! store.batch_begin();
//! store.set_int(counter, 10);
//! store.set_string(name, "Bob");
//! let diffs = store.batch_commit().unwrap();
//!
//! assert_eq!(diffs.len(), 2);
//! for diff in &diffs {
//!     println!("{diff}"); // e.g. "State #3: 5 -> 10"
//! }
//! ```

pub mod config;
pub mod error;
pub mod global;
pub mod graph;
pub mod reactive;

pub use config::StoreConfig;
pub use error::{Result, StateError};
pub use reactive::{DiffBatch, DiffEntry, StateHandle, Store, Value};
