//! Process-wide Store
//!
//! UI code usually shares one engine for the whole process. This module
//! keeps a lazily created [`Store`] in a static and exposes its operations
//! as free functions.
//!
//! The store is created with [`StoreConfig::default`] on first use. Call
//! [`init`] before anything else touches it to pick another configuration.
//!
//! ```rust
//! use reox_state::global;
//!
//! let counter = global::create_int(0).unwrap();
//! global::set_int(counter, 5);
//! assert_eq!(global::get_int(counter), 5);
//! ```

use std::sync::OnceLock;

use crate::config::StoreConfig;
use crate::error::{Result, StateError};
use crate::reactive::{
    ComputedId, DiffBatch, EffectId, ObserverId, StateHandle, StateId, Store, Transaction, Value,
};

static STORE: OnceLock<Store> = OnceLock::new();

/// Configure the process-wide store.
///
/// Fails with [`StateError::AlreadyInitialized`] once the store exists,
/// whether it was created by an earlier `init` or by first use.
pub fn init(config: StoreConfig) -> Result<()> {
    let store = Store::with_config(config)?;
    STORE
        .set(store)
        .map_err(|_| StateError::AlreadyInitialized)
}

/// The process-wide store.
pub fn store() -> &'static Store {
    STORE.get_or_init(Store::new)
}

pub fn create_int(initial: i64) -> Result<StateHandle> {
    store().create_int(initial)
}

pub fn get_int(handle: StateHandle) -> i64 {
    store().get_int(handle)
}

pub fn set_int(handle: StateHandle, value: i64) {
    store().set_int(handle, value)
}

pub fn create_float(initial: f64) -> Result<StateHandle> {
    store().create_float(initial)
}

pub fn get_float(handle: StateHandle) -> f64 {
    store().get_float(handle)
}

pub fn set_float(handle: StateHandle, value: f64) {
    store().set_float(handle, value)
}

pub fn create_bool(initial: bool) -> Result<StateHandle> {
    store().create_bool(initial)
}

pub fn get_bool(handle: StateHandle) -> bool {
    store().get_bool(handle)
}

pub fn set_bool(handle: StateHandle, value: bool) {
    store().set_bool(handle, value)
}

pub fn create_string(initial: impl Into<String>) -> Result<StateHandle> {
    store().create_string(initial)
}

pub fn get_string(handle: StateHandle) -> String {
    store().get_string(handle)
}

pub fn set_string(handle: StateHandle, value: impl Into<String>) {
    store().set_string(handle, value)
}

pub fn create_object(initial: serde_json::Value) -> Result<StateHandle> {
    store().create_object(initial)
}

pub fn get_object(handle: StateHandle) -> serde_json::Value {
    store().get_object(handle)
}

pub fn set_object(handle: StateHandle, value: serde_json::Value) {
    store().set_object(handle, value)
}

pub fn observe<F>(handle: StateHandle, callback: F) -> Result<ObserverId>
where
    F: Fn(StateId, &Value, &Value) + Send + Sync + 'static,
{
    store().observe(handle, callback)
}

pub fn unobserve(handle: StateHandle, observer_id: ObserverId) -> bool {
    store().unobserve(handle, observer_id)
}

pub fn collect_diffs() -> Result<DiffBatch> {
    store().collect_diffs()
}

pub fn clear_dirty() -> usize {
    store().clear_dirty()
}

pub fn computed_create<F>(deps: &[StateHandle], compute: F) -> Result<ComputedId>
where
    F: Fn(&Store) -> f64 + Send + Sync + 'static,
{
    store().computed_create(deps, compute)
}

pub fn computed_get(id: ComputedId) -> f64 {
    store().computed_get(id)
}

pub fn effect_create<F>(deps: &[StateHandle], effect: F) -> Result<EffectId>
where
    F: Fn(&Store) + Send + Sync + 'static,
{
    store().effect_create(deps, effect)
}

pub fn run_effects() -> usize {
    store().run_effects()
}

pub fn batch_begin() {
    store().batch_begin()
}

pub fn batch_commit() -> Result<DiffBatch> {
    store().batch_commit()
}

pub fn transaction() -> Transaction<'static> {
    store().transaction()
}
