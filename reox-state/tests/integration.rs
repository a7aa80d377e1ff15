//! Integration Tests for the State Engine
//!
//! These tests walk the end-to-end scenarios a UI layer relies on: writes,
//! diffs, observers, batches, computed values and effects working together.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use reox_state::config::{ObserverMode, StoreConfig};
use reox_state::reactive::{StateId, Store, Value};

type Calls = Arc<Mutex<Vec<(StateId, Value, Value)>>>;

fn recorder(store: &Store, handle: StateId) -> (Calls, reox_state::reactive::ObserverId) {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let calls_clone = calls.clone();
    let id = store
        .observe(handle, move |state, old, new| {
            calls_clone.lock().push((state, old.clone(), new.clone()));
        })
        .unwrap();
    (calls, id)
}

/// A write shows up in the next diff with its old and new value.
#[test]
fn int_write_produces_diff() {
    let store = Store::new();
    let counter = store.create_int(0).unwrap();

    store.set_int(counter, 5);
    assert_eq!(store.get_int(counter), 5);

    let diffs = store.collect_diffs().unwrap();
    let entry = diffs.get(counter).unwrap();
    assert_eq!(entry.old_value, Value::Int(0));
    assert_eq!(entry.new_value, Value::Int(5));
}

/// Writing the same value again leaves no trace.
#[test]
fn same_value_write_is_invisible() {
    let store = Store::new();
    let counter = store.create_int(0).unwrap();
    store.set_int(counter, 5);
    store.clear_dirty();

    let before = store.dirty_count();
    store.set_int(counter, 5);

    assert_eq!(store.dirty_count(), before);
    assert!(store.collect_diffs().unwrap().is_empty());
}

/// The batch walkthrough: two fields change, one consolidated diff.
#[test]
fn batch_produces_consolidated_diff() {
    let store = Store::new();
    let counter = store.create_int(5).unwrap();
    let name = store.create_string("Alice").unwrap();
    let untouched = store.create_bool(false).unwrap();

    store.batch_begin();
    store.set_int(counter, 10);
    store.set_string(name, "Bob");
    let diffs = store.batch_commit().unwrap();

    assert_eq!(diffs.len(), 2);
    let c = diffs.get(counter).unwrap();
    assert_eq!((c.old_value.clone(), c.new_value.clone()), (Value::Int(5), Value::Int(10)));
    let n = diffs.get(name).unwrap();
    assert_eq!(n.old_value, Value::String("Alice".into()));
    assert_eq!(n.new_value, Value::String("Bob".into()));
    assert!(!diffs.contains(untouched));

    assert_eq!(store.is_dirty(counter), Ok(false));
    assert_eq!(store.is_dirty(name), Ok(false));
}

/// Observers see the change they subscribed for and nothing after unobserve.
#[test]
fn observe_then_unobserve() {
    let store = Store::new();
    let counter = store.create_int(5).unwrap();
    let (calls, obs1) = recorder(&store, counter);

    store.set_int(counter, 7);
    assert_eq!(*calls.lock(), vec![(counter, Value::Int(5), Value::Int(7))]);

    assert!(store.unobserve(counter, obs1));
    store.set_int(counter, 9);
    assert_eq!(calls.lock().len(), 1);

    // Removing it again is a harmless no-op.
    assert!(!store.unobserve(counter, obs1));
}

/// Subscribing after a write never replays it.
#[test]
fn late_subscriber_misses_earlier_writes() {
    let store = Store::new();
    let counter = store.create_int(0).unwrap();
    store.set_int(counter, 1);

    let (calls, _) = recorder(&store, counter);
    assert!(calls.lock().is_empty());

    store.set_int(counter, 2);
    assert_eq!(*calls.lock(), vec![(counter, Value::Int(1), Value::Int(2))]);
}

/// Observers fire at the write, not at commit, in the default mode.
#[test]
fn observers_fire_inside_open_batch() {
    let store = Store::new();
    let counter = store.create_int(0).unwrap();
    let (calls, _) = recorder(&store, counter);

    store.batch_begin();
    store.set_int(counter, 3);
    assert_eq!(calls.lock().len(), 1);
    assert!(store.is_batching());

    store.batch_commit().unwrap();
    assert_eq!(calls.lock().len(), 1);
}

/// With deferred observers the same batch notifies once, at commit.
#[test]
fn deferred_observers_wait_for_commit() {
    let config = StoreConfig::default().with_observer_mode(ObserverMode::Deferred);
    let store = Store::with_config(config).unwrap();
    let counter = store.create_int(0).unwrap();
    let (calls, _) = recorder(&store, counter);

    let tx = store.transaction();
    store.set_int(counter, 3);
    store.set_int(counter, 4);
    assert!(calls.lock().is_empty());
    tx.commit().unwrap();

    assert_eq!(*calls.lock(), vec![(counter, Value::Int(0), Value::Int(4))]);
}

/// A 300-character initial string is cut to 255 bytes.
#[test]
fn long_initial_string_is_truncated() {
    let store = Store::new();
    let long = "x".repeat(300);
    let s = store.create_string(long.as_str()).unwrap();

    let stored = store.get_string(s);
    assert_eq!(stored.len(), 255);
    assert_eq!(stored, long[..255]);
}

/// Commit runs effects for the changed cells, then clears.
#[test]
fn commit_drives_effects() {
    let store = Store::new();
    let volume = store.create_float(0.75).unwrap();
    let muted = store.create_bool(false).unwrap();
    let renders = Arc::new(AtomicI32::new(0));
    let renders_clone = renders.clone();

    let effect = store
        .effect_create(&[volume, muted], move |_| {
            renders_clone.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    assert_eq!(renders.load(Ordering::SeqCst), 1);

    {
        let _tx = store.transaction();
        store.set_float(volume, 0.5);
        store.set_bool(muted, true);
    }

    assert_eq!(renders.load(Ordering::SeqCst), 2);
    assert_eq!(store.effect_run_count(effect), Ok(2));
    assert_eq!(store.dirty_count(), 0);

    // Nothing dirty, nothing to run.
    assert_eq!(store.run_effects(), 0);
}

/// A computed value follows its inputs across a batch.
#[test]
fn computed_follows_batched_writes() {
    let store = Store::new();
    let width = store.create_int(10).unwrap();
    let scale = store.create_float(1.0).unwrap();
    let scaled = store
        .computed_create(&[width, scale], move |s| {
            s.get_int(width) as f64 * s.get_float(scale)
        })
        .unwrap();
    assert_eq!(store.computed_get(scaled), 10.0);

    store.batch_begin();
    store.set_int(width, 20);
    store.set_float(scale, 1.5);
    store.batch_commit().unwrap();

    assert_eq!(store.computed_get(scaled), 30.0);
}

/// An effect may write other state; those writes stay visible to the host.
#[test]
fn effect_writes_are_visible() {
    let store = Store::new();
    let input = store.create_int(1).unwrap();
    let doubled = store.create_int(2).unwrap();

    store
        .effect_create(&[input], move |s| {
            s.set_int(doubled, s.get_int(input) * 2);
        })
        .unwrap();

    store.set_int(input, 21);
    store.run_effects();
    assert_eq!(store.get_int(doubled), 42);

    let diffs = store.collect_diffs().unwrap();
    assert!(diffs.contains(input));
    assert!(diffs.contains(doubled));
}

/// Handles are only meaningful in the store that issued them.
#[test]
fn stores_are_isolated() {
    let a = Store::new();
    let b = Store::new();
    let h = a.create_int(1).unwrap();

    assert!(a.contains(h));
    assert!(!b.contains(h));
    b.set_int(h, 2);
    assert_eq!(a.get_int(h), 1);
}
