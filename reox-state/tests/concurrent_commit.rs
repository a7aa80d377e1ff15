//! Commits racing writes from another thread.
//!
//! Whatever interleaving the scheduler picks, every change must reach some
//! diff: the last value written is always reported, and once the writer is
//! done a final commit leaves the store clean.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use reox_state::reactive::{Store, Value};

const WRITES: i64 = 2_000;
const TRIALS: usize = 50;

fn reported_values(store: &Store, handle: reox_state::StateHandle) -> Vec<i64> {
    let done = AtomicBool::new(false);
    let mut seen = Vec::new();

    thread::scope(|scope| {
        scope.spawn(|| {
            for i in 1..=WRITES {
                store.set_int(handle, i);
            }
            done.store(true, Ordering::SeqCst);
        });

        while !done.load(Ordering::SeqCst) {
            let diffs = store.batch_commit().unwrap();
            seen.extend(diffs.get(handle).and_then(|e| e.new_value.as_int()));
        }
    });

    let diffs = store.batch_commit().unwrap();
    seen.extend(diffs.get(handle).and_then(|e| e.new_value.as_int()));
    seen
}

#[test]
fn last_write_always_reaches_a_diff() {
    for _ in 0..TRIALS {
        let store = Store::new();
        let x = store.create_int(0).unwrap();

        let seen = reported_values(&store, x);

        assert_eq!(seen.last(), Some(&WRITES));
        assert!(seen.windows(2).all(|w| w[0] < w[1]), "stale diff in {seen:?}");
        assert_eq!(store.dirty_count(), 0);
        assert_eq!(store.previous(x), Ok(Value::Int(WRITES)));
    }
}

#[test]
fn commit_after_writer_finishes_reports_final_value() {
    let store = Store::new();
    let x = store.create_int(0).unwrap();

    thread::scope(|scope| {
        scope.spawn(|| {
            for i in 1..=WRITES {
                store.set_int(x, i);
            }
        });
    });

    let diffs = store.batch_commit().unwrap();
    assert_eq!(diffs.get(x).unwrap().new_value, Value::Int(WRITES));
    assert!(store.batch_commit().unwrap().is_empty());
}
