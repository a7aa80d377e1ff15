//! Walkthrough of the state engine: cells, observers, a batch, manual diff
//! collection and the change-only write rule.
//!
//! Run with `RUST_LOG=reox_state=debug` to see the engine's own logging.

use reox_state::reactive::{Store, Value};
use reox_state::Result;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let store = Store::new();

    println!("1. Creating state cells");
    let counter = store.create_int(0)?;
    let username = store.create_string("Guest")?;
    let dark_mode = store.create_bool(false)?;
    let volume = store.create_float(0.75)?;
    print_values(&store, counter, username, dark_mode, volume);

    println!("2. Adding observers");
    store.observe_as::<i64, _>(counter, |_, old, new| {
        println!("  [observer] counter: {old} -> {new} ({:+})", new - old);
    })?;
    store.observe(username, |_, old, new| {
        if let (Value::String(old), Value::String(new)) = (old, new) {
            println!("  [observer] username: '{old}' -> '{new}'");
        }
    })?;
    store.effect_create(&[dark_mode, volume], |_| {
        println!("  [effect] UI needs update");
    })?;

    println!("3. Individual writes");
    store.set_int(counter, 1);
    store.set_int(counter, 5);
    store.set_string(username, "Alice");
    store.clear_dirty();

    println!("4. Batch update");
    store.batch_begin();
    store.set_int(counter, 10);
    store.set_string(username, "Bob");
    store.set_bool(dark_mode, true);
    store.set_float(volume, 0.50);
    let committed = store.batch_commit()?;
    for diff in &committed {
        println!("  [diff] {diff}");
    }

    println!("5. More writes, collected by hand");
    store.set_int(counter, 15);
    store.set_string(username, "Charlie");
    let diffs = store.collect_diffs()?;
    println!("  collected {} diffs", diffs.len());
    for diff in &diffs {
        println!("  [diff] {diff}");
    }
    store.clear_dirty();

    println!("6. Writing the same value");
    let before = store.dirty_count();
    store.set_int(counter, 15);
    println!("  dirty before: {before}, after: {}", store.dirty_count());

    println!("7. Final values");
    print_values(&store, counter, username, dark_mode, volume);

    let json = serde_json::to_string_pretty(&committed.to_json()).unwrap_or_default();
    println!("Batch from step 4 as JSON:\n{json}");
    Ok(())
}

fn print_values(
    store: &Store,
    counter: reox_state::StateHandle,
    username: reox_state::StateHandle,
    dark_mode: reox_state::StateHandle,
    volume: reox_state::StateHandle,
) {
    println!("  counter = {}", store.get_int(counter));
    println!("  username = '{}'", store.get_string(username));
    println!("  dark_mode = {}", store.get_bool(dark_mode));
    println!("  volume = {:.2}", store.get_float(volume));
}
