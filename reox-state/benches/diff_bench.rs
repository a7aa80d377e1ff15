use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use reox_state::reactive::Store;

fn bench_set_int(c: &mut Criterion) {
    let store = Store::new();
    let counter = store.create_int(0).unwrap();

    let mut i = 0i64;
    c.bench_function("set_int", |b| {
        b.iter(|| {
            store.set_int(counter, black_box(i));
            i += 1;
        });
    });
}

fn bench_set_unchanged(c: &mut Criterion) {
    let store = Store::new();
    let counter = store.create_int(7).unwrap();

    c.bench_function("set_int_unchanged", |b| {
        b.iter(|| store.set_int(counter, black_box(7)));
    });
}

fn bench_collect_diffs(c: &mut Criterion) {
    let mut group = c.benchmark_group("collect_diffs");
    for cells in [16usize, 256, 4096] {
        let store = Store::new();
        let handles: Vec<_> = (0..cells)
            .map(|i| store.create_int(i as i64).unwrap())
            .collect();
        // Every fourth cell dirty.
        for h in handles.iter().step_by(4) {
            store.set_int(*h, -1);
        }

        group.bench_with_input(BenchmarkId::from_parameter(cells), &store, |b, store| {
            b.iter(|| {
                let diffs = store.collect_diffs().unwrap();
                black_box(diffs.len());
            });
        });
    }
    group.finish();
}

fn bench_batch_commit(c: &mut Criterion) {
    let store = Store::new();
    let handles: Vec<_> = (0..64).map(|i| store.create_int(i).unwrap()).collect();
    let mut round = 0i64;

    c.bench_function("batch_commit_64", |b| {
        b.iter(|| {
            round += 1;
            store.batch_begin();
            for h in &handles {
                store.set_int(*h, round);
            }
            let diffs = store.batch_commit().unwrap();
            assert_eq!(diffs.len(), 64);
        });
    });
}

fn bench_computed_get(c: &mut Criterion) {
    let store = Store::new();
    let a = store.create_int(1).unwrap();
    let b_cell = store.create_float(2.0).unwrap();
    let sum = store
        .computed_create(&[a, b_cell], move |s| s.get_int(a) as f64 + s.get_float(b_cell))
        .unwrap();

    let mut i = 0i64;
    c.bench_function("computed_get_after_write", |b| {
        b.iter(|| {
            store.set_int(a, i);
            i += 1;
            black_box(store.computed_get(sum));
        });
    });
}

criterion_group!(
    benches,
    bench_set_int,
    bench_set_unchanged,
    bench_collect_diffs,
    bench_batch_commit,
    bench_computed_get,
);
criterion_main!(benches);
