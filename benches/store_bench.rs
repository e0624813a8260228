//! Benchmarks for FlatKV store operations

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::TempDir;

use flatkv::Store;

const BATCH: usize = 1_000;
const PAYLOAD: usize = 256;

fn fixtures() -> (Vec<String>, Vec<Vec<u8>>) {
    let ids: Vec<String> = (0..BATCH).map(|i| format!("doc{:05}", i)).collect();
    let payloads: Vec<Vec<u8>> = (0..BATCH)
        .map(|i| vec![(i % 256) as u8; PAYLOAD])
        .collect();
    (ids, payloads)
}

fn bench_batched_add(c: &mut Criterion) {
    let (ids, payloads) = fixtures();

    c.bench_function("add_1k_256b", |b| {
        b.iter_batched(
            || {
                let dir = TempDir::new().unwrap();
                let store = Store::open_path(dir.path()).unwrap();
                (dir, store)
            },
            |(_dir, mut store)| {
                store.add(black_box(&ids), black_box(&payloads)).unwrap();
                store.release().unwrap();
            },
            BatchSize::PerIteration,
        )
    });
}

fn bench_point_get(c: &mut Criterion) {
    let (ids, payloads) = fixtures();
    let dir = TempDir::new().unwrap();
    let mut store = Store::open_path(dir.path()).unwrap();
    store.add(&ids, &payloads).unwrap();
    store.release().unwrap();

    let mut i = 0usize;
    c.bench_function("get_single_of_1k", |b| {
        b.iter(|| {
            let key = &ids[i % BATCH];
            i = i.wrapping_add(571);
            let result = store.get(black_box(&[key.as_str()])).unwrap();
            black_box(result);
        })
    });
}

criterion_group!(benches, bench_batched_add, bench_point_get);
criterion_main!(benches);
