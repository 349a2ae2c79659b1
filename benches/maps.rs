#![allow(
    missing_docs,
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    clippy::similar_names
)]
use std::collections::HashMap;

use criterion::{Criterion, criterion_group, criterion_main};
use probemap::{OpenMap, PerfectMap};
use proptest::{
    prelude::{Strategy, any},
    strategy::ValueTree,
    test_runner::TestRunner,
};

const ITEMS_AMOUNT: usize = 1000;
const SAMPLE_SIZE: usize = 10;

fn map_benches(c: &mut Criterion) {
    let mut runner = TestRunner::default();
    let items = any::<[(String, u64); ITEMS_AMOUNT]>().new_tree(&mut runner).unwrap().current();

    // The perfect map needs a duplicate-free construction set.
    let unique: HashMap<String, u64> = items.iter().cloned().collect();
    let perfect_map = PerfectMap::from_entries(unique.into_iter().collect()).unwrap();

    let mut group = c.benchmark_group("Map comparison benchmark");
    group.sample_size(SAMPLE_SIZE);
    let mut open_map = OpenMap::new();
    let mut rust_map = HashMap::new();
    group.bench_function("open map insert", |b| {
        b.iter(|| {
            for (key, value) in items.clone() {
                open_map.insert(key, value);
            }
        });
    });
    group.bench_function("rust std insert", |b| {
        b.iter(|| {
            for (key, value) in items.clone() {
                rust_map.insert(key, value);
            }
        });
    });
    group.bench_function("open map get", |b| {
        b.iter(|| {
            for (key, _) in &items {
                let _ = open_map.get(key);
            }
        });
    });
    group.bench_function("rust std get", |b| {
        b.iter(|| {
            for (key, _) in &items {
                let _ = rust_map.get(key);
            }
        });
    });
    group.bench_function("perfect map get", |b| {
        b.iter(|| {
            for (key, _) in &items {
                let _ = perfect_map.get(key);
            }
        });
    });
    group.bench_function("open map remove and reinsert", |b| {
        b.iter(|| {
            for (key, value) in &items {
                open_map.remove(key);
                open_map.insert(key.clone(), *value);
            }
        });
    });
    group.finish();
}

criterion_group!(benches, map_benches);
criterion_main!(benches);
