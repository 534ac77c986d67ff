//! # Store Benchmarks
//!
//! Performance benchmarks for tessera-core collection and relation
//! operations.
//!
//! Run with: `cargo bench -p tessera-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tessera_core::{
    CriteriaSpec, Direction, FindQuery, ObjectId, Record, RelationSet, RoleId, SequentialSource,
    Store, transitive_reach,
};

/// A store whose `items` collection holds N records with a `rank` field.
fn create_populated_store(size: usize) -> Store {
    let mut store = Store::with_sources(
        Box::new(SequentialSource::new("bench")),
        Box::new(tessera_core::DotCodec),
    );
    for i in 0..size {
        let rec = Record::new().with("rank", i as i64).with("name", "item");
        store.insert_into("items", rec).expect("insert");
    }
    store
}

/// A relation set forming one long containment chain.
fn create_chain_relations(size: usize) -> RelationSet {
    let mut rel = RelationSet::new();
    let role = RoleId::new("contains");
    for i in 0..size {
        rel.insert(
            ObjectId::new(format!("g{i}")),
            role.clone(),
            ObjectId::new(format!("g{}", i + 1)),
        );
    }
    rel
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| black_box(create_populated_store(size)));
        });
    }

    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("find");

    for size in [100, 1000, 10000].iter() {
        let store = create_populated_store(*size);
        let query = FindQuery::matching(CriteriaSpec::field_eq("rank", (*size as i64) / 2));

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(store.find_in("items", &query).expect("find")));
        });
    }

    group.finish();
}

fn bench_roleset(c: &mut Criterion) {
    let mut group = c.benchmark_group("roleset");

    for size in [100, 1000, 10000].iter() {
        let rel = create_chain_relations(*size);
        let role = RoleId::new("contains");
        let anchor = ObjectId::new("g0");

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(rel.get_roleset(&anchor, &role, Direction::Forward)));
        });
    }

    group.finish();
}

fn bench_closure(c: &mut Criterion) {
    let mut group = c.benchmark_group("transitive_closure");

    for size in [10, 100, 1000].iter() {
        let rel = create_chain_relations(*size);
        let role = RoleId::new("contains");
        let start = ObjectId::new("g0");

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let step = |n: &ObjectId| rel.get_roleset(n, &role, Direction::Forward);
                black_box(transitive_reach(step(&start), step))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_find, bench_roleset, bench_closure);
criterion_main!(benches);
