//! Benchmarks for query compilation and execution.
//!
//! Join benchmarks drain the lazy output, since nothing is computed until
//! rows are pulled. End-to-end benchmarks run a compiled plan, including
//! push-down filters and the output stage.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quarry_core::schema::{Schema, SchemaBuilder};
use quarry_core::{DataType, Tuple, Value};
use quarry_query::ast::{ColumnRef, CompOp, Comparison};
use quarry_query::executor::join::{HashJoin, NestedLoopJoin};
use quarry_query::executor::{compile_comparison, Relation, Selector, TupleLayout};
use quarry_query::QueryPlanner;
use std::rc::Rc;

// ============================================================================
// Data Generation Utilities
// ============================================================================

/// Simple LCG for reproducible pseudo-random shuffling
fn shuffle_indices(count: usize, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..count).collect();
    let mut s = seed;
    for i in (1..count).rev() {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        let j = (s as usize) % (i + 1);
        indices.swap(i, j);
    }
    indices
}

fn schema(name: &str) -> Schema {
    SchemaBuilder::new(name)
        .and_then(|b| b.field("key", DataType::Int64))
        .and_then(|b| b.field("label", DataType::String))
        .and_then(|b| b.field("score", DataType::Int64))
        .and_then(|b| b.build())
        .unwrap()
}

/// Creates tuples with controlled key distribution
fn create_rows(count: usize, key_range: usize, seed: u64) -> Vec<Tuple> {
    shuffle_indices(count, seed)
        .into_iter()
        .map(|i| {
            Tuple::new(vec![
                Value::Int64((i % key_range.max(1)) as i64),
                Value::String(format!("value_{}", i)),
                Value::Int64((i % 100) as i64),
            ])
        })
        .collect()
}

// ============================================================================
// JOIN Benchmarks
// ============================================================================

fn bench_hash_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_join");

    for size in [100, 1000, 10000].iter() {
        let key_range = size / 10; // 10% selectivity
        let left_rows = create_rows(*size, key_range, 12345);
        let right_rows = create_rows(*size, key_range, 67890);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            let join = HashJoin::new(vec![0], vec![0]);
            b.iter(|| {
                let rows = join.execute(Relation::from_tuples(&left_rows), Relation::from_tuples(&right_rows));
                black_box(rows.count())
            })
        });
    }

    group.finish();
}

fn bench_nested_loop_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_loop_join");
    let layout = TupleLayout::joined(&schema("l"), &schema("r"));
    let cmp = Comparison::with_column(ColumnRef::tagged(0, "key"), CompOp::Eq, ColumnRef::tagged(1, "key"));
    let condition = Rc::new(Selector::Compare(compile_comparison(&cmp, &layout).unwrap()));

    // Smaller sizes for O(n*m) algorithm
    for size in [100, 500, 1000].iter() {
        let key_range = size / 10;
        let left_rows = create_rows(*size, key_range, 12345);
        let right_rows = create_rows(*size, key_range, 67890);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            let join = NestedLoopJoin::new(Rc::clone(&condition));
            b.iter(|| {
                let rows = join.execute(Relation::from_tuples(&left_rows), Relation::from_tuples(&right_rows));
                black_box(rows.count())
            })
        });
    }

    group.finish();
}

// ============================================================================
// End-to-end Benchmarks
// ============================================================================

fn bench_compile(c: &mut Criterion) {
    let schemas = [schema("l"), schema("r")];
    let sql = "SELECT l.label, r.score FROM l, r ON l.key = r.key \
               WHERE l.score > 10 AND r.score < 90 OR l.label = 'value_1'";
    let planner = QueryPlanner::new();

    c.bench_function("compile_join_query", |b| {
        b.iter(|| black_box(planner.compile(black_box(sql), &schemas).unwrap()))
    });
}

fn bench_filter_group(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_group");
    let plan = QueryPlanner::new()
        .compile(
            "SELECT key, COUNT(*), SUM(score), AVG(score) FROM t WHERE score >= 50 GROUP BY key",
            &[schema("t")],
        )
        .unwrap();

    for size in [1000, 10000, 100000].iter() {
        let rows = create_rows(*size, 100, 424242);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(plan.execute(Relation::from_tuples(&rows)).unwrap().count()))
        });
    }

    group.finish();
}

fn bench_join_pushdown(c: &mut Criterion) {
    let mut group = c.benchmark_group("join_pushdown");
    let plan = QueryPlanner::new()
        .compile(
            "SELECT l.label, r.label FROM l, r ON l.key = r.key WHERE l.score < 10 AND r.score < 10",
            &[schema("l"), schema("r")],
        )
        .unwrap();

    for size in [1000, 10000].iter() {
        let left_rows = create_rows(*size, size / 10, 1);
        let right_rows = create_rows(*size, size / 10, 2);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let rows = plan
                    .execute_join(Relation::from_tuples(&left_rows), Relation::from_tuples(&right_rows))
                    .unwrap();
                black_box(rows.count())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_hash_join,
    bench_nested_loop_join,
    bench_compile,
    bench_filter_group,
    bench_join_pushdown,
);

criterion_main!(benches);
