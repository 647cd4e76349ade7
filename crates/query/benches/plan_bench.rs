//! Benchmarks for execution plan evaluation.
//!
//! Plans are built once outside the measured loop, matching how a continuous
//! query is registered once and then evaluated for every batch.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rivulet_core::{Map, Tuple, Value};
use rivulet_query::ast::{Expr, SelectQuery};
use rivulet_query::function::DefaultFunctionRegistry;
use rivulet_query::plan::{merge_inputs, ExecutionPlan};

// ============================================================================
// Data Generation Utilities
// ============================================================================

/// Simple LCG for reproducible pseudo-random values
fn lcg_values(count: usize, seed: u64) -> Vec<i64> {
    let mut s = seed;
    (0..count)
        .map(|_| {
            s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((s >> 33) % 1000) as i64
        })
        .collect()
}

/// Creates flat records with a group column of `groups` distinct values
fn create_records(count: usize, groups: i64) -> Vec<Map> {
    lcg_values(count, 12345)
        .into_iter()
        .enumerate()
        .map(|(i, x)| {
            Map::from([
                ("id", Value::Int(i as i64)),
                ("g", Value::Int(x % groups)),
                ("x", Value::Int(x)),
                ("name", Value::String(format!("name_{}", i))),
            ])
        })
        .collect()
}

fn build(query: SelectQuery) -> ExecutionPlan {
    ExecutionPlan::build(&query, &DefaultFunctionRegistry::with_builtins()).unwrap()
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection");
    let plan = build(
        SelectQuery::new()
            .project("id", Expr::field("id"))
            .project("y", Expr::add(Expr::mul(Expr::field("x"), Expr::literal(2i64)), Expr::literal(1i64)))
            .project("label", Expr::call("upper", vec![Expr::field("name")])),
    );

    for size in [100, 1000, 10000].iter() {
        let batch = create_records(*size, 10);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(plan.evaluate_all(&batch).unwrap()))
        });
    }

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");
    let plan = build(
        SelectQuery::new()
            .project("*", Expr::wildcard())
            .filter(Expr::gt(Expr::field("x"), Expr::literal(500i64))),
    );

    for size in [100, 1000, 10000].iter() {
        let batch = create_records(*size, 10);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(plan.evaluate_all(&batch).unwrap()))
        });
    }

    group.finish();
}

fn bench_group_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_aggregate");
    let plan = build(
        SelectQuery::new()
            .project("g", Expr::field("g"))
            .project("n", Expr::count_star())
            .project("total", Expr::aggregate("sum", Expr::field("x")))
            .project(
                "range",
                Expr::sub(
                    Expr::aggregate("max", Expr::field("x")),
                    Expr::aggregate("min", Expr::field("x")),
                ),
            )
            .group_by(Expr::field("g")),
    );

    for groups in [1i64, 10, 100].iter() {
        let batch = create_records(10000, *groups);
        group.bench_with_input(BenchmarkId::new("groups", groups), groups, |b, _| {
            b.iter(|| black_box(plan.evaluate_all(&batch).unwrap()))
        });
    }

    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let registry = DefaultFunctionRegistry::with_builtins();
    let query = SelectQuery::new()
        .project("g", Expr::field("g"))
        .project(
            "mean",
            Expr::div(
                Expr::aggregate("sum", Expr::field("x")),
                Expr::aggregate("count", Expr::field("x")),
            ),
        )
        .project("dev", Expr::aggregate("stddev", Expr::field("x")))
        .filter(Expr::and(
            Expr::is_not_null(Expr::field("x")),
            Expr::ne(Expr::field("g"), Expr::literal(0i64)),
        ))
        .group_by(Expr::field("g"));

    c.bench_function("build_plan", |b| {
        b.iter(|| black_box(ExecutionPlan::build(&query, &registry).unwrap()))
    });
}

fn bench_merge_inputs(c: &mut Criterion) {
    let left: Vec<Tuple> = create_records(1000, 10)
        .into_iter()
        .enumerate()
        .map(|(i, data)| Tuple::with_timestamp(data, i as i64))
        .collect();
    let right = left.clone();

    c.bench_function("merge_inputs_1000", |b| {
        b.iter(|| {
            let merged: Vec<Map> = left
                .iter()
                .zip(&right)
                .map(|(l, r)| merge_inputs([("l", l), ("r", r)]))
                .collect();
            black_box(merged)
        })
    });
}

criterion_group!(
    benches,
    bench_projection,
    bench_filter,
    bench_group_aggregate,
    bench_build,
    bench_merge_inputs,
);

criterion_main!(benches);
