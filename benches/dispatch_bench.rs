//! Criterion benchmarks for u-dispatch.
//!
//! Measures resolution overhead of chains and customization points, and
//! the cost of routing a call through the invoke protocol.

use std::sync::LazyLock;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use u_dispatch::sequence::{visit, Par, Seq, Traced, FOR_EACH};
use u_dispatch::{CustomizationPoint, PriorityChain, Signature, Typed};

// ===========================================================================
// Fixtures
// ===========================================================================

struct Subject(u64);
struct Policy;
struct Measure;

static MEASURE: LazyLock<CustomizationPoint> = LazyLock::new(|| {
    CustomizationPoint::builder::<Measure>("measure")
        .member("subject_measure", |(s, k): (Subject, u64)| s.0 * k)
        .fallback_fn("measure_u64", |(n,): (u64,)| n + 1)
        .build()
        .expect("measure point")
});

/// A chain of `len` strategies where only the last accepts `(u64,)`.
fn chain_of(len: usize) -> PriorityChain {
    (0..len.saturating_sub(1))
        .fold(PriorityChain::labeled("bench"), |chain, _| {
            chain.with_strategy(Typed::new("miss", |(n,): (u8,)| n))
        })
        .with_strategy(Typed::new("hit", |(n,): (u64,)| n))
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_chain_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_resolution");
    let signature = Signature::of::<(u64,)>();

    for &len in &[1usize, 8, 64] {
        let chain = chain_of(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &chain, |b, chain| {
            b.iter(|| black_box(chain.resolve(black_box(&signature))))
        });
    }
    group.finish();
}

fn bench_point_call(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_call");

    group.bench_function("member", |b| {
        b.iter(|| black_box(MEASURE.call::<u64, _>((Subject(3), black_box(7u64)))))
    });
    group.bench_function("fallback", |b| {
        b.iter(|| black_box(MEASURE.call::<u64, _>((black_box(7u64),))))
    });
    group.bench_function("through_invoke", |b| {
        b.iter(|| black_box(MEASURE.call::<u64, _>((Policy, black_box(7u64)))))
    });
    group.finish();
}

fn bench_for_each_policies(c: &mut Criterion) {
    let mut group = c.benchmark_group("for_each");
    group.sample_size(20);

    for &n in &[1_000usize, 100_000] {
        let data: Vec<i64> = (0..n as i64).collect();
        let f = visit(|x: &i64| {
            black_box(x);
        });

        group.bench_with_input(BenchmarkId::new("plain", n), &data, |b, data| {
            b.iter(|| black_box(FOR_EACH.call::<usize, _>((data.clone(), f.clone()))))
        });
        group.bench_with_input(BenchmarkId::new("seq", n), &data, |b, data| {
            b.iter(|| black_box(FOR_EACH.call::<usize, _>((Seq, data.clone(), f.clone()))))
        });
        group.bench_with_input(BenchmarkId::new("par", n), &data, |b, data| {
            b.iter(|| black_box(FOR_EACH.call::<usize, _>((Par, data.clone(), f.clone()))))
        });
        group.bench_with_input(BenchmarkId::new("traced", n), &data, |b, data| {
            b.iter(|| black_box(FOR_EACH.call::<usize, _>((Traced, data.clone(), f.clone()))))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_chain_resolution,
    bench_point_call,
    bench_for_each_policies
);
criterion_main!(benches);
