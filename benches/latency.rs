//! Criterion latency benchmarks for the matching core.
//!
//! Measures:
//! - Submit (no match)
//! - Submit (full match) across book depths
//! - Cancel
//! - Mixed workload
//! - SPSC round trip

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nanomatch::{spsc, MatchingEngine, OrderRequest, OrderType, Side, Symbol};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn symbol() -> Symbol {
    Symbol::new("BENCH")
}

fn fresh_engine(capacity: u32) -> MatchingEngine {
    let mut engine = MatchingEngine::with_book_capacity(capacity);
    engine.add_instrument(symbol());
    engine.warm_up();
    engine
}

/// Benchmark: order that rests without matching.
fn bench_submit_no_match(c: &mut Criterion) {
    let mut engine = fresh_engine(1_000_000);

    c.bench_function("submit_no_match", |b| {
        b.iter(|| {
            // Deep below any ask; always rests.
            black_box(engine.submit_order(
                symbol(),
                Side::Buy,
                OrderType::Limit,
                9_000,
                100,
                1,
            ))
        })
    });
}

/// Benchmark: order that fully matches against pre-seeded depth.
fn bench_submit_full_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_full_match");

    for depth in [1usize, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            let mut engine = fresh_engine(1_000_000);

            // Seed a deep ask queue; each measured order sweeps `depth`
            // resting orders off the front.
            for _ in 0..500_000 {
                engine.submit_order(symbol(), Side::Sell, OrderType::Limit, 10_000, 100, 1);
            }

            b.iter(|| {
                black_box(engine.submit_order(
                    symbol(),
                    Side::Buy,
                    OrderType::Limit,
                    10_000,
                    depth as i64 * 100,
                    1,
                ))
            })
        });
    }
    group.finish();
}

/// Benchmark: cancel a resting order.
fn bench_cancel(c: &mut Criterion) {
    let mut engine = fresh_engine(1_000_000);

    // Pre-place the victims; each iteration cancels a distinct one.
    let mut ids: Vec<u64> = (0..500_000)
        .map(|_| engine.submit_order(symbol(), Side::Buy, OrderType::Limit, 9_000, 100, 1))
        .collect();

    c.bench_function("cancel", |b| {
        b.iter(|| match ids.pop() {
            Some(id) => black_box(engine.cancel_order(symbol(), id)),
            None => black_box(false),
        })
    });
}

/// Benchmark: realistic mix of places and cancels around a moving band.
fn bench_mixed_workload(c: &mut Criterion) {
    let mut engine = fresh_engine(1_000_000);
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut active: Vec<u64> = Vec::new();

    c.bench_function("mixed_workload", |b| {
        b.iter(|| {
            if active.len() < 100 || rng.gen_bool(0.7) {
                let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
                let price = rng.gen_range(9_900..10_100) * 100;
                let id = engine.submit_order(
                    symbol(),
                    side,
                    OrderType::Limit,
                    price,
                    rng.gen_range(1..1_000),
                    1,
                );
                if id != 0 {
                    active.push(id);
                }
            } else {
                let idx = rng.gen_range(0..active.len());
                let id = active.swap_remove(idx);
                black_box(engine.cancel_order(symbol(), id));
            }
        })
    });
}

/// Benchmark: single-threaded SPSC push/pop pair.
fn bench_spsc_round_trip(c: &mut Criterion) {
    let (mut tx, mut rx) = spsc::ring_buffer::<OrderRequest>(1024);
    let request = OrderRequest::new_order(symbol(), Side::Buy, OrderType::Limit, 10_000, 100, 1);

    c.bench_function("spsc_round_trip", |b| {
        b.iter(|| {
            let _ = tx.try_push(black_box(request));
            black_box(rx.try_pop())
        })
    });
}

criterion_group!(
    benches,
    bench_submit_no_match,
    bench_submit_full_match,
    bench_cancel,
    bench_mixed_workload,
    bench_spsc_round_trip,
);
criterion_main!(benches);
