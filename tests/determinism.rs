//! Golden-master determinism: the same request sequence must produce an
//! identical execution report stream and final book state on every run.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use nanomatch::{
    ExecutionReport, MatchingEngine, OrderRequest, OrderType, Side, Symbol, INVALID_ORDER_ID,
};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn symbol() -> Symbol {
    Symbol::new("DET")
}

/// Deterministic request sequence: 70% place, 30% cancel of a live id.
fn generate_requests(seed: u64, count: usize) -> Vec<OrderRequest> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut requests = Vec::with_capacity(count);
    // Ids are assigned by the engine in submission order, so track them
    // by position: the n-th NEW request receives id n+1.
    let mut placed = 0u64;
    let mut active: Vec<u64> = Vec::new();

    for _ in 0..count {
        if active.is_empty() || rng.gen_bool(0.7) {
            let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
            let price = rng.gen_range(9_500..10_500) * 100;
            let qty = rng.gen_range(1..500);
            requests.push(OrderRequest::new_order(
                symbol(),
                side,
                OrderType::Limit,
                price,
                qty,
                rng.gen_range(1..100),
            ));
            placed += 1;
            active.push(placed);
        } else {
            let idx = rng.gen_range(0..active.len());
            let id = active.swap_remove(idx);
            requests.push(OrderRequest::cancel(symbol(), id));
        }
    }

    requests
}

/// Hash the report stream, skipping wall-clock timestamps.
fn hash_reports(reports: &[ExecutionReport]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for report in reports {
        report.order_id.hash(&mut hasher);
        report.contra_order_id.hash(&mut hasher);
        report.execution_price.hash(&mut hasher);
        report.execution_quantity.hash(&mut hasher);
        (report.kind as u8).hash(&mut hasher);
        (report.order_status as u8).hash(&mut hasher);
        report.leaves_quantity.hash(&mut hasher);
        report.cumulative_quantity.hash(&mut hasher);
    }
    hasher.finish()
}

/// Hash the final book shape.
fn hash_book_state(engine: &MatchingEngine) -> u64 {
    let mut hasher = DefaultHasher::new();
    let book = engine.get_book(symbol()).expect("book registered");

    book.best_bid().hash(&mut hasher);
    book.best_ask().hash(&mut hasher);
    book.order_count().hash(&mut hasher);

    let depth = book.get_depth(usize::MAX);
    for level in depth.bids.iter().chain(depth.asks.iter()) {
        level.price.hash(&mut hasher);
        level.quantity.hash(&mut hasher);
        level.order_count.hash(&mut hasher);
    }

    hasher.finish()
}

fn run(seed: u64, count: usize) -> (u64, u64) {
    let mut engine = MatchingEngine::with_book_capacity(100_000);
    engine.add_instrument(symbol());

    let reports: Arc<Mutex<Vec<ExecutionReport>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reports);
    engine.set_execution_callback(move |report| sink.lock().unwrap().push(*report));

    for request in generate_requests(seed, count) {
        engine.process_request(&request);
    }

    let reports = reports.lock().unwrap();
    (hash_reports(&reports), hash_book_state(&engine))
}

#[test]
fn test_identical_runs_identical_streams() {
    let (reports_a, book_a) = run(12345, 10_000);
    let (reports_b, book_b) = run(12345, 10_000);

    assert_eq!(reports_a, reports_b, "report streams diverged");
    assert_eq!(book_a, book_b, "final book states diverged");
}

#[test]
fn test_different_seeds_diverge() {
    let (reports_a, _) = run(1, 5_000);
    let (reports_b, _) = run(2, 5_000);
    assert_ne!(reports_a, reports_b, "different inputs should differ");
}

#[test]
fn test_id_assignment_is_deterministic() {
    for _ in 0..3 {
        let mut engine = MatchingEngine::with_book_capacity(1_000);
        engine.add_instrument(symbol());

        let mut ids = Vec::new();
        for i in 0..10i64 {
            ids.push(engine.submit_order(
                symbol(),
                Side::Buy,
                OrderType::Limit,
                9_000 + i,
                10,
                0,
            ));
        }
        assert_eq!(ids, (1..=10).collect::<Vec<u64>>());
        assert!(!ids.contains(&INVALID_ORDER_ID));
    }
}
