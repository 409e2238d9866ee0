//! Tick-to-order latency harness.
//!
//! Drives the matching engine synchronously with a pre-generated request
//! mix and reports the per-request latency distribution with nanosecond
//! resolution.
//!
//! Usage:
//!   latency_report [iterations]   run the measurement (default 1,000,000)
//!   latency_report --selftest     run the end-to-end smoke scenarios

use std::time::Instant;

use hdrhistogram::Histogram;
use nanomatch::{
    ExecutionKind, MatchingEngine, OrderRequest, OrderType, Side, Symbol, PRICE_SCALE,
};

const DEFAULT_ITERATIONS: u64 = 1_000_000;
const BOOK_CAPACITY: u32 = 1_000_000;

fn main() {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("--selftest") | Some("-selftest") => {
            run_selftest();
        }
        arg => {
            let iterations = arg
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(DEFAULT_ITERATIONS);
            run_measurement(iterations);
        }
    }
}

fn run_measurement(iterations: u64) {
    println!("Preparing latency measurement...");

    let symbol = Symbol::new("BTC-USD");
    let mut engine = MatchingEngine::with_book_capacity(BOOK_CAPACITY);
    engine.add_instrument(symbol);
    engine.warm_up();

    if let Some(core_ids) = core_affinity::get_core_ids() {
        if let Some(last) = core_ids.last() {
            if core_affinity::set_for_current(*last) {
                println!("Pinned to core {:?}", last);
            }
        }
    }

    // Pre-generate requests so RNG and allocation stay out of the
    // measured section. The mix alternates sides around a moving band so
    // a realistic fraction of orders cross.
    const BUFFER_SIZE: usize = 10_000;
    println!("Pre-generating {} requests...", BUFFER_SIZE);
    let mut requests = Vec::with_capacity(BUFFER_SIZE);
    for i in 0..BUFFER_SIZE as i64 {
        let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
        let price = (100 * PRICE_SCALE) + (i % 100) * (PRICE_SCALE / 100);
        requests.push(OrderRequest::new_order(
            symbol,
            side,
            OrderType::Limit,
            price,
            10,
            1,
        ));
    }

    // Train the branch predictor and fault in the ladder before measuring.
    println!("Warming up ({} ops)...", BUFFER_SIZE);
    for request in &requests {
        std::hint::black_box(engine.process_request(request));
    }

    println!("Running {} iterations...", iterations);
    let mut histogram = Histogram::<u64>::new_with_bounds(1, 100_000_000, 3)
        .expect("histogram bounds");
    let mut total = std::time::Duration::ZERO;

    let mut cursor = requests.iter().cycle();
    for _ in 0..iterations {
        let request = cursor.next().expect("cycle never ends");

        let start = Instant::now();
        std::hint::black_box(engine.process_request(request));
        let elapsed = start.elapsed();

        let _ = histogram.record(elapsed.as_nanos() as u64);
        total += elapsed;
    }

    println!("\n=== Tick-to-Order Latency (ns) ===");
    println!("Total Ops:  {}", iterations);
    println!(
        "Throughput: {:.2} ops/sec",
        iterations as f64 / total.as_secs_f64()
    );
    println!("----------------------------------");
    println!("Min:    {:8} ns", histogram.min());
    println!("P50:    {:8} ns", histogram.value_at_quantile(0.50));
    println!("P90:    {:8} ns", histogram.value_at_quantile(0.90));
    println!("P99:    {:8} ns", histogram.value_at_quantile(0.99));
    println!("P99.9:  {:8} ns", histogram.value_at_quantile(0.999));
    println!("P99.99: {:8} ns", histogram.value_at_quantile(0.9999));
    println!("Max:    {:8} ns", histogram.max());
    println!("----------------------------------");

    let stats = engine.stats();
    println!(
        "Engine: received={} matched={} cancelled={} rejected={} volume={}",
        stats.orders_received,
        stats.orders_matched,
        stats.orders_cancelled,
        stats.orders_rejected,
        stats.total_volume,
    );
}

/// End-to-end smoke scenarios. Exits non-zero on the first failure.
fn run_selftest() {
    let checks: [(&str, fn() -> bool); 6] = [
        ("basic cross", selftest_basic_cross),
        ("partial fill", selftest_partial_fill),
        ("price-time priority", selftest_price_time_priority),
        ("double cancel", selftest_double_cancel),
        ("best quote", selftest_best_quote),
        ("post-only rejection", selftest_post_only),
    ];

    let mut failed = 0;
    for (name, check) in checks {
        let ok = check();
        println!("[{}] {}", if ok { "PASS" } else { "FAIL" }, name);
        if !ok {
            failed += 1;
        }
    }

    if failed > 0 {
        eprintln!("{} scenario(s) failed", failed);
        std::process::exit(1);
    }
    println!("selftest ok");
}

fn fresh_engine() -> (MatchingEngine, Symbol) {
    let symbol = Symbol::new("TEST");
    let mut engine = MatchingEngine::with_book_capacity(10_000);
    engine.add_instrument(symbol);
    (engine, symbol)
}

fn selftest_basic_cross() -> bool {
    let (mut engine, symbol) = fresh_engine();
    let a = engine.submit_order(symbol, Side::Buy, OrderType::Limit, 100 * PRICE_SCALE, 10, 0);
    let b = engine.submit_order(symbol, Side::Sell, OrderType::Limit, 100 * PRICE_SCALE, 10, 0);
    let book = engine.get_book(symbol).expect("book");
    let stats = book.get_stats();

    a == 1 && b == 2 && book.is_empty() && stats.trades_matched == 1 && stats.volume_matched == 10
}

fn selftest_partial_fill() -> bool {
    let (mut engine, symbol) = fresh_engine();
    engine.submit_order(symbol, Side::Buy, OrderType::Limit, 100 * PRICE_SCALE, 100, 0);
    engine.submit_order(symbol, Side::Sell, OrderType::Limit, 99 * PRICE_SCALE, 30, 0);

    let depth = engine.get_book(symbol).expect("book").get_depth(1);
    depth.asks.is_empty()
        && depth.bids.len() == 1
        && depth.bids[0].price == 100 * PRICE_SCALE
        && depth.bids[0].quantity == 70
        && depth.bids[0].order_count == 1
}

fn selftest_price_time_priority() -> bool {
    let (mut engine, symbol) = fresh_engine();
    let first = engine.submit_order(symbol, Side::Buy, OrderType::Limit, 100 * PRICE_SCALE, 10, 0);
    let second = engine.submit_order(symbol, Side::Buy, OrderType::Limit, 100 * PRICE_SCALE, 10, 0);
    engine.submit_order(symbol, Side::Sell, OrderType::Limit, 99 * PRICE_SCALE, 15, 0);

    let book = engine.get_book(symbol).expect("book");
    let depth = book.get_depth(1);

    book.get_order(first).is_none()
        && book.get_order(second).map(|o| o.remaining_quantity()) == Some(5)
        && depth.bids[0].quantity == 5
        && depth.bids[0].order_count == 1
}

fn selftest_double_cancel() -> bool {
    let (mut engine, symbol) = fresh_engine();
    let id = engine.submit_order(symbol, Side::Buy, OrderType::Limit, 100 * PRICE_SCALE, 10, 0);
    engine.cancel_order(symbol, id) && !engine.cancel_order(symbol, id)
}

fn selftest_best_quote() -> bool {
    let (mut engine, symbol) = fresh_engine();
    engine.submit_order(symbol, Side::Buy, OrderType::Limit, 100 * PRICE_SCALE, 10, 0);
    engine.submit_order(symbol, Side::Sell, OrderType::Limit, 101 * PRICE_SCALE, 20, 0);

    match engine.get_quote(symbol) {
        Some(quote) => {
            quote.bid_price == 100 * PRICE_SCALE
                && quote.ask_price == 101 * PRICE_SCALE
                && quote.bid_quantity == 10
                && quote.ask_quantity == 20
                && quote.spread() == PRICE_SCALE
        }
        None => false,
    }
}

fn selftest_post_only() -> bool {
    let (mut engine, symbol) = fresh_engine();
    engine.submit_order(symbol, Side::Sell, OrderType::Limit, 101 * PRICE_SCALE, 10, 0);

    let kinds = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = std::sync::Arc::clone(&kinds);
    engine.set_execution_callback(move |report| sink.lock().unwrap().push(report.kind));

    let id = engine.submit_order(symbol, Side::Buy, OrderType::PostOnly, 101 * PRICE_SCALE, 5, 0);
    let last_kind = kinds.lock().unwrap().last().copied();

    let book = engine.get_book(symbol).expect("book");
    id == nanomatch::INVALID_ORDER_ID
        && last_kind == Some(ExecutionKind::Rejected)
        && book.order_count() == 1
        && book.best_bid().is_none()
}
