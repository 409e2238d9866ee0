//! Randomized differential test that compares the book against a naive but
//! obviously-correct reference implementation over long operation
//! sequences.

use std::collections::{BTreeMap, HashMap};

use nanomatch::{Order, OrderBook, OrderType, Price, Quantity, Side, Symbol};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Naive reference book: sorted maps of FIFO vectors, linear matching.
struct ReferenceBook {
    bids: BTreeMap<Price, Vec<(u64, Quantity)>>, // price -> [(order_id, remaining)]
    asks: BTreeMap<Price, Vec<(u64, Quantity)>>,
    orders: HashMap<u64, (Side, Price)>,
}

impl ReferenceBook {
    fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            orders: HashMap::new(),
        }
    }

    fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }

    fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    /// Place a limit order; returns the traded quantity.
    fn place(&mut self, order_id: u64, side: Side, price: Price, mut qty: Quantity) -> Quantity {
        let mut traded = 0;

        match side {
            Side::Buy => {
                let mut consumed = Vec::new();
                for (&ask_price, queue) in self.asks.iter_mut() {
                    if ask_price > price || qty == 0 {
                        break;
                    }
                    while !queue.is_empty() && qty > 0 {
                        let fill = queue[0].1.min(qty);
                        queue[0].1 -= fill;
                        qty -= fill;
                        traded += fill;
                        if queue[0].1 == 0 {
                            let (maker, _) = queue.remove(0);
                            self.orders.remove(&maker);
                        }
                    }
                    if queue.is_empty() {
                        consumed.push(ask_price);
                    }
                }
                for p in consumed {
                    self.asks.remove(&p);
                }
                if qty > 0 {
                    self.bids.entry(price).or_default().push((order_id, qty));
                    self.orders.insert(order_id, (Side::Buy, price));
                }
            }
            Side::Sell => {
                let mut consumed = Vec::new();
                let prices: Vec<_> = self.bids.keys().rev().copied().collect();
                for bid_price in prices {
                    if bid_price < price || qty == 0 {
                        break;
                    }
                    let queue = self.bids.get_mut(&bid_price).unwrap();
                    while !queue.is_empty() && qty > 0 {
                        let fill = queue[0].1.min(qty);
                        queue[0].1 -= fill;
                        qty -= fill;
                        traded += fill;
                        if queue[0].1 == 0 {
                            let (maker, _) = queue.remove(0);
                            self.orders.remove(&maker);
                        }
                    }
                    if queue.is_empty() {
                        consumed.push(bid_price);
                    }
                }
                for p in consumed {
                    self.bids.remove(&p);
                }
                if qty > 0 {
                    self.asks.entry(price).or_default().push((order_id, qty));
                    self.orders.insert(order_id, (Side::Sell, price));
                }
            }
        }

        traded
    }

    fn cancel(&mut self, order_id: u64) -> bool {
        if let Some((side, price)) = self.orders.remove(&order_id) {
            let book = match side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            if let Some(queue) = book.get_mut(&price) {
                queue.retain(|(id, _)| *id != order_id);
                if queue.is_empty() {
                    book.remove(&price);
                }
            }
            true
        } else {
            false
        }
    }

    fn order_count(&self) -> usize {
        self.orders.len()
    }
}

fn random_order(rng: &mut ChaCha8Rng, order_id: u64) -> Order {
    let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
    Order::new(
        order_id,
        side,
        OrderType::Limit,
        rng.gen_range(9_800..10_200) * 100,
        rng.gen_range(1..200),
        rng.gen_range(1..100),
    )
}

#[test]
fn test_fuzz_best_prices() {
    const SEED: u64 = 0xFEED_FACE;
    const OPS: usize = 10_000;

    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let mut book = OrderBook::new(Symbol::new("FUZZ"), 100_000);
    let mut reference = ReferenceBook::new();

    let mut next_order_id = 1u64;
    let mut active: Vec<u64> = Vec::new();

    for i in 0..OPS {
        if active.is_empty() || rng.gen_bool(0.7) {
            let order = random_order(&mut rng, next_order_id);
            next_order_id += 1;

            book.add_order(order, |_| {});
            reference.place(order.order_id, order.side, order.price, order.quantity);
            active.push(order.order_id);
        } else {
            let idx = rng.gen_range(0..active.len());
            let order_id = active.swap_remove(idx);

            let a = book.cancel_order(order_id, |_| {});
            let b = reference.cancel(order_id);
            assert_eq!(a, b, "cancel outcome mismatch at op {}", i);
        }

        assert_eq!(
            book.best_bid(),
            reference.best_bid(),
            "best bid mismatch at op {}",
            i
        );
        assert_eq!(
            book.best_ask(),
            reference.best_ask(),
            "best ask mismatch at op {}",
            i
        );
    }
}

#[test]
fn test_fuzz_order_count_and_depth() {
    const SEED: u64 = 0xBAD_C0DE;
    const OPS: usize = 5_000;

    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let mut book = OrderBook::new(Symbol::new("FUZZ"), 100_000);
    let mut reference = ReferenceBook::new();

    let mut next_order_id = 1u64;
    let mut active: Vec<u64> = Vec::new();

    for i in 0..OPS {
        if active.is_empty() || rng.gen_bool(0.6) {
            let order = random_order(&mut rng, next_order_id);
            next_order_id += 1;

            book.add_order(order, |_| {});
            reference.place(order.order_id, order.side, order.price, order.quantity);

            if book.get_order(order.order_id).is_some() {
                active.push(order.order_id);
            }
        } else {
            let idx = rng.gen_range(0..active.len());
            let order_id = active.swap_remove(idx);
            book.cancel_order(order_id, |_| {});
            reference.cancel(order_id);
        }

        if i % 100 == 0 {
            assert_eq!(
                book.order_count(),
                reference.order_count(),
                "order count mismatch at op {}",
                i
            );

            // Per-level aggregates must agree at the top of each side.
            let depth = book.get_depth(1);
            if let Some(top) = depth.bids.first() {
                let queue = &reference.bids[&top.price];
                assert_eq!(top.order_count as usize, queue.len());
                assert_eq!(top.quantity, queue.iter().map(|(_, q)| q).sum::<i64>());
            }
            if let Some(top) = depth.asks.first() {
                let queue = &reference.asks[&top.price];
                assert_eq!(top.order_count as usize, queue.len());
                assert_eq!(top.quantity, queue.iter().map(|(_, q)| q).sum::<i64>());
            }
        }
    }

    assert_eq!(book.order_count(), reference.order_count());
}

#[test]
fn test_fuzz_trade_volume() {
    const SEED: u64 = 0x1234_5678;
    const OPS: u64 = 5_000;

    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let mut book = OrderBook::new(Symbol::new("FUZZ"), 100_000);
    let mut reference = ReferenceBook::new();

    let mut reference_traded: Quantity = 0;

    for i in 1..=OPS {
        let order = random_order(&mut rng, i);
        book.add_order(order, |_| {});
        reference_traded += reference.place(order.order_id, order.side, order.price, order.quantity);
    }

    let stats = book.get_stats();
    assert_eq!(
        stats.volume_matched, reference_traded,
        "total traded volume diverged from reference"
    );
}
