//! Order book: the central per-instrument limit order book.
//!
//! Two ordered price ladders (bids iterated descending, asks ascending),
//! an order-id index for O(1) cancellation, and a node pool backing all
//! resident orders. Matching lives in the `matching` module; this module
//! owns the data structure and the non-matching operations.
//!
//! Thread-safety: none. Exactly one thread may touch a book at a time;
//! cross-thread access goes through the async engine's request queue.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::clock::monotonic_ns;
use crate::order::Order;
use crate::pool::{OrderPool, PoolIndex};
use crate::price_level::PriceLevel;
use crate::report::ExecutionReport;
use crate::types::{OrderId, OrderType, Price, Quantity, Quote, Side, Symbol};

/// One aggregated ladder entry in a depth snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthLevel {
    pub price: Price,
    pub quantity: Quantity,
    pub order_count: u32,
}

/// Top-N aggregate view of both sides, in priority order.
#[derive(Clone, Debug, Default)]
pub struct Depth {
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}

/// Counters and aggregates for one book.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BookStats {
    pub bid_levels: usize,
    pub ask_levels: usize,
    pub total_orders: usize,
    pub total_bid_quantity: Quantity,
    pub total_ask_quantity: Quantity,
    pub trades_matched: u64,
    pub volume_matched: Quantity,
}

/// Limit order book for a single instrument.
pub struct OrderBook {
    symbol: Symbol,

    /// Bid ladder. `Reverse` keys make the first iteration position the
    /// highest bid.
    pub(crate) bids: BTreeMap<Reverse<Price>, PriceLevel>,

    /// Ask ladder; first iteration position is the lowest ask.
    pub(crate) asks: BTreeMap<Price, PriceLevel>,

    /// OrderId -> pool index, for O(1) cancel/modify lookup.
    pub(crate) order_index: FxHashMap<OrderId, PoolIndex>,

    /// Backing storage for every resident order node.
    pub(crate) pool: OrderPool,

    /// Fills executed on this book.
    pub(crate) trades_matched: u64,

    /// Quantity traded on this book.
    pub(crate) volume_matched: Quantity,
}

impl OrderBook {
    /// Create a book that can hold up to `capacity` resting orders.
    pub fn new(symbol: Symbol, capacity: u32) -> Self {
        Self {
            symbol,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            order_index: FxHashMap::with_capacity_and_hasher(capacity as usize, Default::default()),
            pool: OrderPool::new(capacity),
            trades_matched: 0,
            volume_matched: 0,
        }
    }

    // ========================================================================
    // Order entry
    // ========================================================================

    /// Accept an order: emit `NEW`, match it, then rest or release it.
    ///
    /// Returns `false` when the order is rejected (pool exhausted,
    /// POST_ONLY would cross, FOK unfillable); a `REJECTED` report is
    /// emitted in each of those cases and the book is left unchanged.
    pub fn add_order(
        &mut self,
        order: Order,
        mut on_exec: impl FnMut(&ExecutionReport),
    ) -> bool {
        let Some(index) = self.pool.create(order) else {
            let mut rejected = order;
            rejected.reject();
            on_exec(&ExecutionReport::rejected(&rejected));
            return false;
        };

        debug_assert!(!self.order_index.contains_key(&order.order_id));
        self.order_index.insert(order.order_id, index);

        on_exec(&ExecutionReport::new_order(&order));

        match order.order_type {
            OrderType::PostOnly => {
                // Must rest: reject instead of trading through the book.
                if self.would_cross(order.side, order.price) {
                    return self.release_rejected(index, &mut on_exec);
                }
            }
            OrderType::Fok => {
                if !self.can_fill_completely(order.side, order.price, order.quantity) {
                    return self.release_rejected(index, &mut on_exec);
                }
                self.match_order(index, &mut on_exec);
            }
            _ => {
                self.match_order(index, &mut on_exec);
            }
        }

        let node = self.pool.get(index);
        let remaining = node.order.remaining_quantity();
        let order_type = node.order.order_type;

        if remaining > 0 {
            match order_type {
                OrderType::Market | OrderType::Ioc => {
                    // Never rests: cancel the unfilled remainder.
                    let node = self.pool.get_mut(index);
                    node.order.cancel();
                    let cancelled = node.order;
                    self.order_index.remove(&cancelled.order_id);
                    self.pool.destroy(index);
                    on_exec(&ExecutionReport::cancelled(&cancelled));
                }
                _ => {
                    // Time priority starts at book insertion.
                    let node = self.pool.get_mut(index);
                    node.order.entry_time = monotonic_ns();
                    self.insert_into_ladder(index);
                }
            }
        } else {
            self.order_index.remove(&order.order_id);
            self.pool.destroy(index);
        }

        true
    }

    /// Cancel a resting order. Returns `false` (and emits nothing) when
    /// the id is unknown.
    pub fn cancel_order(
        &mut self,
        order_id: OrderId,
        mut on_exec: impl FnMut(&ExecutionReport),
    ) -> bool {
        let Some(&index) = self.order_index.get(&order_id) else {
            return false;
        };

        let node = self.pool.get_mut(index);
        node.order.cancel();
        let order = node.order;

        on_exec(&ExecutionReport::cancelled(&order));

        self.unlink_from_ladder(index, order.side, order.price);
        self.order_index.remove(&order_id);
        self.pool.destroy(index);

        true
    }

    /// Modify a resting order.
    ///
    /// Shrinking at the same price mutates in place and emits no report;
    /// queue priority is kept. Any price change or size-up is a silent
    /// cancel followed by a fresh submission under the same id, which by
    /// definition forfeits priority.
    pub fn modify_order(
        &mut self,
        order_id: OrderId,
        new_price: Price,
        new_quantity: Quantity,
        on_exec: impl FnMut(&ExecutionReport),
    ) -> bool {
        let Some(&index) = self.order_index.get(&order_id) else {
            return false;
        };

        let order = self.pool.get(index).order;

        if new_price == order.price && new_quantity < order.remaining_quantity() {
            let delta = order.remaining_quantity() - new_quantity;

            let node = self.pool.get_mut(index);
            node.order.quantity = node.order.filled_quantity + new_quantity;
            node.order.update_time = monotonic_ns();

            if let Some(level) = self.level_mut(order.side, order.price) {
                level.update_quantity(delta);
            }
            return true;
        }

        // Cancel-and-replace: the old node leaves without a report.
        self.unlink_from_ladder(index, order.side, order.price);
        self.order_index.remove(&order_id);
        self.pool.destroy(index);

        let replacement = Order::new(
            order_id,
            order.side,
            order.order_type,
            new_price,
            new_quantity,
            order.client_id,
        );
        self.add_order(replacement, on_exec)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Snapshot copy of an order; never a live reference.
    #[inline]
    pub fn get_order(&self, order_id: OrderId) -> Option<Order> {
        self.order_index
            .get(&order_id)
            .map(|&index| self.pool.get(index).order)
    }

    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next().map(|r| r.0)
    }

    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    #[inline]
    pub fn spread(&self) -> Option<Price> {
        Some(self.best_ask()? - self.best_bid()?)
    }

    #[inline]
    pub fn mid_price(&self) -> Option<Price> {
        Some((self.best_ask()? + self.best_bid()?) / 2)
    }

    /// Top-of-book quote; present only when both sides are populated.
    pub fn get_quote(&self) -> Option<Quote> {
        let (&Reverse(bid_price), bid_level) = self.bids.iter().next()?;
        let (&ask_price, ask_level) = self.asks.iter().next()?;

        Some(Quote {
            bid_price,
            ask_price,
            bid_quantity: bid_level.total_quantity,
            ask_quantity: ask_level.total_quantity,
            timestamp: monotonic_ns(),
        })
    }

    /// Up to `levels` aggregate entries per side, in priority order.
    pub fn get_depth(&self, levels: usize) -> Depth {
        let mut depth = Depth {
            bids: Vec::with_capacity(levels.min(self.bids.len())),
            asks: Vec::with_capacity(levels.min(self.asks.len())),
        };

        for (&Reverse(price), level) in self.bids.iter().take(levels) {
            depth.bids.push(DepthLevel {
                price,
                quantity: level.total_quantity,
                order_count: level.order_count,
            });
        }
        for (&price, level) in self.asks.iter().take(levels) {
            depth.asks.push(DepthLevel {
                price,
                quantity: level.total_quantity,
                order_count: level.order_count,
            });
        }

        depth
    }

    pub fn get_stats(&self) -> BookStats {
        BookStats {
            bid_levels: self.bids.len(),
            ask_levels: self.asks.len(),
            total_orders: self.order_index.len(),
            total_bid_quantity: self.bids.values().map(|l| l.total_quantity).sum(),
            total_ask_quantity: self.asks.values().map(|l| l.total_quantity).sum(),
            trades_matched: self.trades_matched,
            volume_matched: self.volume_matched,
        }
    }

    #[inline]
    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    #[inline]
    pub fn order_count(&self) -> usize {
        self.order_index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order_index.is_empty()
    }

    /// Number of free pool slots left.
    #[inline]
    pub fn available_capacity(&self) -> u32 {
        self.pool.available()
    }

    /// Destroy every resting order and empty both sides. Counters are
    /// kept; they are cumulative for the life of the book.
    pub fn clear(&mut self) {
        for (_, index) in self.order_index.drain() {
            self.pool.destroy(index);
        }
        self.bids.clear();
        self.asks.clear();
    }

    /// Pre-fault the pool pages.
    pub fn warm_up(&mut self) {
        self.pool.warm_up();
    }

    // ========================================================================
    // Ladder plumbing
    // ========================================================================

    #[inline]
    pub(crate) fn level_mut(&mut self, side: Side, price: Price) -> Option<&mut PriceLevel> {
        match side {
            Side::Buy => self.bids.get_mut(&Reverse(price)),
            Side::Sell => self.asks.get_mut(&price),
        }
    }

    /// Rest a node at the tail of its price level, creating the level if
    /// absent.
    pub(crate) fn insert_into_ladder(&mut self, index: PoolIndex) {
        let (side, price) = {
            let order = &self.pool.get(index).order;
            (order.side, order.price)
        };
        let level = match side {
            Side::Buy => self.bids.entry(Reverse(price)).or_default(),
            Side::Sell => self.asks.entry(price).or_default(),
        };
        level.push_back(&mut self.pool, index);
    }

    /// Unlink a node from its level, collapsing the level if it empties.
    pub(crate) fn unlink_from_ladder(&mut self, index: PoolIndex, side: Side, price: Price) {
        match side {
            Side::Buy => {
                if let Some(level) = self.bids.get_mut(&Reverse(price)) {
                    if level.remove(&mut self.pool, index) {
                        self.bids.remove(&Reverse(price));
                    }
                }
            }
            Side::Sell => {
                if let Some(level) = self.asks.get_mut(&price) {
                    if level.remove(&mut self.pool, index) {
                        self.asks.remove(&price);
                    }
                }
            }
        }
    }

    /// Free a node that was indexed but must not rest, reporting the
    /// rejection. Always returns `false`.
    fn release_rejected(
        &mut self,
        index: PoolIndex,
        on_exec: &mut impl FnMut(&ExecutionReport),
    ) -> bool {
        let node = self.pool.get_mut(index);
        node.order.reject();
        let rejected = node.order;

        self.order_index.remove(&rejected.order_id);
        self.pool.destroy(index);

        on_exec(&ExecutionReport::rejected(&rejected));
        false
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("symbol", &self.symbol)
            .field("best_bid", &self.best_bid())
            .field("best_ask", &self.best_ask())
            .field("bid_levels", &self.bids.len())
            .field("ask_levels", &self.asks.len())
            .field("order_count", &self.order_index.len())
            .finish()
    }
}
