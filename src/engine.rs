//! Matching engine facade: routes requests to per-symbol books.
//!
//! Owns the book registry, assigns order ids, fans execution reports out
//! through a single callback, and keeps cumulative statistics including
//! tick-to-order latency aggregates.
//!
//! Single-threaded on the hot path; cross-thread submission goes through
//! the async wrapper's request queue.

use rustc_hash::FxHashMap;

use crate::clock::monotonic_ns;
use crate::order::{Order, OrderIdGenerator};
use crate::order_book::OrderBook;
use crate::report::ExecutionReport;
use crate::types::{
    Duration, OrderId, OrderType, Price, Quantity, Quote, Side, Symbol, Timestamp,
    INVALID_ORDER_ID,
};

/// Default per-book pool capacity.
pub const DEFAULT_BOOK_CAPACITY: u32 = 1_000_000;

/// What a request asks the engine to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestKind {
    NewOrder = 0,
    CancelOrder = 1,
    ModifyOrder = 2,
}

/// A typed order request, the unit that flows through the SPSC queue.
#[derive(Clone, Copy, Debug)]
pub struct OrderRequest {
    pub kind: RequestKind,
    pub symbol: Symbol,
    /// Target id for CANCEL/MODIFY; ignored for NEW (the engine assigns).
    pub order_id: OrderId,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Price,
    pub quantity: Quantity,
    pub client_id: u64,
    pub timestamp: Timestamp,
}

impl OrderRequest {
    pub fn new_order(
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
        client_id: u64,
    ) -> Self {
        Self {
            kind: RequestKind::NewOrder,
            symbol,
            order_id: INVALID_ORDER_ID,
            side,
            order_type,
            price,
            quantity,
            client_id,
            timestamp: monotonic_ns(),
        }
    }

    pub fn cancel(symbol: Symbol, order_id: OrderId) -> Self {
        Self {
            kind: RequestKind::CancelOrder,
            symbol,
            order_id,
            side: Side::Buy,
            order_type: OrderType::Limit,
            price: 0,
            quantity: 0,
            client_id: 0,
            timestamp: monotonic_ns(),
        }
    }

    pub fn modify(symbol: Symbol, order_id: OrderId, new_price: Price, new_quantity: Quantity) -> Self {
        Self {
            kind: RequestKind::ModifyOrder,
            symbol,
            order_id,
            side: Side::Buy,
            order_type: OrderType::Limit,
            price: new_price,
            quantity: new_quantity,
            client_id: 0,
            timestamp: monotonic_ns(),
        }
    }
}

/// Cumulative engine counters and latency aggregates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineStats {
    pub orders_received: u64,
    /// Executed fills (one per match, not per report).
    pub orders_matched: u64,
    pub orders_cancelled: u64,
    pub orders_rejected: u64,
    pub total_volume: Quantity,
    pub total_latency_ns: Duration,
    pub min_latency_ns: Duration,
    pub max_latency_ns: Duration,
}

impl Default for EngineStats {
    fn default() -> Self {
        Self {
            orders_received: 0,
            orders_matched: 0,
            orders_cancelled: 0,
            orders_rejected: 0,
            total_volume: 0,
            total_latency_ns: 0,
            min_latency_ns: Duration::MAX,
            max_latency_ns: 0,
        }
    }
}

impl EngineStats {
    /// Mean accepted-order latency, or 0 before any acceptance.
    pub fn avg_latency_ns(&self) -> Duration {
        let accepted = self
            .orders_received
            .saturating_sub(self.orders_rejected);
        if accepted == 0 {
            0
        } else {
            self.total_latency_ns / accepted as i64
        }
    }
}

type Callback = Box<dyn FnMut(&ExecutionReport) + Send>;

/// Multi-instrument matching engine.
pub struct MatchingEngine {
    books: FxHashMap<Symbol, OrderBook>,
    id_generator: OrderIdGenerator,
    callback: Option<Callback>,
    stats: EngineStats,
    book_capacity: u32,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self::with_book_capacity(DEFAULT_BOOK_CAPACITY)
    }

    /// Engine whose books each hold up to `book_capacity` resting orders.
    pub fn with_book_capacity(book_capacity: u32) -> Self {
        Self {
            books: FxHashMap::default(),
            id_generator: OrderIdGenerator::new(),
            callback: None,
            stats: EngineStats::default(),
            book_capacity,
        }
    }

    /// Register a fresh book. Returns `false` if the symbol already has one.
    pub fn add_instrument(&mut self, symbol: Symbol) -> bool {
        if self.books.contains_key(&symbol) {
            return false;
        }
        self.books
            .insert(symbol, OrderBook::new(symbol, self.book_capacity));
        true
    }

    /// Submit a new order.
    ///
    /// Returns the assigned id, or [`INVALID_ORDER_ID`] when the symbol is
    /// unknown or the book rejects the order. Latency aggregates cover
    /// accepted orders only.
    pub fn submit_order(
        &mut self,
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
        client_id: u64,
    ) -> OrderId {
        let start = monotonic_ns();

        let Self {
            books,
            id_generator,
            callback,
            stats,
            ..
        } = self;

        stats.orders_received += 1;

        let Some(book) = books.get_mut(&symbol) else {
            stats.orders_rejected += 1;
            return INVALID_ORDER_ID;
        };

        let order_id = id_generator.next();
        let order = Order::new(order_id, side, order_type, price, quantity, client_id);

        let trades_before = book.trades_matched;
        let volume_before = book.volume_matched;

        let accepted = match callback.as_mut() {
            Some(cb) => book.add_order(order, |report| cb(report)),
            None => book.add_order(order, |_| {}),
        };

        stats.orders_matched += book.trades_matched - trades_before;
        stats.total_volume += book.volume_matched - volume_before;

        if !accepted {
            stats.orders_rejected += 1;
            return INVALID_ORDER_ID;
        }

        let latency = monotonic_ns() - start;
        stats.total_latency_ns += latency;
        stats.min_latency_ns = stats.min_latency_ns.min(latency);
        stats.max_latency_ns = stats.max_latency_ns.max(latency);

        order_id
    }

    /// Cancel an order. `false` when the symbol or id is unknown.
    pub fn cancel_order(&mut self, symbol: Symbol, order_id: OrderId) -> bool {
        let Self {
            books,
            callback,
            stats,
            ..
        } = self;

        let Some(book) = books.get_mut(&symbol) else {
            return false;
        };

        let cancelled = match callback.as_mut() {
            Some(cb) => book.cancel_order(order_id, |report| cb(report)),
            None => book.cancel_order(order_id, |_| {}),
        };

        if cancelled {
            stats.orders_cancelled += 1;
        }
        cancelled
    }

    /// Modify an order. `false` when the symbol or id is unknown.
    pub fn modify_order(
        &mut self,
        symbol: Symbol,
        order_id: OrderId,
        new_price: Price,
        new_quantity: Quantity,
    ) -> bool {
        let Self {
            books,
            callback,
            stats,
            ..
        } = self;

        let Some(book) = books.get_mut(&symbol) else {
            return false;
        };

        let trades_before = book.trades_matched;
        let volume_before = book.volume_matched;

        let modified = match callback.as_mut() {
            Some(cb) => book.modify_order(order_id, new_price, new_quantity, |report| cb(report)),
            None => book.modify_order(order_id, new_price, new_quantity, |_| {}),
        };

        stats.orders_matched += book.trades_matched - trades_before;
        stats.total_volume += book.volume_matched - volume_before;

        if modified {
            stats.orders_cancelled += 1;
        }
        modified
    }

    /// Dispatch a queued request. Returns the id the operation applied to,
    /// or [`INVALID_ORDER_ID`] on failure.
    pub fn process_request(&mut self, request: &OrderRequest) -> OrderId {
        match request.kind {
            RequestKind::NewOrder => self.submit_order(
                request.symbol,
                request.side,
                request.order_type,
                request.price,
                request.quantity,
                request.client_id,
            ),
            RequestKind::CancelOrder => {
                if self.cancel_order(request.symbol, request.order_id) {
                    request.order_id
                } else {
                    INVALID_ORDER_ID
                }
            }
            RequestKind::ModifyOrder => {
                if self.modify_order(
                    request.symbol,
                    request.order_id,
                    request.price,
                    request.quantity,
                ) {
                    request.order_id
                } else {
                    INVALID_ORDER_ID
                }
            }
        }
    }

    #[inline]
    pub fn get_book(&self, symbol: Symbol) -> Option<&OrderBook> {
        self.books.get(&symbol)
    }

    #[inline]
    pub fn get_book_mut(&mut self, symbol: Symbol) -> Option<&mut OrderBook> {
        self.books.get_mut(&symbol)
    }

    pub fn get_quote(&self, symbol: Symbol) -> Option<Quote> {
        self.books.get(&symbol)?.get_quote()
    }

    /// Registered symbols, in no particular order.
    pub fn instruments(&self) -> Vec<Symbol> {
        self.books.keys().copied().collect()
    }

    /// Install the execution callback. Reports from all books flow through
    /// it synchronously on the engine thread; it must not reenter the
    /// engine.
    pub fn set_execution_callback(
        &mut self,
        callback: impl FnMut(&ExecutionReport) + Send + 'static,
    ) {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_execution_callback(&mut self) {
        self.callback = None;
    }

    #[inline]
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = EngineStats::default();
    }

    /// Empty every book.
    pub fn clear(&mut self) {
        for book in self.books.values_mut() {
            book.clear();
        }
    }

    /// Pre-fault every book's pool pages.
    pub fn warm_up(&mut self) {
        for book in self.books.values_mut() {
            book.warm_up();
        }
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MatchingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchingEngine")
            .field("instruments", &self.books.len())
            .field("stats", &self.stats)
            .finish()
    }
}
