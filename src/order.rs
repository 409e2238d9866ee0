//! Order record and id generation.
//!
//! The order is laid out to fit one cache line with the matching-path
//! fields grouped at the front.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::clock::monotonic_ns;
use crate::types::{
    OrderId, OrderStatus, OrderType, Price, Quantity, Side, Timestamp, CACHE_LINE_SIZE,
};

/// A single order.
///
/// # Memory layout
///
/// Exactly 64 bytes (one cache line), `repr(C)` so the field order is the
/// declaration order:
///
/// | Field           | Type  | Size |
/// |-----------------|-------|------|
/// | order_id        | u64   | 8    |
/// | price           | i64   | 8    |
/// | quantity        | i64   | 8    |
/// | filled_quantity | i64   | 8    |
/// | side            | u8    | 1    |
/// | order_type      | u8    | 1    |
/// | status          | u8    | 1    |
/// | flags           | u8    | 1    |
/// | (padding)       | -     | 4    |
/// | entry_time      | i64   | 8    |
/// | update_time     | i64   | 8    |
/// | client_id       | u64   | 8    |
#[derive(Clone, Copy, Debug)]
#[repr(C, align(64))]
pub struct Order {
    /// Primary key.
    pub order_id: OrderId,

    /// Limit price (fixed-point). Sentinel-priced for MARKET orders.
    pub price: Price,

    /// Original quantity.
    pub quantity: Quantity,

    /// Quantity filled so far. Invariant: `0 <= filled_quantity <= quantity`.
    pub filled_quantity: Quantity,

    pub side: Side,
    pub order_type: OrderType,
    pub status: OrderStatus,

    /// Reserved.
    pub flags: u8,

    /// When the order was inserted into a book. Time priority is time of
    /// book insertion, not time of receipt.
    pub entry_time: Timestamp,

    /// Last mutation time (fill, cancel, reject).
    pub update_time: Timestamp,

    /// Opaque client tag echoed back in execution reports.
    pub client_id: u64,
}

const _: () = assert!(
    std::mem::size_of::<Order>() == CACHE_LINE_SIZE,
    "Order must be exactly one cache line"
);

impl Order {
    pub fn new(
        order_id: OrderId,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
        client_id: u64,
    ) -> Self {
        let now = monotonic_ns();
        Self {
            order_id,
            price,
            quantity,
            filled_quantity: 0,
            side,
            order_type,
            status: OrderStatus::New,
            flags: 0,
            entry_time: now,
            update_time: now,
            client_id,
        }
    }

    /// Quantity still open.
    #[inline]
    pub fn remaining_quantity(&self) -> Quantity {
        self.quantity - self.filled_quantity
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.filled_quantity >= self.quantity
    }

    /// Active orders are the only ones allowed to rest on a book.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.status, OrderStatus::New | OrderStatus::PartiallyFilled)
    }

    #[inline]
    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }

    /// Apply a fill and recompute status.
    #[inline]
    pub fn fill(&mut self, qty: Quantity) {
        debug_assert!(qty > 0 && qty <= self.remaining_quantity());
        self.filled_quantity += qty;
        self.update_time = monotonic_ns();
        self.status = if self.is_filled() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
    }

    #[inline]
    pub fn cancel(&mut self) {
        self.status = OrderStatus::Cancelled;
        self.update_time = monotonic_ns();
    }

    #[inline]
    pub fn reject(&mut self) {
        self.status = OrderStatus::Rejected;
        self.update_time = monotonic_ns();
    }
}

/// Monotonic order id source. Starts at 1 so that 0 stays the invalid
/// sentinel. Atomic so producers outside the engine thread can peek.
#[derive(Debug)]
pub struct OrderIdGenerator {
    next_id: AtomicU64,
}

impl OrderIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(start: OrderId) -> Self {
        Self {
            next_id: AtomicU64::new(start),
        }
    }

    #[inline]
    pub fn next(&self) -> OrderId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn current(&self) -> OrderId {
        self.next_id.load(Ordering::Relaxed)
    }
}

impl Default for OrderIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
