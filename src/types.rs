//! Core type definitions: fixed-point prices, identifiers, and enums.
//!
//! Everything on the matching path is integer arithmetic. Prices are
//! fixed-point with 8 decimal places; a display price of 1.0 is 10^8.

use std::fmt;

/// Nanoseconds from a monotonic epoch.
pub type Timestamp = i64;

/// Duration in nanoseconds.
pub type Duration = i64;

/// External order identifier. `0` is reserved as the invalid sentinel.
pub type OrderId = u64;

/// Fixed-point price: `actual_price * 1e8`.
pub type Price = i64;

/// Trading quantity. Signed so that position deltas outside the core
/// can reuse the type; trading paths only ever see positive values.
pub type Quantity = i64;

/// Sentinel for "no order" / rejected submission.
pub const INVALID_ORDER_ID: OrderId = 0;

/// Fixed-point scale: 8 decimal places of price precision.
pub const PRICE_SCALE: i64 = 100_000_000;

/// One cache line, for alignment annotations.
pub const CACHE_LINE_SIZE: usize = 64;

/// Convert a display price to fixed-point. Display-layer only; the
/// matching path never touches floating point.
#[inline]
pub fn price_from_f64(price: f64) -> Price {
    (price * PRICE_SCALE as f64) as Price
}

/// Convert a fixed-point price back to a display price.
#[inline]
pub fn price_to_f64(price: Price) -> f64 {
    price as f64 / PRICE_SCALE as f64
}

// ============================================================================
// Symbol
// ============================================================================

/// Fixed-width 16-byte ASCII instrument identifier, zero-padded.
///
/// `Copy` and exactly 16 bytes so requests and reports stay flat
/// (no heap strings on the hot path).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Symbol([u8; 16]);

impl Symbol {
    /// Build a symbol from a string, truncating to 15 bytes so the
    /// buffer always keeps a trailing zero.
    pub fn new(s: &str) -> Self {
        let mut buf = [0u8; 16];
        let len = s.len().min(buf.len() - 1);
        buf[..len].copy_from_slice(&s.as_bytes()[..len]);
        Symbol(buf)
    }

    /// View the symbol as a string slice, stopping at the first zero byte.
    pub fn as_str(&self) -> &str {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(self.0.len());
        std::str::from_utf8(&self.0[..end]).unwrap_or("")
    }

    /// Raw padded bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

// ============================================================================
// Side
// ============================================================================

/// Order side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl Side {
    /// Returns the opposite side.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

// ============================================================================
// Order type
// ============================================================================

/// Order type determines matching-time behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum OrderType {
    /// Rests in the book if not fully matched (default).
    #[default]
    Limit = 0,
    /// Crosses at any price; the unfilled remainder is cancelled.
    Market = 1,
    /// Limit order held until a stop price triggers. Carried for wire
    /// compatibility; trigger engines live outside the core.
    StopLimit = 2,
    /// Immediate-Or-Cancel: fill what crosses, cancel the rest.
    Ioc = 3,
    /// Fill-Or-Kill: all-or-nothing immediate execution.
    Fok = 4,
    /// Must rest; rejected if it would cross.
    PostOnly = 5,
}

impl OrderType {
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderType::Limit => "LIMIT",
            OrderType::Market => "MARKET",
            OrderType::StopLimit => "STOP_LIMIT",
            OrderType::Ioc => "IOC",
            OrderType::Fok => "FOK",
            OrderType::PostOnly => "POST_ONLY",
        }
    }
}

// ============================================================================
// Order status
// ============================================================================

/// Lifecycle status of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum OrderStatus {
    New = 0,
    PartiallyFilled = 1,
    Filled = 2,
    Cancelled = 3,
    Rejected = 4,
    Expired = 5,
}

impl OrderStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Expired => "EXPIRED",
        }
    }
}

// ============================================================================
// Execution kind
// ============================================================================

/// Kind of event an execution report describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ExecutionKind {
    New = 0,
    Trade = 1,
    Cancelled = 2,
    Replaced = 3,
    Rejected = 4,
}

// ============================================================================
// Quote
// ============================================================================

/// Top-of-book snapshot. Present only when both sides are populated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(align(64))]
pub struct Quote {
    pub bid_price: Price,
    pub ask_price: Price,
    pub bid_quantity: Quantity,
    pub ask_quantity: Quantity,
    pub timestamp: Timestamp,
}

impl Quote {
    #[inline]
    pub fn spread(&self) -> Price {
        self.ask_price - self.bid_price
    }

    #[inline]
    pub fn mid_price(&self) -> Price {
        (self.bid_price + self.ask_price) / 2
    }
}
