//! # nanomatch
//!
//! A single-venue limit order matching engine with nanosecond latency
//! measurement.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: one thread owns each order book exclusively (no locks)
//! - **Price-Time Priority**: ordered ladders, FIFO queues within a level
//! - **Deterministic Allocation**: order nodes come from a fixed-capacity pool
//! - **Cache-Optimized**: 64-byte aligned orders, 32-bit node handles
//!
//! ## Architecture
//!
//! ```text
//! [Producer Thread] --> [SPSC Ring Buffer] --> [Engine Thread (pinnable)]
//!                                                      |
//!                                            [Execution Reports]
//! ```

pub mod async_engine;
pub mod clock;
pub mod engine;
pub mod matching;
pub mod order;
pub mod order_book;
pub mod pool;
pub mod price_level;
pub mod report;
pub mod spsc;
pub mod types;

// Re-exports for convenience
pub use async_engine::AsyncEngine;
pub use engine::{EngineStats, MatchingEngine, OrderRequest, RequestKind};
pub use order::{Order, OrderIdGenerator};
pub use order_book::{BookStats, Depth, DepthLevel, OrderBook};
pub use pool::{OrderNode, OrderPool, PoolIndex, NULL_INDEX};
pub use price_level::PriceLevel;
pub use report::ExecutionReport;
pub use types::{
    ExecutionKind, OrderId, OrderStatus, OrderType, Price, Quantity, Quote, Side, Symbol,
    Timestamp, INVALID_ORDER_ID, PRICE_SCALE,
};
