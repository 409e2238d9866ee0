//! Execution reports, the only output the core emits.
//!
//! Reports are plain values handed to the execution callback; observers
//! never see live book state.

use crate::clock::monotonic_ns;
use crate::order::Order;
use crate::types::{ExecutionKind, OrderId, OrderStatus, Price, Quantity, Side, Timestamp};

/// A single execution event from one order's perspective.
///
/// For trades, two reports are emitted per fill (aggressor first), each
/// carrying its own side and the counterparty's id.
#[derive(Clone, Copy, Debug)]
#[repr(align(64))]
pub struct ExecutionReport {
    /// Originating order.
    pub order_id: OrderId,

    /// Counterparty order; 0 for non-trade events.
    pub contra_order_id: OrderId,

    pub execution_price: Price,
    pub execution_quantity: Quantity,

    /// Side of the reported order.
    pub side: Side,

    pub kind: ExecutionKind,

    /// Status of the order after this event.
    pub order_status: OrderStatus,

    pub timestamp: Timestamp,
    pub client_id: u64,

    /// Quantity still open after this event.
    pub leaves_quantity: Quantity,

    /// Quantity filled so far, including this event.
    pub cumulative_quantity: Quantity,
}

impl ExecutionReport {
    /// Acknowledgment of a newly accepted order.
    pub fn new_order(order: &Order) -> Self {
        Self {
            order_id: order.order_id,
            contra_order_id: 0,
            execution_price: order.price,
            execution_quantity: 0,
            side: order.side,
            kind: ExecutionKind::New,
            order_status: OrderStatus::New,
            timestamp: monotonic_ns(),
            client_id: order.client_id,
            leaves_quantity: order.quantity,
            cumulative_quantity: 0,
        }
    }

    /// One side of a fill. `order` must already have the fill applied so
    /// that status and the leaves/cumulative quantities are consistent.
    pub fn trade(order: &Order, contra: &Order, price: Price, quantity: Quantity) -> Self {
        Self {
            order_id: order.order_id,
            contra_order_id: contra.order_id,
            execution_price: price,
            execution_quantity: quantity,
            side: order.side,
            kind: ExecutionKind::Trade,
            order_status: order.status,
            timestamp: monotonic_ns(),
            client_id: order.client_id,
            leaves_quantity: order.remaining_quantity(),
            cumulative_quantity: order.filled_quantity,
        }
    }

    /// Cancellation of the open remainder (explicit cancel, or the
    /// unfilled tail of a MARKET/IOC order).
    pub fn cancelled(order: &Order) -> Self {
        Self {
            order_id: order.order_id,
            contra_order_id: 0,
            execution_price: order.price,
            execution_quantity: 0,
            side: order.side,
            kind: ExecutionKind::Cancelled,
            order_status: OrderStatus::Cancelled,
            timestamp: monotonic_ns(),
            client_id: order.client_id,
            leaves_quantity: 0,
            cumulative_quantity: order.filled_quantity,
        }
    }

    /// Rejection (pool exhausted, POST_ONLY would cross, FOK unfillable).
    pub fn rejected(order: &Order) -> Self {
        Self {
            order_id: order.order_id,
            contra_order_id: 0,
            execution_price: order.price,
            execution_quantity: 0,
            side: order.side,
            kind: ExecutionKind::Rejected,
            order_status: OrderStatus::Rejected,
            timestamp: monotonic_ns(),
            client_id: order.client_id,
            leaves_quantity: 0,
            cumulative_quantity: order.filled_quantity,
        }
    }
}
