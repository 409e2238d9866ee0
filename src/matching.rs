//! The matching algorithm: strict price–time priority.
//!
//! An incoming (aggressor) order walks the opposite ladder from the best
//! price inward while it crosses, filling against each level's FIFO queue.
//! The resting side sets the execution price. Two TRADE reports are
//! emitted per fill, aggressor's perspective first.

use std::cmp::Reverse;

use crate::pool::{PoolIndex, NULL_INDEX};
use crate::report::ExecutionReport;
use crate::types::{OrderType, Price, Quantity, Side};
use crate::OrderBook;

impl OrderBook {
    /// Whether an order at `price` would trade against the opposite best.
    #[inline]
    pub(crate) fn would_cross(&self, side: Side, price: Price) -> bool {
        match side {
            Side::Buy => self.best_ask().is_some_and(|ask| price >= ask),
            Side::Sell => self.best_bid().is_some_and(|bid| price <= bid),
        }
    }

    /// FOK probe: can `quantity` be filled entirely at prices that cross
    /// `price`? Read-only; sums the level aggregates.
    pub(crate) fn can_fill_completely(
        &self,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> bool {
        let mut available: Quantity = 0;

        match side {
            Side::Buy => {
                for (&level_price, level) in &self.asks {
                    if level_price > price {
                        break;
                    }
                    available += level.total_quantity;
                    if available >= quantity {
                        return true;
                    }
                }
            }
            Side::Sell => {
                for (key, level) in &self.bids {
                    if key.0 < price {
                        break;
                    }
                    available += level.total_quantity;
                    if available >= quantity {
                        return true;
                    }
                }
            }
        }

        available >= quantity
    }

    /// Match an aggressor against the opposite side until it stops
    /// crossing or runs out of quantity.
    ///
    /// On entry the node is indexed but not linked into any level; on
    /// return any remainder is the caller's to rest or release.
    pub(crate) fn match_order(
        &mut self,
        aggressor: PoolIndex,
        on_exec: &mut impl FnMut(&ExecutionReport),
    ) {
        let (side, limit_price, is_market) = {
            let order = &self.pool.get(aggressor).order;
            (
                order.side,
                order.price,
                order.order_type == OrderType::Market,
            )
        };

        loop {
            if self.pool.get(aggressor).order.remaining_quantity() == 0 {
                break;
            }

            let Some(best_price) = (match side {
                Side::Buy => self.best_ask(),
                Side::Sell => self.best_bid(),
            }) else {
                break;
            };

            // MARKET crosses at any price.
            if !is_market {
                let crosses = match side {
                    Side::Buy => limit_price >= best_price,
                    Side::Sell => limit_price <= best_price,
                };
                if !crosses {
                    break;
                }
            }

            self.match_at_level(aggressor, side, best_price, on_exec);

            // Collapse the level if it was consumed.
            let emptied = self
                .level_mut(side.opposite(), best_price)
                .map_or(true, |level| level.is_empty());
            if emptied {
                match side {
                    Side::Buy => {
                        self.asks.remove(&best_price);
                    }
                    Side::Sell => {
                        self.bids.remove(&std::cmp::Reverse(best_price));
                    }
                }
            }
        }
    }

    /// Fill the aggressor against the FIFO queue at one opposite level.
    fn match_at_level(
        &mut self,
        aggressor: PoolIndex,
        aggressor_side: Side,
        price: Price,
        on_exec: &mut impl FnMut(&ExecutionReport),
    ) {
        loop {
            let remaining = self.pool.get(aggressor).order.remaining_quantity();
            if remaining == 0 {
                break;
            }

            let passive = match self.level_mut(aggressor_side.opposite(), price) {
                Some(level) if !level.is_empty() => level.front(),
                _ => break,
            };
            debug_assert!(passive != NULL_INDEX);

            let fill = remaining.min(self.pool.get(passive).order.remaining_quantity());
            debug_assert!(fill > 0);

            // The resting side sets the price; apply the fill to both.
            self.pool.get_mut(aggressor).order.fill(fill);
            self.pool.get_mut(passive).order.fill(fill);

            if let Some(level) = self.level_mut(aggressor_side.opposite(), price) {
                level.update_quantity(fill);
            }

            let aggressor_order = self.pool.get(aggressor).order;
            let passive_order = self.pool.get(passive).order;

            on_exec(&ExecutionReport::trade(
                &aggressor_order,
                &passive_order,
                price,
                fill,
            ));
            on_exec(&ExecutionReport::trade(
                &passive_order,
                &aggressor_order,
                price,
                fill,
            ));

            self.trades_matched += 1;
            self.volume_matched += fill;

            if passive_order.is_filled() {
                match aggressor_side.opposite() {
                    Side::Buy => {
                        if let Some(level) = self.bids.get_mut(&Reverse(price)) {
                            level.pop_front(&mut self.pool);
                        }
                    }
                    Side::Sell => {
                        if let Some(level) = self.asks.get_mut(&price) {
                            level.pop_front(&mut self.pool);
                        }
                    }
                }
                self.order_index.remove(&passive_order.order_id);
                self.pool.destroy(passive);
            }
        }
    }
}
