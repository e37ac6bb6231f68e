// ============================================================================
// Book Core
// Ladders, order index, counters, and the matching walk. Not synchronized;
// the engine wraps one of these in its readers-writer boundary.
// ============================================================================

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::domain::{
    BookSide, Order, OrderId, PriceLevel, Side, Trade, TradeId,
};
use crate::utils::monotonic_ns;

/// Where a working order rests: its side and its level's price.
///
/// The level queue owns the order itself; the index only needs enough to find
/// it again for a cancel.
#[derive(Debug, Clone, Copy)]
struct OrderLocator {
    side: Side,
    price: Decimal,
}

/// The mutable heart of the engine: both ladders, the id index, and the
/// monotonic counters.
///
/// Every order id in `orders` refers to exactly one queued entry on the side
/// and price named by its locator; both are inserted and removed together.
#[derive(Debug)]
pub(crate) struct Book {
    bids: BookSide,
    asks: BookSide,
    orders: HashMap<OrderId, OrderLocator>,
    next_order_id: OrderId,
    next_trade_id: TradeId,
    total_trades: u64,
    total_volume: u64,
}

impl Book {
    pub(crate) fn new() -> Self {
        Self {
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
            orders: HashMap::new(),
            next_order_id: 1,
            next_trade_id: 1,
            total_trades: 0,
            total_volume: 0,
        }
    }

    /// Take the next order id. Ids count up across the engine's whole
    /// lifetime, including across [`clear`](Self::clear).
    pub(crate) fn issue_order_id(&mut self) -> OrderId {
        let id = self.next_order_id;
        self.next_order_id += 1;
        id
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Match an incoming order against the opposite ladder, walking levels
    /// from the best price while the order still crosses. Returns the trades
    /// in execution order and updates the trade/volume counters.
    ///
    /// Any residual is left in `incoming` for the caller to rest or discard.
    pub(crate) fn match_incoming(&mut self, incoming: &mut Order) -> Vec<Trade> {
        let mut trades = Vec::new();

        let Book {
            bids,
            asks,
            orders,
            next_trade_id,
            total_trades,
            total_volume,
            ..
        } = self;

        let opposite = match incoming.side() {
            Side::Buy => asks,
            Side::Sell => bids,
        };

        while incoming.remaining_qty() > 0 {
            let Some(best_price) = opposite.best_price() else {
                break;
            };
            if !incoming.crosses(best_price) {
                break;
            }

            let Some(level) = opposite.level_mut(best_price) else {
                break;
            };
            match_at_level(incoming, level, best_price, orders, next_trade_id, &mut trades);

            if level.is_empty() {
                opposite.remove_level(best_price);
            }
        }

        *total_trades += trades.len() as u64;
        *total_volume += trades.iter().map(|t| t.quantity).sum::<u64>();

        trades
    }

    /// Rest a limit order's residual on its own side and register it in the
    /// id index.
    pub(crate) fn insert(&mut self, order: Order) {
        let locator = OrderLocator {
            side: order.side(),
            price: order.price(),
        };
        self.orders.insert(order.id(), locator);

        match locator.side {
            Side::Buy => self.bids.add_order(order),
            Side::Sell => self.asks.add_order(order),
        }
    }

    /// Cancel a working order: mark it cancelled and unlink it from both its
    /// level and the index. Returns the removed order, or `None` for an
    /// unknown id.
    pub(crate) fn cancel(&mut self, order_id: OrderId) -> Option<Order> {
        let locator = self.orders.remove(&order_id)?;

        let side = match locator.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };

        let mut order = side.remove_order(locator.price, order_id)?;
        order.cancel();
        Some(order)
    }

    /// Drop all levels and index entries and reset the trade/volume
    /// aggregates. Id issuance is not reset.
    pub(crate) fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.orders.clear();
        self.total_trades = 0;
        self.total_volume = 0;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub(crate) fn best_bid(&self) -> Option<Decimal> {
        self.bids.best_price()
    }

    pub(crate) fn best_ask(&self) -> Option<Decimal> {
        self.asks.best_price()
    }

    pub(crate) fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    pub(crate) fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::from(2)),
            _ => None,
        }
    }

    pub(crate) fn bid_depth_at(&self, level: usize) -> u64 {
        self.bids.depth_at(level)
    }

    pub(crate) fn ask_depth_at(&self, level: usize) -> u64 {
        self.asks.depth_at(level)
    }

    pub(crate) fn bid_level_count(&self) -> usize {
        self.bids.level_count()
    }

    pub(crate) fn ask_level_count(&self) -> usize {
        self.asks.level_count()
    }

    pub(crate) fn bid_depth(&self, max_levels: usize) -> Vec<(Decimal, u64)> {
        self.bids.depth(max_levels)
    }

    pub(crate) fn ask_depth(&self, max_levels: usize) -> Vec<(Decimal, u64)> {
        self.asks.depth(max_levels)
    }

    /// Number of working orders, i.e. the index size.
    pub(crate) fn total_orders(&self) -> usize {
        self.orders.len()
    }

    pub(crate) fn total_trades(&self) -> u64 {
        self.total_trades
    }

    pub(crate) fn total_volume(&self) -> u64 {
        self.total_volume
    }
}

/// Consume the front of `level` until the incoming order is satisfied or the
/// level drains. Fully filled resting orders leave both the queue and the
/// index; partially filled ones stay at the front with the level aggregate
/// adjusted in place.
fn match_at_level(
    incoming: &mut Order,
    level: &mut PriceLevel,
    trade_price: Decimal,
    index: &mut HashMap<OrderId, OrderLocator>,
    next_trade_id: &mut TradeId,
    trades: &mut Vec<Trade>,
) {
    while incoming.remaining_qty() > 0 {
        let (trade, old_remaining, new_remaining, resting_done, resting_id) = {
            let Some(resting) = level.front_mut() else {
                break;
            };

            let trade_qty = incoming.remaining_qty().min(resting.remaining_qty());
            let (buy_order_id, sell_order_id) = match incoming.side() {
                Side::Buy => (incoming.id(), resting.id()),
                Side::Sell => (resting.id(), incoming.id()),
            };
            let trade = Trade::new(
                *next_trade_id,
                buy_order_id,
                sell_order_id,
                trade_price,
                trade_qty,
                monotonic_ns(),
            );
            *next_trade_id += 1;

            let old_remaining = resting.remaining_qty();
            incoming
                .fill(trade_qty)
                .expect("trade quantity bounded by incoming remaining");
            resting
                .fill(trade_qty)
                .expect("trade quantity bounded by resting remaining");

            (
                trade,
                old_remaining,
                resting.remaining_qty(),
                resting.is_fully_filled(),
                resting.id(),
            )
        };

        level.update_quantity(old_remaining, new_remaining);
        trades.push(trade);

        if resting_done {
            level.pop_front();
            index.remove(&resting_id);
        }
    }
}
