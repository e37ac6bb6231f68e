// ============================================================================
// Order Book Domain Model
// Price levels, per-side ladders, and depth snapshots
// ============================================================================

use rust_decimal::Decimal;
use std::collections::{BTreeMap, VecDeque};

use super::{Order, OrderId, Side};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Price Level
// ============================================================================

/// FIFO queue of working orders sharing one price.
///
/// The front of the queue is the oldest order; time priority is enforced by
/// consuming from the front and appending to the back. `total_quantity` is
/// the cached sum of remaining quantity over the queue and is kept in step
/// with every mutation.
#[derive(Debug)]
pub struct PriceLevel {
    price: Decimal,
    orders: VecDeque<Order>,
    total_quantity: u64,
}

impl PriceLevel {
    pub fn new(price: Decimal) -> Self {
        Self {
            price,
            orders: VecDeque::new(),
            total_quantity: 0,
        }
    }

    /// Append an order to the back of the queue.
    pub fn add(&mut self, order: Order) {
        self.total_quantity += order.remaining_qty();
        self.orders.push_back(order);
    }

    /// Remove the first order with the given id, preserving the relative
    /// order of the rest. Returns the removed order, or `None` if the id is
    /// not queued here.
    ///
    /// Linear in the level size; cancels are rare relative to adds.
    pub fn remove(&mut self, order_id: OrderId) -> Option<Order> {
        let idx = self.orders.iter().position(|o| o.id() == order_id)?;
        let order = self.orders.remove(idx)?;
        self.total_quantity -= order.remaining_qty();
        Some(order)
    }

    /// Peek at the oldest order.
    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    pub fn front_mut(&mut self) -> Option<&mut Order> {
        self.orders.front_mut()
    }

    /// Remove and return the oldest order.
    pub fn pop_front(&mut self) -> Option<Order> {
        let order = self.orders.pop_front()?;
        self.total_quantity -= order.remaining_qty();
        Some(order)
    }

    /// Adjust the cached aggregate after a queued order was filled in place.
    pub fn update_quantity(&mut self, old_remaining: u64, new_remaining: u64) {
        if old_remaining >= new_remaining {
            self.total_quantity -= old_remaining - new_remaining;
        } else {
            self.total_quantity += new_remaining - old_remaining;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn total_quantity(&self) -> u64 {
        self.total_quantity
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Iterate the queued orders from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }
}

// ============================================================================
// Book Side
// ============================================================================

/// One side of the book: a price-keyed ladder of [`PriceLevel`]s.
///
/// Levels are held in a `BTreeMap`, so lookup, insert, and erase by price are
/// logarithmic in the number of distinct levels and iteration is ordered.
/// "Best" is the highest key for bids and the lowest key for asks. Levels are
/// created on demand and removed as soon as they drain.
#[derive(Debug)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<Decimal, PriceLevel>,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of distinct price levels.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// The best price on this side, if any.
    pub fn best_price(&self) -> Option<Decimal> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    /// Queue a resting order at its limit price, creating the level if absent.
    pub fn add_order(&mut self, order: Order) {
        let price = order.price();
        self.levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
            .add(order);
    }

    /// Remove an order by id from the level at `price`, dropping the level if
    /// it drains. Returns the removed order if it was found.
    pub fn remove_order(&mut self, price: Decimal, order_id: OrderId) -> Option<Order> {
        let level = self.levels.get_mut(&price)?;
        let removed = level.remove(order_id);
        if level.is_empty() {
            self.levels.remove(&price);
        }
        removed
    }

    pub(crate) fn level_mut(&mut self, price: Decimal) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    pub(crate) fn remove_level(&mut self, price: Decimal) {
        self.levels.remove(&price);
    }

    /// Aggregate quantity at the k-th best level; 0 past the last level.
    pub fn depth_at(&self, level: usize) -> u64 {
        self.levels()
            .nth(level)
            .map(PriceLevel::total_quantity)
            .unwrap_or(0)
    }

    /// Best-to-worst `(price, quantity)` pairs, at most `max_levels` of them.
    pub fn depth(&self, max_levels: usize) -> Vec<(Decimal, u64)> {
        self.levels()
            .take(max_levels)
            .map(|l| (l.price(), l.total_quantity()))
            .collect()
    }

    /// Total number of orders queued across all levels.
    pub fn order_count(&self) -> usize {
        self.levels.values().map(PriceLevel::order_count).sum()
    }

    /// Iterate the levels from best to worst.
    pub fn levels(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match self.side {
            Side::Buy => Box::new(self.levels.values().rev()),
            Side::Sell => Box::new(self.levels.values()),
        }
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }
}

// ============================================================================
// Order Book Snapshot
// ============================================================================

/// Immutable snapshot of the book's depth, taken under a single read guard.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderBookSnapshot {
    pub instrument: String,
    /// Bid levels, best first: `(price, quantity)`.
    pub bids: Vec<(Decimal, u64)>,
    /// Ask levels, best first: `(price, quantity)`.
    pub asks: Vec<(Decimal, u64)>,
    /// `best_ask - best_bid`, absent when either side is empty.
    pub spread: Option<Decimal>,
    /// Midpoint of the touch, absent when either side is empty.
    pub mid_price: Option<Decimal>,
}

impl OrderBookSnapshot {
    pub fn with_depth(
        instrument: String,
        bids: Vec<(Decimal, u64)>,
        asks: Vec<(Decimal, u64)>,
    ) -> Self {
        let touch = match (bids.first(), asks.first()) {
            (Some((bid, _)), Some((ask, _))) => Some((*bid, *ask)),
            _ => None,
        };

        Self {
            instrument,
            bids,
            asks,
            spread: touch.map(|(bid, ask)| ask - bid),
            mid_price: touch.map(|(bid, ask)| (bid + ask) / Decimal::from(2)),
        }
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|(price, _)| *price)
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|(price, _)| *price)
    }

    pub fn total_bid_quantity(&self) -> u64 {
        self.bids.iter().map(|(_, qty)| qty).sum()
    }

    pub fn total_ask_quantity(&self) -> u64 {
        self.asks.iter().map(|(_, qty)| qty).sum()
    }
}
