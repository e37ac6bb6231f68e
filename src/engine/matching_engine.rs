// ============================================================================
// Matching Engine
// Public contract and the readers-writer boundary around the book core
// ============================================================================

use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::domain::{
    EngineConfig, Order, OrderBookSnapshot, OrderId, OrderType, Side, Trade, REJECTED_ORDER_ID,
};
use crate::engine::book::Book;
use crate::interfaces::{EngineEvent, EventHandler};

/// Continuous price-time priority matching engine for a single instrument.
///
/// All mutable state lives behind one engine-wide readers-writer boundary:
/// mutations (`add_order`, `add_market_order`, `cancel_order`, `clear`) hold
/// the write guard for their whole duration, market-data reads hold the read
/// guard. Readers therefore always observe a book consistent with some
/// serialization of completed mutations and never a half-applied match.
///
/// The engine is intended to be driven by one logical writer and any number
/// of concurrent readers. Events are delivered to the [`EventHandler`] after
/// the guard is released.
pub struct MatchingEngine {
    config: EngineConfig,
    book: RwLock<Book>,
    event_handler: Arc<dyn EventHandler>,
}

impl MatchingEngine {
    /// Create an engine from a validated configuration.
    pub fn new(
        config: EngineConfig,
        event_handler: Arc<dyn EventHandler>,
    ) -> Result<Self, String> {
        config.validate()?;
        Ok(Self {
            config,
            book: RwLock::new(Book::new()),
            event_handler,
        })
    }

    /// Create an engine with a default configuration and no event handler.
    pub fn with_defaults(instrument: impl Into<String>) -> Self {
        Self {
            config: EngineConfig::new(instrument),
            book: RwLock::new(Book::new()),
            event_handler: Arc::new(crate::interfaces::NoOpEventHandler),
        }
    }

    pub fn instrument(&self) -> &str {
        &self.config.instrument
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Submit an order.
    ///
    /// The order is first matched against the opposite side of the book; a
    /// limit order's unfilled residual is then queued at its limit price,
    /// while a market order's residual is discarded.
    ///
    /// Returns the assigned order id, or [`REJECTED_ORDER_ID`] (`0`) if the
    /// parameters fail validation: zero quantity, negative price, a limit
    /// order with a non-positive price, or a configured tick/lot violation.
    /// On rejection the book is untouched and no id is consumed.
    pub fn add_order(
        &self,
        price: Decimal,
        quantity: u64,
        side: Side,
        order_type: OrderType,
    ) -> OrderId {
        if let Err(reason) = self.validate_submission(price, quantity, order_type) {
            return self.reject(reason);
        }

        let (order_id, trades, rested) = {
            let mut book = self.book.write();

            let order_id = book.issue_order_id();
            let Ok(mut order) = Order::new(order_id, price, quantity, side, order_type) else {
                // Parameters were validated above; construction cannot fail.
                return REJECTED_ORDER_ID;
            };

            let trades = book.match_incoming(&mut order);

            let mut rested = None;
            if order.order_type() == OrderType::Limit
                && order.remaining_qty() > 0
                && !order.status().is_terminal()
            {
                rested = Some((order.price(), order.remaining_qty()));
                book.insert(order);
            }

            (order_id, trades, rested)
        };

        tracing::trace!(order_id, trades = trades.len(), "order processed");
        self.publish_submission(order_id, side, order_type, &trades, rested);

        order_id
    }

    /// Convenience wrapper for a limit order.
    pub fn add_limit_order(&self, price: Decimal, quantity: u64, side: Side) -> OrderId {
        self.add_order(price, quantity, side, OrderType::Limit)
    }

    /// Submit a market order and return its trades in execution order.
    ///
    /// A zero quantity yields an empty list without consuming an order id.
    /// Any unfilled residual is discarded; market orders never rest.
    pub fn add_market_order(&self, quantity: u64, side: Side) -> Vec<Trade> {
        if quantity == 0 {
            return Vec::new();
        }
        if !self.config.quantity_on_lot(quantity) {
            self.reject("market order quantity not aligned to lot size".to_string());
            return Vec::new();
        }

        let (order_id, trades) = {
            let mut book = self.book.write();

            let order_id = book.issue_order_id();
            let Ok(mut order) =
                Order::new(order_id, Decimal::ZERO, quantity, side, OrderType::Market)
            else {
                return Vec::new();
            };

            let trades = book.match_incoming(&mut order);
            (order_id, trades)
        };

        tracing::trace!(order_id, trades = trades.len(), "market order processed");
        self.publish_submission(order_id, side, OrderType::Market, &trades, None);

        trades
    }

    /// Cancel a working order by id.
    ///
    /// Returns `true` if the order was found and removed from the book,
    /// `false` for an unknown id (including ids already filled, already
    /// cancelled, or forgotten by a [`clear`](Self::clear)).
    pub fn cancel_order(&self, order_id: OrderId) -> bool {
        let cancelled = self.book.write().cancel(order_id);

        match cancelled {
            Some(_) => {
                tracing::debug!(order_id, "order cancelled");
                self.event_handler.on_event(EngineEvent::OrderCancelled {
                    order_id,
                    timestamp: Utc::now(),
                });
                true
            },
            None => false,
        }
    }

    /// Remove every resting order and reset the trade and volume aggregates.
    ///
    /// Order and trade id issuance is not reset, so ids stay unique across
    /// the engine's lifetime. Holders of ids issued before the clear are not
    /// notified; cancelling such an id afterwards simply returns `false`.
    pub fn clear(&self) {
        self.book.write().clear();

        tracing::debug!("book cleared");
        self.event_handler.on_event(EngineEvent::BookCleared {
            timestamp: Utc::now(),
        });
    }

    // ========================================================================
    // Market Data
    // ========================================================================

    /// Best bid price, absent if no bids are resting.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.book.read().best_bid()
    }

    /// Best ask price, absent if no asks are resting.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.book.read().best_ask()
    }

    /// `best_ask - best_bid`, absent when either side is empty.
    pub fn spread(&self) -> Option<Decimal> {
        self.book.read().spread()
    }

    /// Midpoint of the touch, absent when either side is empty.
    pub fn mid_price(&self) -> Option<Decimal> {
        self.book.read().mid_price()
    }

    /// Aggregate bid quantity at the k-th best level (k = 0 is the touch);
    /// 0 past the last level.
    pub fn bid_depth_at_level(&self, level: usize) -> u64 {
        self.book.read().bid_depth_at(level)
    }

    /// Aggregate ask quantity at the k-th best level (k = 0 is the touch);
    /// 0 past the last level.
    pub fn ask_depth_at_level(&self, level: usize) -> u64 {
        self.book.read().ask_depth_at(level)
    }

    /// Number of distinct bid levels.
    pub fn bid_level_count(&self) -> usize {
        self.book.read().bid_level_count()
    }

    /// Number of distinct ask levels.
    pub fn ask_level_count(&self) -> usize {
        self.book.read().ask_level_count()
    }

    /// Number of working orders on the book.
    pub fn total_orders(&self) -> usize {
        self.book.read().total_orders()
    }

    /// Trades executed since construction or the last [`clear`](Self::clear).
    pub fn total_trades(&self) -> u64 {
        self.book.read().total_trades()
    }

    /// Shares traded since construction or the last [`clear`](Self::clear).
    pub fn total_volume(&self) -> u64 {
        self.book.read().total_volume()
    }

    /// Depth snapshot at the configured default depth.
    pub fn snapshot(&self) -> OrderBookSnapshot {
        self.snapshot_with_depth(self.config.snapshot_depth)
    }

    /// Depth snapshot with up to `depth` levels per side, taken under a
    /// single read guard.
    pub fn snapshot_with_depth(&self, depth: usize) -> OrderBookSnapshot {
        let book = self.book.read();
        OrderBookSnapshot::with_depth(
            self.config.instrument.clone(),
            book.bid_depth(depth),
            book.ask_depth(depth),
        )
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn validate_submission(
        &self,
        price: Decimal,
        quantity: u64,
        order_type: OrderType,
    ) -> Result<(), String> {
        if quantity == 0 {
            return Err("order quantity cannot be zero".to_string());
        }
        if price < Decimal::ZERO {
            return Err("order price cannot be negative".to_string());
        }
        if order_type == OrderType::Limit {
            if price <= Decimal::ZERO {
                return Err("limit order price must be positive".to_string());
            }
            if !self.config.price_on_tick(price) {
                return Err("limit order price not aligned to tick size".to_string());
            }
        }
        if !self.config.quantity_on_lot(quantity) {
            return Err("order quantity not aligned to lot size".to_string());
        }

        Ok(())
    }

    fn reject(&self, reason: String) -> OrderId {
        tracing::debug!(%reason, "order rejected");
        self.event_handler.on_event(EngineEvent::OrderRejected {
            reason,
            timestamp: Utc::now(),
        });
        REJECTED_ORDER_ID
    }

    fn publish_submission(
        &self,
        order_id: OrderId,
        side: Side,
        order_type: OrderType,
        trades: &[Trade],
        rested: Option<(Decimal, u64)>,
    ) {
        let mut events = Vec::with_capacity(2 + trades.len());

        events.push(EngineEvent::OrderAccepted {
            order_id,
            side,
            order_type,
            timestamp: Utc::now(),
        });
        for trade in trades {
            events.push(EngineEvent::TradeExecuted { trade: *trade });
        }
        if let Some((price, remaining_qty)) = rested {
            events.push(EngineEvent::OrderRested {
                order_id,
                price,
                remaining_qty,
                timestamp: Utc::now(),
            });
        }

        self.event_handler.on_events(events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::NoOpEventHandler;
    use parking_lot::Mutex;

    /// Captures every event for assertions.
    struct RecordingEventHandler {
        events: Mutex<Vec<EngineEvent>>,
    }

    impl RecordingEventHandler {
        fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }

        fn take(&self) -> Vec<EngineEvent> {
            let mut events = self.events.lock();
            std::mem::take(&mut *events)
        }
    }

    impl EventHandler for RecordingEventHandler {
        fn on_event(&self, event: EngineEvent) {
            self.events.lock().push(event);
        }
    }

    fn engine() -> MatchingEngine {
        MatchingEngine::with_defaults("ACME")
    }

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn test_price_priority_across_levels() {
        let engine = engine();
        engine.add_limit_order(dec(99), 100, Side::Buy);
        engine.add_limit_order(dec(100), 200, Side::Buy);
        engine.add_limit_order(dec(98), 300, Side::Buy);

        assert_eq!(engine.best_bid(), Some(dec(100)));
        assert_eq!(engine.bid_depth_at_level(0), 200);
        assert_eq!(engine.bid_depth_at_level(1), 100);
        assert_eq!(engine.bid_depth_at_level(2), 300);
        assert_eq!(engine.bid_level_count(), 3);
    }

    #[test]
    fn test_crossing_executes_at_resting_price() {
        let handler = Arc::new(RecordingEventHandler::new());
        let engine = MatchingEngine::new(EngineConfig::new("ACME"), handler.clone()).unwrap();

        engine.add_limit_order(dec(100), 200, Side::Sell);
        handler.take();

        let buyer = engine.add_limit_order(dec(101), 100, Side::Buy);
        assert!(buyer > 0);

        let events = handler.take();
        let trades: Vec<Trade> = events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::TradeExecuted { trade } => Some(*trade),
                _ => None,
            })
            .collect();

        // Price improvement: execution happens at the resting ask.
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, dec(100));
        assert_eq!(trades[0].quantity, 100);
        assert_eq!(trades[0].buy_order_id, buyer);

        assert_eq!(engine.total_volume(), 100);
        assert_eq!(engine.best_ask(), Some(dec(100)));
        assert_eq!(engine.ask_depth_at_level(0), 100);
        // The aggressor was fully filled and must not rest.
        assert_eq!(engine.best_bid(), None);
    }

    #[test]
    fn test_multi_level_sweep() {
        let engine = engine();
        engine.add_limit_order(dec(100), 100, Side::Buy);
        engine.add_limit_order(Decimal::new(995, 1), 200, Side::Buy);
        engine.add_limit_order(dec(99), 300, Side::Buy);

        engine.add_limit_order(dec(99), 250, Side::Sell);

        assert_eq!(engine.total_volume(), 250);
        assert_eq!(engine.total_trades(), 2);
        assert_eq!(engine.best_bid(), Some(Decimal::new(995, 1)));
        assert_eq!(engine.bid_depth_at_level(0), 50);
    }

    #[test]
    fn test_market_order_exhausts_liquidity() {
        let engine = engine();
        engine.add_limit_order(dec(100), 100, Side::Sell);
        engine.add_limit_order(dec(101), 100, Side::Sell);

        let trades = engine.add_market_order(300, Side::Buy);

        assert_eq!(trades.len(), 2);
        assert_eq!(trades.iter().map(|t| t.quantity).sum::<u64>(), 200);
        // Best price first, residual discarded.
        assert_eq!(trades[0].price, dec(100));
        assert_eq!(trades[1].price, dec(101));
        assert_eq!(engine.total_volume(), 200);
        assert_eq!(engine.best_ask(), None);
        assert_eq!(engine.total_orders(), 0);
    }

    #[test]
    fn test_cancel_partially_filled_order() {
        let engine = engine();
        let buyer = engine.add_limit_order(dec(100), 500, Side::Buy);

        engine.add_limit_order(dec(100), 200, Side::Sell);
        assert_eq!(engine.total_volume(), 200);
        assert_eq!(engine.bid_depth_at_level(0), 300);

        assert!(engine.cancel_order(buyer));
        assert_eq!(engine.best_bid(), None);
        assert_eq!(engine.total_volume(), 200);
    }

    #[test]
    fn test_rejection_sentinels() {
        let engine = engine();

        assert_eq!(engine.add_limit_order(dec(100), 0, Side::Buy), 0);
        assert_eq!(engine.add_limit_order(dec(-1), 100, Side::Buy), 0);
        assert_eq!(
            engine.add_order(Decimal::ZERO, 100, Side::Buy, OrderType::Limit),
            0
        );
        assert_eq!(engine.total_orders(), 0);
        assert_eq!(engine.best_bid(), None);

        assert!(!engine.cancel_order(99_999));
    }

    #[test]
    fn test_rejection_consumes_no_id() {
        let engine = engine();
        let first = engine.add_limit_order(dec(100), 100, Side::Buy);
        engine.add_limit_order(dec(100), 0, Side::Buy);
        let next = engine.add_limit_order(dec(101), 100, Side::Sell);
        assert_eq!(next, first + 1);
    }

    #[test]
    fn test_zero_quantity_market_order_consumes_no_id() {
        let engine = engine();
        let first = engine.add_limit_order(dec(100), 100, Side::Buy);

        assert!(engine.add_market_order(0, Side::Sell).is_empty());

        let next = engine.add_limit_order(dec(101), 100, Side::Sell);
        assert_eq!(next, first + 1);
    }

    #[test]
    fn test_non_crossing_limit_consumes_id_without_trading() {
        let engine = engine();
        engine.add_limit_order(dec(99), 100, Side::Buy);
        let seller = engine.add_limit_order(dec(101), 100, Side::Sell);

        assert!(seller > 0);
        assert_eq!(engine.total_trades(), 0);
        assert_eq!(engine.spread(), Some(dec(2)));
        assert_eq!(engine.total_orders(), 2);
    }

    #[test]
    fn test_add_then_cancel_round_trip() {
        let engine = engine();
        engine.add_limit_order(dec(99), 100, Side::Buy);
        engine.add_limit_order(dec(101), 100, Side::Sell);

        let id = engine.add_limit_order(dec(98), 250, Side::Buy);
        assert!(engine.cancel_order(id));

        assert_eq!(engine.best_bid(), Some(dec(99)));
        assert_eq!(engine.best_ask(), Some(dec(101)));
        assert_eq!(engine.total_orders(), 2);
        assert_eq!(engine.total_trades(), 0);
        assert_eq!(engine.total_volume(), 0);
        assert!(!engine.cancel_order(id));
    }

    #[test]
    fn test_equal_opposite_orders_annihilate() {
        let engine = engine();
        engine.add_limit_order(dec(100), 300, Side::Buy);
        engine.add_limit_order(dec(100), 300, Side::Sell);

        assert_eq!(engine.total_volume(), 300);
        assert_eq!(engine.best_bid(), None);
        assert_eq!(engine.best_ask(), None);
        assert_eq!(engine.total_orders(), 0);
        assert_eq!(engine.bid_level_count(), 0);
    }

    #[test]
    fn test_clear_resets_aggregates_not_ids() {
        let engine = engine();
        engine.add_limit_order(dec(100), 100, Side::Sell);
        let before = engine.add_limit_order(dec(100), 100, Side::Buy);
        assert_eq!(engine.total_volume(), 100);

        engine.clear();
        assert_eq!(engine.total_orders(), 0);
        assert_eq!(engine.total_trades(), 0);
        assert_eq!(engine.total_volume(), 0);

        let after = engine.add_limit_order(dec(100), 100, Side::Buy);
        assert_eq!(after, before + 1);
    }

    #[test]
    fn test_cancel_after_clear_returns_false() {
        let engine = engine();
        let id = engine.add_limit_order(dec(100), 100, Side::Buy);
        engine.clear();
        assert!(!engine.cancel_order(id));
    }

    #[test]
    fn test_tick_and_lot_enforcement() {
        let config = EngineConfig::new("ACME")
            .with_tick_size(Decimal::new(5, 2))
            .with_lot_size(100);
        let engine = MatchingEngine::new(config, Arc::new(NoOpEventHandler)).unwrap();

        // 100.03 is off the 0.05 grid.
        assert_eq!(
            engine.add_limit_order(Decimal::new(10003, 2), 100, Side::Buy),
            0
        );
        // 150 is not a whole number of 100-lots.
        assert_eq!(engine.add_limit_order(dec(100), 150, Side::Buy), 0);
        assert!(engine.add_market_order(150, Side::Buy).is_empty());

        assert!(engine.add_limit_order(Decimal::new(10005, 2), 200, Side::Buy) > 0);
    }

    #[test]
    fn test_event_stream_for_submission_lifecycle() {
        let handler = Arc::new(RecordingEventHandler::new());
        let engine = MatchingEngine::new(EngineConfig::new("ACME"), handler.clone()).unwrap();

        engine.add_limit_order(dec(100), 100, Side::Sell);
        let id = engine.add_limit_order(dec(100), 300, Side::Buy);
        engine.cancel_order(id);

        let events = handler.take();
        let labels: Vec<&str> = events
            .iter()
            .map(|e| match e {
                EngineEvent::OrderAccepted { .. } => "accepted",
                EngineEvent::OrderRejected { .. } => "rejected",
                EngineEvent::TradeExecuted { .. } => "trade",
                EngineEvent::OrderRested { .. } => "rested",
                EngineEvent::OrderCancelled { .. } => "cancelled",
                EngineEvent::BookCleared { .. } => "cleared",
            })
            .collect();

        assert_eq!(
            labels,
            vec![
                "accepted", "rested", // resting sell
                "accepted", "trade", "rested", // crossing buy, residual rests
                "cancelled",
            ]
        );
    }

    #[test]
    fn test_concurrent_readers_observe_consistent_book() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let engine = engine();
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            let engine = &engine;
            let done = &done;

            for _ in 0..2 {
                scope.spawn(move || {
                    while !done.load(Ordering::Acquire) {
                        if let (Some(bid), Some(ask)) = (engine.best_bid(), engine.best_ask()) {
                            assert!(bid < ask, "reader observed a crossed book");
                        }
                        let _ = engine.spread();
                        let _ = engine.total_orders();
                        let snapshot = engine.snapshot_with_depth(5);
                        assert!(snapshot.bids.len() <= 5);
                    }
                });
            }

            scope.spawn(move || {
                for i in 0..200i64 {
                    engine.add_limit_order(dec(100 - (i % 10)), 100, Side::Buy);
                    engine.add_limit_order(dec(101 + (i % 10)), 100, Side::Sell);
                }
                done.store(true, Ordering::Release);
            });
        });

        assert!(engine.total_orders() > 0);
    }
}
