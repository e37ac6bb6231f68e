// ============================================================================
// Limit Order Book Engine Library
// Single-instrument matching engine with continuous price-time priority
// ============================================================================

//! # lob-engine
//!
//! An in-memory limit order book matching engine for a single tradable
//! instrument.
//!
//! ## Features
//!
//! - **Price-time priority**: dual price-ordered ladders with FIFO queues at
//!   each level; better prices match first, earlier arrivals first within a
//!   price.
//! - **Limit and market orders**: limit residuals rest on the book, market
//!   residuals are discarded.
//! - **Price improvement**: trades always execute at the resting order's
//!   price.
//! - **Concurrent market data**: one writer mutates the book under an
//!   exclusive boundary while any number of readers take consistent
//!   top-of-book and depth snapshots.
//! - **Lifecycle events**: accepted / rejected / executed / rested /
//!   cancelled notifications through a pluggable handler.
//!
//! ## Example
//!
//! ```rust
//! use lob_engine::prelude::*;
//! use rust_decimal::Decimal;
//!
//! let engine = MatchingEngine::with_defaults("ACME");
//!
//! // Rest a seller, then cross it with a more aggressive buyer.
//! engine.add_limit_order(Decimal::from(100), 200, Side::Sell);
//! engine.add_limit_order(Decimal::from(101), 100, Side::Buy);
//!
//! // The buyer got price improvement: execution at the resting ask.
//! assert_eq!(engine.total_volume(), 100);
//! assert_eq!(engine.best_ask(), Some(Decimal::from(100)));
//! assert_eq!(engine.ask_depth_at_level(0), 100);
//! ```

pub mod domain;
pub mod engine;
pub mod interfaces;
pub mod utils;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::{
        BookSide, EngineConfig, Order, OrderBookSnapshot, OrderError, OrderId, OrderStatus,
        OrderType, PriceLevel, Side, Trade, TradeId, REJECTED_ORDER_ID,
    };
    pub use crate::engine::MatchingEngine;
    pub use crate::interfaces::{
        EngineEvent, EventHandler, LoggingEventHandler, NoOpEventHandler,
    };
}

#[cfg(test)]
mod integration_tests {
    use super::prelude::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_end_to_end_session() {
        let engine = MatchingEngine::with_defaults("ACME");

        // Seed both sides.
        engine.add_limit_order(Decimal::from(100), 500, Side::Buy);
        let mid_bid = engine.add_limit_order(Decimal::new(995, 1), 300, Side::Buy);
        engine.add_limit_order(Decimal::from(99), 200, Side::Buy);
        engine.add_limit_order(Decimal::from(101), 400, Side::Sell);
        engine.add_limit_order(Decimal::new(1015, 1), 250, Side::Sell);

        assert_eq!(engine.total_orders(), 5);
        assert_eq!(engine.spread(), Some(Decimal::from(1)));

        // A crossing buy sweeps the best ask level.
        engine.add_limit_order(Decimal::new(10125, 2), 250, Side::Buy);
        assert_eq!(engine.total_volume(), 250);
        assert_eq!(engine.ask_depth_at_level(0), 150);

        // A market sell hits the best bid.
        let trades = engine.add_market_order(150, Side::Sell);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, Decimal::from(100));
        assert_eq!(engine.bid_depth_at_level(0), 350);

        // Cancel the middle bid and confirm the ladder closes up.
        assert!(engine.cancel_order(mid_bid));
        assert_eq!(engine.bid_depth_at_level(1), 200);

        assert_eq!(engine.total_trades(), 2);
        assert_eq!(engine.total_volume(), 400);
    }

    #[test]
    fn test_trade_ids_strictly_increase_across_clear() {
        let engine = MatchingEngine::with_defaults("ACME");

        engine.add_limit_order(Decimal::from(100), 100, Side::Sell);
        let first = engine.add_market_order(100, Side::Buy);

        engine.clear();

        engine.add_limit_order(Decimal::from(100), 100, Side::Sell);
        let second = engine.add_market_order(100, Side::Buy);

        assert!(second[0].trade_id > first[0].trade_id);
    }

    #[test]
    fn test_volume_matches_trade_quantities() {
        let engine = MatchingEngine::with_defaults("ACME");

        engine.add_limit_order(Decimal::from(100), 500, Side::Sell);
        engine.add_limit_order(Decimal::from(99), 300, Side::Sell);

        let mut executed = 0;
        executed += engine
            .add_market_order(200, Side::Buy)
            .iter()
            .map(|t| t.quantity)
            .sum::<u64>();
        executed += engine
            .add_market_order(400, Side::Buy)
            .iter()
            .map(|t| t.quantity)
            .sum::<u64>();

        assert_eq!(engine.total_volume(), executed);
        assert_eq!(executed, 600);
    }

    #[test]
    fn test_snapshot_is_ordered_best_to_worst() {
        let engine = MatchingEngine::with_defaults("ACME");

        for (price, qty) in [(100, 200u64), (99, 300), (98, 400)] {
            engine.add_limit_order(Decimal::from(price), qty, Side::Buy);
        }
        for (price, qty) in [(101, 150u64), (102, 250)] {
            engine.add_limit_order(Decimal::from(price), qty, Side::Sell);
        }

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.instrument, "ACME");
        assert_eq!(
            snapshot.bids,
            vec![
                (Decimal::from(100), 200),
                (Decimal::from(99), 300),
                (Decimal::from(98), 400),
            ]
        );
        assert_eq!(
            snapshot.asks,
            vec![(Decimal::from(101), 150), (Decimal::from(102), 250)]
        );
        assert_eq!(snapshot.spread, Some(Decimal::from(1)));
        assert_eq!(snapshot.total_bid_quantity(), 900);
    }
}
