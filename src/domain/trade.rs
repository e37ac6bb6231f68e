// ============================================================================
// Trade Domain Model
// ============================================================================

use rust_decimal::Decimal;

use super::OrderId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Engine-issued trade identifier, monotonically issued starting at 1.
pub type TradeId = u64;

/// An execution between two orders. Immutable once produced.
///
/// The buy and sell order ids are assigned by side regardless of which order
/// was the aggressor. The price is always the resting order's level, so an
/// aggressive order whose limit is more favourable than the touch receives
/// price improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trade {
    pub trade_id: TradeId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub price: Decimal,
    pub quantity: u64,
    /// Execution time in monotonic nanoseconds. Advisory only.
    pub timestamp_ns: u64,
}

impl Trade {
    pub fn new(
        trade_id: TradeId,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        price: Decimal,
        quantity: u64,
        timestamp_ns: u64,
    ) -> Self {
        Self {
            trade_id,
            buy_order_id,
            sell_order_id,
            price,
            quantity,
            timestamp_ns,
        }
    }

    /// Notional value of the execution.
    pub fn notional_value(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_creation() {
        let trade = Trade::new(1, 10, 11, Decimal::from(100), 250, 42);

        assert_eq!(trade.trade_id, 1);
        assert_eq!(trade.buy_order_id, 10);
        assert_eq!(trade.sell_order_id, 11);
        assert_eq!(trade.quantity, 250);
        assert_eq!(trade.notional_value(), Decimal::from(25_000));
    }
}
