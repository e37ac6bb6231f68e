// ============================================================================
// Event Handler Interface
// Lifecycle events emitted by the matching engine
// ============================================================================

use crate::domain::{OrderId, OrderType, Side, Trade};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Events reporting the outcome of engine mutations.
///
/// Handlers are invoked after the engine's write boundary is released, so an
/// implementation may do slow work without stalling the book.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EngineEvent {
    /// Submission passed validation and was assigned an id.
    OrderAccepted {
        order_id: OrderId,
        side: Side,
        order_type: OrderType,
        timestamp: DateTime<Utc>,
    },

    /// Submission failed validation; no id was assigned.
    OrderRejected {
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A match was executed.
    TradeExecuted { trade: Trade },

    /// A limit order's unfilled residual was queued on the book.
    OrderRested {
        order_id: OrderId,
        price: Decimal,
        remaining_qty: u64,
        timestamp: DateTime<Utc>,
    },

    /// A working order was cancelled and removed from the book.
    OrderCancelled {
        order_id: OrderId,
        timestamp: DateTime<Utc>,
    },

    /// The book was cleared.
    BookCleared { timestamp: DateTime<Utc> },
}

/// Sink for [`EngineEvent`]s. Implementations can log, publish market data,
/// feed a drop copy, etc.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: EngineEvent);

    /// Batch delivery; the default forwards one at a time.
    fn on_events(&self, events: Vec<EngineEvent>) {
        for event in events {
            self.on_event(event);
        }
    }
}

/// Discards all events. Useful for tests and benchmarks.
pub struct NoOpEventHandler;

impl EventHandler for NoOpEventHandler {
    fn on_event(&self, _event: EngineEvent) {}
}

/// Forwards every event to the `tracing` subscriber at debug level.
pub struct LoggingEventHandler;

impl EventHandler for LoggingEventHandler {
    fn on_event(&self, event: EngineEvent) {
        tracing::debug!(?event, "engine event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_handler_accepts_events() {
        let handler = NoOpEventHandler;
        handler.on_event(EngineEvent::BookCleared {
            timestamp: Utc::now(),
        });
        handler.on_events(vec![
            EngineEvent::OrderRejected {
                reason: "order quantity cannot be zero".to_string(),
                timestamp: Utc::now(),
            },
            EngineEvent::OrderCancelled {
                order_id: 1,
                timestamp: Utc::now(),
            },
        ]);
    }
}
