// ============================================================================
// Domain Models Module
// Core entities and value objects of the order book
// ============================================================================

pub mod config;
pub mod order;
pub mod order_book;
pub mod trade;

pub use config::EngineConfig;
pub use order::{
    Order, OrderError, OrderId, OrderResult, OrderStatus, OrderType, Side, REJECTED_ORDER_ID,
};
pub use order_book::{BookSide, OrderBookSnapshot, PriceLevel};
pub use trade::{Trade, TradeId};
