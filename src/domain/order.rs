// ============================================================================
// Order Domain Model
// ============================================================================

use crate::utils::monotonic_ns;
use rust_decimal::Decimal;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Objects
// ============================================================================

/// Engine-issued order identifier.
///
/// Ids are issued monotonically starting at 1. The value `0` is never issued
/// and is returned by [`MatchingEngine::add_order`](crate::engine::MatchingEngine::add_order)
/// to signal a rejected submission.
pub type OrderId = u64;

/// The [`OrderId`] value returned for rejected submissions.
pub const REJECTED_ORDER_ID: OrderId = 0;

/// Order side: Buy or Sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side an incoming order matches against.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Market orders execute at any price and never rest on the book.
/// Limit orders carry a worst acceptable price and rest if not fully filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OrderType {
    Market,
    Limit,
}

/// Lifecycle state of an order.
///
/// Transitions are irreversible:
///
/// ```text
/// New -> PartiallyFilled -> Filled
/// New -> Filled
/// New | PartiallyFilled -> Cancelled
/// ```
///
/// `Filled` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors surfaced by [`Order`] construction and fills.
///
/// The engine boundary filters invalid submissions before an `Order` is ever
/// constructed, so outside of direct `Order` use these only arise from an
/// internal invariant breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderError {
    /// Quantity was zero at construction.
    ZeroQuantity,
    /// Price was negative at construction.
    NegativePrice,
    /// A limit order was constructed with a non-positive price.
    NonPositiveLimitPrice,
    /// A fill would push `filled_qty` past the order quantity.
    Overfill { remaining: u64, requested: u64 },
    /// A fill was attempted on a filled or cancelled order.
    TerminalState(OrderStatus),
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderError::ZeroQuantity => write!(f, "order quantity cannot be zero"),
            OrderError::NegativePrice => write!(f, "order price cannot be negative"),
            OrderError::NonPositiveLimitPrice => {
                write!(f, "limit order price must be positive")
            },
            OrderError::Overfill {
                remaining,
                requested,
            } => write!(
                f,
                "cannot fill {} with only {} remaining",
                requested, remaining
            ),
            OrderError::TerminalState(status) => {
                write!(f, "cannot fill order in terminal state {:?}", status)
            },
        }
    }
}

impl std::error::Error for OrderError {}

/// Result type alias for order operations.
pub type OrderResult<T> = Result<T, OrderError>;

// ============================================================================
// Order Entity
// ============================================================================

/// A single order working its way through the engine.
///
/// Fields are private so that `filled_qty <= quantity` and the status
/// transition rules hold at every observable point. A working order is owned
/// by exactly one price level queue; the engine's id index refers to it by
/// side and price.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Order {
    id: OrderId,
    timestamp_ns: u64,
    price: Decimal,
    quantity: u64,
    filled_qty: u64,
    side: Side,
    order_type: OrderType,
    status: OrderStatus,
}

impl Order {
    /// Construct a new order with status [`OrderStatus::New`].
    ///
    /// Market orders carry a price of zero, which is not used for matching.
    ///
    /// # Errors
    /// - [`OrderError::ZeroQuantity`] if `quantity == 0`
    /// - [`OrderError::NegativePrice`] if `price < 0`
    /// - [`OrderError::NonPositiveLimitPrice`] for a limit order with `price <= 0`
    pub fn new(
        id: OrderId,
        price: Decimal,
        quantity: u64,
        side: Side,
        order_type: OrderType,
    ) -> OrderResult<Self> {
        if quantity == 0 {
            return Err(OrderError::ZeroQuantity);
        }
        if price < Decimal::ZERO {
            return Err(OrderError::NegativePrice);
        }
        if order_type == OrderType::Limit && price <= Decimal::ZERO {
            return Err(OrderError::NonPositiveLimitPrice);
        }

        Ok(Self {
            id,
            timestamp_ns: monotonic_ns(),
            price,
            quantity,
            filled_qty: 0,
            side,
            order_type,
            status: OrderStatus::New,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Original quantity; immutable for the order's lifetime.
    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn filled_qty(&self) -> u64 {
        self.filled_qty
    }

    pub fn remaining_qty(&self) -> u64 {
        self.quantity - self.filled_qty
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    pub fn is_fully_filled(&self) -> bool {
        self.filled_qty == self.quantity
    }

    // ========================================================================
    // State Management
    // ========================================================================

    /// Record an execution of `qty` against this order.
    ///
    /// A zero `qty` is a no-op. On success the status moves to
    /// [`OrderStatus::Filled`] when the order is exhausted, otherwise to
    /// [`OrderStatus::PartiallyFilled`].
    ///
    /// # Errors
    /// - [`OrderError::Overfill`] if `qty` exceeds the remaining quantity
    /// - [`OrderError::TerminalState`] if the order is already filled or cancelled
    pub fn fill(&mut self, qty: u64) -> OrderResult<()> {
        if qty == 0 {
            return Ok(());
        }
        if self.filled_qty + qty > self.quantity {
            return Err(OrderError::Overfill {
                remaining: self.remaining_qty(),
                requested: qty,
            });
        }
        if self.status.is_terminal() {
            return Err(OrderError::TerminalState(self.status));
        }

        self.filled_qty += qty;
        self.status = if self.filled_qty == self.quantity {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };

        Ok(())
    }

    /// Cancel the order if it is still working.
    ///
    /// A no-op on terminal states, so repeated cancels are harmless.
    pub fn cancel(&mut self) {
        if !self.status.is_terminal() {
            self.status = OrderStatus::Cancelled;
        }
    }

    /// Whether this order can execute against a resting level at `book_price`.
    pub fn crosses(&self, book_price: Decimal) -> bool {
        match self.order_type {
            OrderType::Market => true,
            OrderType::Limit => match self.side {
                Side::Buy => self.price >= book_price,
                Side::Sell => self.price <= book_price,
            },
        }
    }
}
