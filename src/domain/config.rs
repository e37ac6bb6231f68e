// ============================================================================
// Engine Configuration
// ============================================================================

use rust_decimal::Decimal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a [`MatchingEngine`](crate::engine::MatchingEngine).
///
/// The default configuration enforces nothing beyond the engine's own
/// parameter checks; tick and lot constraints are opt-in.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    /// The traded instrument (e.g. "ACME", "BTC-USD").
    pub instrument: String,

    /// Minimum price increment. When set, limit prices that are not a whole
    /// multiple are rejected at the engine boundary.
    pub tick_size: Option<Decimal>,

    /// Minimum quantity increment. When set, quantities that are not a whole
    /// multiple are rejected at the engine boundary.
    pub lot_size: Option<u64>,

    /// Default number of levels per side in depth snapshots.
    pub snapshot_depth: usize,
}

impl EngineConfig {
    pub fn new(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            tick_size: None,
            lot_size: None,
            snapshot_depth: 10,
        }
    }

    /// Builder method: set the price tick size.
    pub fn with_tick_size(mut self, tick: Decimal) -> Self {
        self.tick_size = Some(tick);
        self
    }

    /// Builder method: set the quantity lot size.
    pub fn with_lot_size(mut self, lot: u64) -> Self {
        self.lot_size = Some(lot);
        self
    }

    /// Builder method: set the default snapshot depth.
    pub fn with_snapshot_depth(mut self, depth: usize) -> Self {
        self.snapshot_depth = depth;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.instrument.is_empty() {
            return Err("instrument cannot be empty".to_string());
        }

        if let Some(tick) = self.tick_size {
            if tick <= Decimal::ZERO {
                return Err("tick size must be positive".to_string());
            }
        }

        if let Some(lot) = self.lot_size {
            if lot == 0 {
                return Err("lot size must be positive".to_string());
            }
        }

        if self.snapshot_depth == 0 {
            return Err("snapshot depth must be positive".to_string());
        }

        Ok(())
    }

    /// Whether `price` lands on the configured tick grid.
    pub(crate) fn price_on_tick(&self, price: Decimal) -> bool {
        match self.tick_size {
            Some(tick) => price
                .checked_rem(tick)
                .map(|rem| rem.is_zero())
                .unwrap_or(false),
            None => true,
        }
    }

    /// Whether `quantity` is a whole number of lots.
    pub(crate) fn quantity_on_lot(&self, quantity: u64) -> bool {
        match self.lot_size {
            Some(lot) => quantity % lot == 0,
            None => true,
        }
    }
}
