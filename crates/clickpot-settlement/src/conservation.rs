//! Credit conservation invariant checker.
//!
//! Mathematical invariant enforced after every settlement:
//! ```text
//! Σ(balances) + Σ(escrowed) + house = Σ(grants)
//! ```
//!
//! Credits enter the system only through registration grants; nothing ever
//! leaves — the house fee just moves to the house side of the ledger. If
//! this identity ever breaks, settlement halts with a critical error.

use clickpot_types::{ClickpotError, Result};
use rust_decimal::Decimal;

/// Tracks total granted credits and validates the conservation identity
/// after every settlement.
pub struct CreditConservation {
    /// Total credits granted since process start.
    granted: Decimal,
}

impl CreditConservation {
    /// Create a fresh tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            granted: Decimal::ZERO,
        }
    }

    /// Record a registration grant.
    pub fn record_grant(&mut self, amount: Decimal) {
        self.granted += amount;
    }

    /// Total credits the system should hold.
    #[must_use]
    pub fn expected_total(&self) -> Decimal {
        self.granted
    }

    /// Verify that the actual total (balances + escrowed + house) matches
    /// the granted total.
    ///
    /// # Errors
    /// Returns [`ClickpotError::ConservationViolation`] if actual ≠ expected.
    pub fn verify(&self, actual_total: Decimal) -> Result<()> {
        if actual_total != self.granted {
            return Err(ClickpotError::ConservationViolation {
                reason: format!(
                    "actual total {actual_total} != granted {granted}",
                    granted = self.granted,
                ),
            });
        }
        Ok(())
    }
}

impl Default for CreditConservation {
    fn default() -> Self {
        Self::new()
    }
}
