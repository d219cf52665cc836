//! Per-identity credit accounting.
//!
//! The `BalanceBook` is the source of truth for available credits. All
//! mutations are atomic: either the full operation succeeds or the balance
//! is unchanged. Credits enter the book through the registration grant and
//! settlement payouts, and leave only through the stake debit taken by the
//! escrow ledger.

use std::collections::HashMap;

use clickpot_types::{ClickpotError, IdentityId, Result};
use rust_decimal::Decimal;

/// Tracks available credits per identity.
pub struct BalanceBook {
    balances: HashMap<IdentityId, Decimal>,
}

impl BalanceBook {
    /// Create a new empty balance book.
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
        }
    }

    /// Credit an identity (grant, payout, or refund). Creates the entry if
    /// it doesn't exist. Returns the new balance.
    pub fn credit(&mut self, identity_id: IdentityId, amount: Decimal) -> Decimal {
        let entry = self.balances.entry(identity_id).or_insert(Decimal::ZERO);
        *entry += amount;
        *entry
    }

    /// Debit an identity. Fails without any change if the available balance
    /// is insufficient. Returns the new balance.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if available < amount.
    pub fn debit(&mut self, identity_id: IdentityId, amount: Decimal) -> Result<Decimal> {
        let available = self.balance(identity_id);
        if available < amount {
            return Err(ClickpotError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        let entry = self.balances.entry(identity_id).or_insert(Decimal::ZERO);
        *entry -= amount;
        Ok(*entry)
    }

    /// The available balance for an identity (zero if unknown).
    #[must_use]
    pub fn balance(&self, identity_id: IdentityId) -> Decimal {
        self.balances
            .get(&identity_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Whether the identity has ever been credited.
    #[must_use]
    pub fn contains(&self, identity_id: IdentityId) -> bool {
        self.balances.contains_key(&identity_id)
    }

    /// Sum of all identities' available credits (conservation checks).
    #[must_use]
    pub fn total_credits(&self) -> Decimal {
        self.balances.values().copied().sum()
    }
}

impl Default for BalanceBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_increases_balance() {
        let mut book = BalanceBook::new();
        let id = IdentityId::from_external("a");
        assert_eq!(book.credit(id, Decimal::new(20, 0)), Decimal::new(20, 0));
        assert_eq!(book.balance(id), Decimal::new(20, 0));
    }

    #[test]
    fn debit_decreases_balance() {
        let mut book = BalanceBook::new();
        let id = IdentityId::from_external("a");
        book.credit(id, Decimal::new(20, 0));
        assert_eq!(
            book.debit(id, Decimal::new(5, 0)).unwrap(),
            Decimal::new(15, 0)
        );
    }

    #[test]
    fn debit_insufficient_fails_unchanged() {
        let mut book = BalanceBook::new();
        let id = IdentityId::from_external("a");
        book.credit(id, Decimal::new(3, 0));
        let err = book.debit(id, Decimal::new(5, 0)).unwrap_err();
        assert!(matches!(err, ClickpotError::InsufficientBalance { .. }));
        assert_eq!(book.balance(id), Decimal::new(3, 0));
    }

    #[test]
    fn debit_unknown_identity_fails() {
        let mut book = BalanceBook::new();
        let err = book
            .debit(IdentityId::from_external("ghost"), Decimal::ONE)
            .unwrap_err();
        assert!(matches!(
            err,
            ClickpotError::InsufficientBalance { available, .. } if available == Decimal::ZERO
        ));
    }

    #[test]
    fn unknown_balance_is_zero() {
        let book = BalanceBook::new();
        assert_eq!(
            book.balance(IdentityId::from_external("ghost")),
            Decimal::ZERO
        );
        assert!(!book.contains(IdentityId::from_external("ghost")));
    }

    #[test]
    fn total_credits_sums_all() {
        let mut book = BalanceBook::new();
        book.credit(IdentityId::from_external("a"), Decimal::new(20, 0));
        book.credit(IdentityId::from_external("b"), Decimal::new(15, 0));
        book.debit(IdentityId::from_external("a"), Decimal::new(5, 0))
            .unwrap();
        assert_eq!(book.total_credits(), Decimal::new(30, 0));
    }
}
