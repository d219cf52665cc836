//! Matchmaking queue — pairs waiting stakes of equal amount.
//!
//! Strictly FIFO: a new stake scans pending offers front-to-back and takes
//! the **earliest** offer with the same amount from a different identity.
//! No partial matching, no cross-amount matching. The queue holds offers
//! only; the corresponding escrows live in the [ledger](crate::EscrowLedger)
//! and are flipped to MATCHED by the caller when a pair forms.

use chrono::{DateTime, Utc};
use clickpot_types::IdentityId;
use rust_decimal::Decimal;

/// One pending stake waiting for an equal-amount counterpart.
#[derive(Debug, Clone, PartialEq)]
pub struct StakeOffer {
    pub identity_id: IdentityId,
    pub amount: Decimal,
    pub enqueued_at: DateTime<Utc>,
}

/// What `queue_stake` found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOutcome {
    /// Paired with the earliest equal-amount offer.
    Matched { opponent: IdentityId },
    /// No counterpart pending; the offer now waits.
    Waiting,
}

/// FIFO queue of pending stake offers.
pub struct MatchmakingQueue {
    pending: Vec<StakeOffer>,
}

impl MatchmakingQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Queue a stake: match it against the earliest equal-amount offer from
    /// a different identity, or append it as a new offer.
    pub fn queue_stake(
        &mut self,
        identity_id: IdentityId,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> QueueOutcome {
        let found = self
            .pending
            .iter()
            .position(|offer| offer.amount == amount && offer.identity_id != identity_id);

        if let Some(index) = found {
            let opponent = self.pending.remove(index);
            return QueueOutcome::Matched {
                opponent: opponent.identity_id,
            };
        }

        self.pending.push(StakeOffer {
            identity_id,
            amount,
            enqueued_at: now,
        });
        QueueOutcome::Waiting
    }

    /// Remove the identity's pending offer, if any. Idempotent.
    /// Returns whether an offer was removed.
    pub fn cancel(&mut self, identity_id: IdentityId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|offer| offer.identity_id != identity_id);
        self.pending.len() != before
    }

    /// Whether the identity has an offer pending.
    #[must_use]
    pub fn has_offer(&self, identity_id: IdentityId) -> bool {
        self.pending
            .iter()
            .any(|offer| offer.identity_id == identity_id)
    }

    /// Number of pending offers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no offers are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for MatchmakingQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> IdentityId {
        IdentityId::from_external(name)
    }

    #[test]
    fn first_offer_waits() {
        let mut queue = MatchmakingQueue::new();
        let outcome = queue.queue_stake(id("a"), Decimal::new(5, 0), Utc::now());
        assert_eq!(outcome, QueueOutcome::Waiting);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn equal_amounts_match() {
        let mut queue = MatchmakingQueue::new();
        queue.queue_stake(id("a"), Decimal::new(5, 0), Utc::now());
        let outcome = queue.queue_stake(id("b"), Decimal::new(5, 0), Utc::now());
        assert_eq!(
            outcome,
            QueueOutcome::Matched {
                opponent: id("a")
            }
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn unequal_amounts_never_match() {
        let mut queue = MatchmakingQueue::new();
        queue.queue_stake(id("a"), Decimal::new(5, 0), Utc::now());
        let outcome = queue.queue_stake(id("b"), Decimal::new(10, 0), Utc::now());
        assert_eq!(outcome, QueueOutcome::Waiting);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn fifo_earliest_offer_wins() {
        use chrono::TimeZone;

        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 1).unwrap();

        // Two pending offers with the same amount (same identity, so they
        // never matched each other). A new counterpart must take the
        // earliest one.
        let mut queue = MatchmakingQueue::new();
        queue.queue_stake(id("a"), Decimal::new(5, 0), t0);
        queue.queue_stake(id("a"), Decimal::new(5, 0), t1);

        let outcome = queue.queue_stake(id("b"), Decimal::new(5, 0), Utc::now());
        assert_eq!(outcome, QueueOutcome::Matched { opponent: id("a") });
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pending[0].enqueued_at, t1, "the later offer remains");
    }

    #[test]
    fn same_identity_does_not_self_match() {
        let mut queue = MatchmakingQueue::new();
        queue.queue_stake(id("a"), Decimal::new(5, 0), Utc::now());
        let outcome = queue.queue_stake(id("a"), Decimal::new(5, 0), Utc::now());
        assert_eq!(outcome, QueueOutcome::Waiting);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut queue = MatchmakingQueue::new();
        queue.queue_stake(id("a"), Decimal::new(5, 0), Utc::now());
        assert!(queue.cancel(id("a")));
        assert!(!queue.cancel(id("a")));
        assert!(queue.is_empty());
    }

    #[test]
    fn cancelled_offer_cannot_match() {
        let mut queue = MatchmakingQueue::new();
        queue.queue_stake(id("a"), Decimal::new(5, 0), Utc::now());
        queue.cancel(id("a"));
        let outcome = queue.queue_stake(id("b"), Decimal::new(5, 0), Utc::now());
        assert_eq!(outcome, QueueOutcome::Waiting);
    }
}
