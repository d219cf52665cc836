//! Escrow and bet models — the money-custody primitives.
//!
//! An [`Escrow`] is a **lock on staked credits** created atomically when a
//! player joins the queue. It prevents double-committing the same credits.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  paired   ┌─────────┐  room formed  ┌────────────┐
//!   │ WAITING ├──────────▶│ MATCHED ├──────────────▶│ IN-SESSION │
//!   └─────────┘           └─────────┘               └────────────┘
//! ```
//!
//! Any state can be destroyed by settlement or an explicit release; the
//! transitions above are the only forward moves. At most one escrow exists
//! per identity at any time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{EntryId, IdentityId, RoomId};

/// The lifecycle state of an escrow.
///
/// Transitions are **monotonic** (never go backwards):
/// - `Waiting → Matched` (the queue paired two offers)
/// - `Matched → InSession` (the room was formed and the bet attached)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscrowStatus {
    /// Credits locked, offer sits in the matchmaking queue.
    Waiting,
    /// Paired with an opponent, room not yet formed.
    Matched,
    /// Bound to a live room for the room's entire lifetime.
    InSession,
}

impl EscrowStatus {
    /// Can this escrow transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Waiting, Self::Matched) | (Self::Matched, Self::InSession)
        )
    }
}

impl std::fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "WAITING"),
            Self::Matched => write!(f, "MATCHED"),
            Self::InSession => write!(f, "IN-SESSION"),
        }
    }
}

/// A lock on staked credits, held until settlement or release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Escrow {
    /// The identity whose credits are locked.
    pub identity_id: IdentityId,
    /// Amount locked.
    pub amount: Decimal,
    /// Current lifecycle state.
    pub status: EscrowStatus,
    /// The room this escrow funds, once one exists.
    pub room_id: Option<RoomId>,
    /// When the lock was taken.
    pub locked_at: DateTime<Utc>,
}

/// The bet attached to a room: stake, pot, and house fee, fixed at room
/// formation and consumed at settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetRecord {
    /// The room this bet belongs to.
    pub room_id: RoomId,
    /// Stake each participant committed.
    pub amount_per_participant: Decimal,
    /// Total pot: stake × participant count.
    pub pot: Decimal,
    /// Fee the house retains on a decisive result: pot × cut rate.
    pub house_fee: Decimal,
    /// The cut rate in force when the bet was created.
    pub house_cut_rate: Decimal,
    /// The staking identities.
    pub participants: Vec<IdentityId>,
    /// When the room was formed.
    pub created_at: DateTime<Utc>,
}

impl BetRecord {
    /// Build the bet for a freshly formed room, computing pot and fee.
    #[must_use]
    pub fn new(
        room_id: RoomId,
        amount: Decimal,
        participants: Vec<IdentityId>,
        house_cut_rate: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        let pot = amount * Decimal::from(participants.len());
        let house_fee = pot * house_cut_rate;
        Self {
            room_id,
            amount_per_participant: amount,
            pot,
            house_fee,
            house_cut_rate,
            participants,
            created_at: now,
        }
    }

    /// The winner's payout: pot minus the house fee.
    #[must_use]
    pub fn net_prize(&self) -> Decimal {
        self.pot - self.house_fee
    }
}

/// What kind of funds movement a log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Credits moved from a balance into escrow.
    Lock,
    /// Winner received the net prize.
    Payout,
    /// Stake returned (tie, cancel, or release).
    Refund,
    /// House fee extracted from the pot.
    House,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lock => write!(f, "lock"),
            Self::Payout => write!(f, "payout"),
            Self::Refund => write!(f, "refund"),
            Self::House => write!(f, "house"),
        }
    }
}

/// One append-only entry in the escrow ledger's transaction log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLogEntry {
    /// Unique entry id.
    pub id: EntryId,
    /// When the movement happened.
    pub timestamp: DateTime<Utc>,
    /// What kind of movement.
    pub kind: TransactionKind,
    /// The identity involved, absent for house extractions.
    pub identity_id: Option<IdentityId>,
    /// Amount moved.
    pub amount: Decimal,
    /// The room involved, when the movement is room-scoped.
    pub room_id: Option<RoomId>,
    /// Free-form annotation ("offer", "tie", "disconnect", ...).
    pub note: Option<String>,
}

/// One settlement payout line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Who gets credited.
    pub identity_id: IdentityId,
    /// How much.
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escrow_status_transitions_monotonic() {
        assert!(EscrowStatus::Waiting.can_transition_to(EscrowStatus::Matched));
        assert!(EscrowStatus::Matched.can_transition_to(EscrowStatus::InSession));
        assert!(!EscrowStatus::Waiting.can_transition_to(EscrowStatus::InSession));
        assert!(!EscrowStatus::InSession.can_transition_to(EscrowStatus::Waiting));
        assert!(!EscrowStatus::Matched.can_transition_to(EscrowStatus::Waiting));
    }

    #[test]
    fn bet_record_computes_pot_and_fee() {
        let a = IdentityId::from_external("a");
        let b = IdentityId::from_external("b");
        let bet = BetRecord::new(
            RoomId::new(),
            Decimal::new(5, 0),
            vec![a, b],
            Decimal::new(1, 1),
            Utc::now(),
        );
        assert_eq!(bet.pot, Decimal::new(10, 0));
        assert_eq!(bet.house_fee, Decimal::new(1, 0));
        assert_eq!(bet.net_prize(), Decimal::new(9, 0));
    }

    #[test]
    fn bet_record_serde_roundtrip() {
        let bet = BetRecord::new(
            RoomId::new(),
            Decimal::new(1, 0),
            vec![IdentityId::from_external("a"), IdentityId::from_external("b")],
            Decimal::new(1, 1),
            Utc::now(),
        );
        let json = serde_json::to_string(&bet).unwrap();
        let back: BetRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(bet, back);
    }

    #[test]
    fn transaction_kind_display_lowercase() {
        assert_eq!(TransactionKind::Lock.to_string(), "lock");
        assert_eq!(TransactionKind::House.to_string(), "house");
    }
}
