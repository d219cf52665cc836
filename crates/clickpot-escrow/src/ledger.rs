//! Escrow ledger — locks staked credits and moves them at settlement.
//!
//! The ledger atomically debits a balance and creates the escrow lock.
//! Every funds-moving call appends an entry to the bounded transaction
//! log; no path skips logging.
//!
//! ## Money-safety invariants
//!
//! - At most one escrow per identity at any time
//! - The debit happens only after every fallible check has passed, so a
//!   failed lock leaves the balance untouched
//! - The house fee is extracted only on a decisive (non-tie) result
//! - Settling a room twice yields an empty settlement, never a second
//!   round of payouts

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use clickpot_types::{
    BetRecord, ClickpotError, EntryId, Escrow, EscrowStatus, IdentityId, Payout, Result, RoomId,
    TransactionKind, TransactionLogEntry,
};
use rust_decimal::Decimal;

use crate::balance_book::BalanceBook;

/// The outcome of settling one room.
#[derive(Debug, Clone)]
pub struct Settlement {
    /// Credits owed, one line for the winner or one refund per participant.
    pub payouts: Vec<Payout>,
    /// Fee the house collected; zero on ties and already-settled rooms.
    pub house_fee: Decimal,
    /// The consumed bet, absent when the room was already settled.
    pub bet: Option<BetRecord>,
}

impl Settlement {
    /// The empty settlement returned for an already-settled room.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            payouts: Vec::new(),
            house_fee: Decimal::ZERO,
            bet: None,
        }
    }

    /// Whether this settlement moved any credits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payouts.is_empty() && self.bet.is_none()
    }
}

/// Locks, tracks, and releases staked credits, with an auditable log.
pub struct EscrowLedger {
    /// Fraction of the pot the house keeps on a decisive result.
    house_cut_rate: Decimal,
    /// Live escrows, at most one per identity.
    escrows: HashMap<IdentityId, Escrow>,
    /// Bets attached to live rooms.
    bets: HashMap<RoomId, BetRecord>,
    /// Bounded transaction ring (front = oldest).
    transactions: VecDeque<TransactionLogEntry>,
    /// Maximum retained log entries.
    log_cap: usize,
}

impl EscrowLedger {
    /// Create a ledger with the given house cut and log capacity.
    ///
    /// # Panics
    /// Panics if `log_cap` is zero.
    #[must_use]
    pub fn new(house_cut_rate: Decimal, log_cap: usize) -> Self {
        assert!(log_cap > 0, "EscrowLedger log_cap must be > 0");
        Self {
            house_cut_rate,
            escrows: HashMap::new(),
            bets: HashMap::new(),
            transactions: VecDeque::with_capacity(log_cap),
            log_cap,
        }
    }

    /// The configured house cut rate.
    #[must_use]
    pub fn house_cut_rate(&self) -> Decimal {
        self.house_cut_rate
    }

    /// Whether the identity currently has credits locked.
    #[must_use]
    pub fn has_escrow(&self, identity_id: IdentityId) -> bool {
        self.escrows.contains_key(&identity_id)
    }

    /// Look up the identity's escrow.
    #[must_use]
    pub fn escrow(&self, identity_id: IdentityId) -> Option<&Escrow> {
        self.escrows.get(&identity_id)
    }

    /// Sum of all locked credits (conservation checks).
    #[must_use]
    pub fn escrowed_total(&self) -> Decimal {
        self.escrows.values().map(|e| e.amount).sum()
    }

    /// Atomically debit the balance and lock the credits in escrow.
    ///
    /// 1. Reject if the identity already holds an escrow
    /// 2. Debit `amount` from the identity's balance
    /// 3. Create the escrow in WAITING state and log the lock
    ///
    /// If the debit fails (insufficient balance), no escrow is created and
    /// the balance is unchanged.
    ///
    /// # Errors
    /// - `AlreadyLocked` if an escrow exists for the identity
    /// - `InsufficientBalance` if the balance doesn't cover the stake
    pub fn lock(
        &mut self,
        book: &mut BalanceBook,
        identity_id: IdentityId,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.escrows.contains_key(&identity_id) {
            return Err(ClickpotError::AlreadyLocked(identity_id));
        }

        book.debit(identity_id, amount)?;

        let escrow = Escrow {
            identity_id,
            amount,
            status: EscrowStatus::Waiting,
            room_id: None,
            locked_at: now,
        };
        self.escrows.insert(identity_id, escrow);
        self.log(now, TransactionKind::Lock, Some(identity_id), amount, None, Some("offer"));

        tracing::debug!(identity = %identity_id.short(), %amount, "credits locked");
        Ok(())
    }

    /// Flip a waiting escrow to MATCHED once the queue pairs it.
    ///
    /// # Errors
    /// - `EscrowNotFound` if the identity holds no escrow
    /// - `Internal` if the escrow is not in WAITING state
    pub fn mark_matched(&mut self, identity_id: IdentityId) -> Result<()> {
        let escrow = self
            .escrows
            .get_mut(&identity_id)
            .ok_or(ClickpotError::EscrowNotFound(identity_id))?;

        if !escrow.status.can_transition_to(EscrowStatus::Matched) {
            return Err(ClickpotError::Internal(format!(
                "cannot mark escrow for {identity_id} matched from {}",
                escrow.status
            )));
        }
        escrow.status = EscrowStatus::Matched;
        Ok(())
    }

    /// Attach a bet to a freshly formed room and bind the participants'
    /// escrows to it for the room's lifetime.
    pub fn attach_room(
        &mut self,
        room_id: RoomId,
        amount: Decimal,
        participants: &[IdentityId],
        now: DateTime<Utc>,
    ) -> BetRecord {
        let bet = BetRecord::new(room_id, amount, participants.to_vec(), self.house_cut_rate, now);
        self.bets.insert(room_id, bet.clone());

        for &identity_id in participants {
            if let Some(escrow) = self.escrows.get_mut(&identity_id) {
                escrow.status = EscrowStatus::InSession;
                escrow.room_id = Some(room_id);
            }
        }
        bet
    }

    /// Settle a room: compute payouts, log every movement, and destroy the
    /// bet and the participants' escrows.
    ///
    /// A decisive result pays the winner `pot − house_fee` and logs the fee
    /// separately; a tie refunds each participant's stake with no fee. An
    /// already-settled (or unknown) room yields [`Settlement::empty`].
    pub fn settle(
        &mut self,
        room_id: RoomId,
        winner: Option<IdentityId>,
        now: DateTime<Utc>,
    ) -> Settlement {
        let Some(bet) = self.bets.remove(&room_id) else {
            return Settlement::empty();
        };

        let mut payouts = Vec::new();
        let house_fee;

        if let Some(winner_id) = winner {
            let net_prize = bet.net_prize();
            payouts.push(Payout {
                identity_id: winner_id,
                amount: net_prize,
            });
            self.log(now, TransactionKind::Payout, Some(winner_id), net_prize, Some(room_id), None);
            if bet.house_fee > Decimal::ZERO {
                self.log(now, TransactionKind::House, None, bet.house_fee, Some(room_id), None);
            }
            house_fee = bet.house_fee;
        } else {
            for &identity_id in &bet.participants {
                payouts.push(Payout {
                    identity_id,
                    amount: bet.amount_per_participant,
                });
                self.log(
                    now,
                    TransactionKind::Refund,
                    Some(identity_id),
                    bet.amount_per_participant,
                    Some(room_id),
                    Some("tie"),
                );
            }
            house_fee = Decimal::ZERO;
        }

        for identity_id in &bet.participants {
            self.escrows.remove(identity_id);
        }

        tracing::info!(
            room = %room_id,
            winner = winner.map(|w| w.short()).unwrap_or_else(|| "tie".into()),
            %house_fee,
            "room settled"
        );

        Settlement {
            payouts,
            house_fee,
            bet: Some(bet),
        }
    }

    /// Release a pending (not in-session) escrow, refunding its amount.
    /// Returns zero if the identity holds no releasable escrow.
    ///
    /// An in-session escrow is deliberately untouchable here: those credits
    /// are part of a live pot and only [`EscrowLedger::settle`] may move them.
    pub fn cancel_waiting(
        &mut self,
        identity_id: IdentityId,
        note: &str,
        now: DateTime<Utc>,
    ) -> Decimal {
        let releasable = self
            .escrows
            .get(&identity_id)
            .is_some_and(|escrow| escrow.status != EscrowStatus::InSession);
        if !releasable {
            return Decimal::ZERO;
        }
        let Some(escrow) = self.escrows.remove(&identity_id) else {
            return Decimal::ZERO;
        };
        self.log(
            now,
            TransactionKind::Refund,
            Some(identity_id),
            escrow.amount,
            None,
            Some(note),
        );
        escrow.amount
    }

    /// Bulk release for the "matched but counterpart vanished" race.
    /// Returns the refund line for each identity that held an escrow.
    pub fn release_many(
        &mut self,
        identity_ids: &[IdentityId],
        note: &str,
        now: DateTime<Utc>,
    ) -> Vec<Payout> {
        identity_ids
            .iter()
            .filter_map(|&identity_id| {
                let amount = self.cancel_waiting(identity_id, note, now);
                (amount > Decimal::ZERO).then_some(Payout {
                    identity_id,
                    amount,
                })
            })
            .collect()
    }

    /// The most recent transactions, newest first.
    #[must_use]
    pub fn recent_transactions(&self, limit: usize) -> Vec<TransactionLogEntry> {
        self.transactions.iter().rev().take(limit).cloned().collect()
    }

    fn log(
        &mut self,
        now: DateTime<Utc>,
        kind: TransactionKind,
        identity_id: Option<IdentityId>,
        amount: Decimal,
        room_id: Option<RoomId>,
        note: Option<&str>,
    ) {
        if self.transactions.len() >= self.log_cap {
            self.transactions.pop_front();
        }
        self.transactions.push_back(TransactionLogEntry {
            id: EntryId::new(),
            timestamp: now,
            kind,
            identity_id,
            amount,
            room_id,
            note: note.map(str::to_string),
        });
    }
}
