//! Settlement engine — turns final standings into applied payouts.
//!
//! Settlement is the only mutation path into balances besides the stake
//! debit and the registration grant:
//! 1. Count the game for every participant in the ranking
//! 2. Consume the room's bet via the escrow ledger
//! 3. Credit each payout to its identity's balance
//! 4. Accrue the house fee and the winner's ranking stats
//! 5. Append the bounded result record
//! 6. Verify the credit conservation invariant
//!
//! An already-settled room produces an empty settlement: no payouts, no
//! fee, no result record.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use clickpot_types::{
    BetRecord, FinishReason, IdentityId, ParticipantSummary, Payout, RankingEntry, Result,
    ResultRecord, RoomId,
};
use clickpot_escrow::{BalanceBook, EscrowLedger};
use clickpot_session::Standings;
use rust_decimal::Decimal;

use crate::conservation::CreditConservation;
use crate::ranking::RankingBoard;
use crate::results::ResultLog;

/// The applied settlement of one room, ready for broadcast.
#[derive(Debug, Clone)]
pub struct RoomSettlement {
    pub room_id: RoomId,
    pub winner: Option<IdentityId>,
    pub reason: FinishReason,
    pub participants: Vec<ParticipantSummary>,
    pub payouts: Vec<Payout>,
    /// Absent when the room was already settled.
    pub bet: Option<BetRecord>,
    pub house_balance: Decimal,
}

/// Applies settlements and owns the ranking, result history, house
/// balance, and the conservation tracker.
pub struct SettlementEngine {
    ranking: RankingBoard,
    results: ResultLog,
    conservation: CreditConservation,
    house_balance: Decimal,
}

impl SettlementEngine {
    /// Create an engine retaining at most `result_cap` results.
    #[must_use]
    pub fn new(result_cap: usize) -> Self {
        Self {
            ranking: RankingBoard::new(),
            results: ResultLog::new(result_cap),
            conservation: CreditConservation::new(),
            house_balance: Decimal::ZERO,
        }
    }

    /// Record a registration grant for the conservation invariant.
    pub fn record_grant(&mut self, amount: Decimal) {
        self.conservation.record_grant(amount);
    }

    /// Settle a finished room: apply payouts, update the read models, and
    /// verify conservation.
    ///
    /// # Errors
    /// Returns `ConservationViolation` if the post-settlement totals break
    /// the conservation identity — a critical fault, never expected.
    #[allow(clippy::too_many_arguments)]
    pub fn settle_room(
        &mut self,
        book: &mut BalanceBook,
        ledger: &mut EscrowLedger,
        room_id: RoomId,
        standings: &Standings,
        reason: FinishReason,
        display_names: &HashMap<IdentityId, String>,
        now: DateTime<Utc>,
    ) -> Result<RoomSettlement> {
        let name_of = |id: IdentityId| -> String {
            display_names
                .get(&id)
                .cloned()
                .unwrap_or_else(|| "Anon".to_string())
        };

        for &(identity_id, _) in &standings.scores {
            self.ranking.record_game(identity_id, &name_of(identity_id));
        }

        let settlement = ledger.settle(room_id, standings.winner, now);

        for payout in &settlement.payouts {
            book.credit(payout.identity_id, payout.amount);
            if standings.winner == Some(payout.identity_id) {
                self.ranking
                    .record_win(payout.identity_id, &name_of(payout.identity_id), payout.amount);
            }
        }
        self.house_balance += settlement.house_fee;

        let participants: Vec<ParticipantSummary> = standings
            .scores
            .iter()
            .map(|&(identity_id, clicks)| ParticipantSummary {
                identity_id,
                display_name: name_of(identity_id),
                clicks,
                balance: book.balance(identity_id),
            })
            .collect();

        if let Some(bet) = &settlement.bet {
            self.results.push(ResultRecord {
                room_id,
                winner: standings.winner,
                reason,
                participants: participants.clone(),
                bet: bet.clone(),
                timestamp: now,
            });
        }

        let actual = book.total_credits() + ledger.escrowed_total() + self.house_balance;
        if let Err(err) = self.conservation.verify(actual) {
            tracing::error!(room = %room_id, %err, "conservation check failed after settlement");
            return Err(err);
        }

        Ok(RoomSettlement {
            room_id,
            winner: standings.winner,
            reason,
            participants,
            payouts: settlement.payouts,
            bet: settlement.bet,
            house_balance: self.house_balance,
        })
    }

    /// Credits the house has retained so far.
    #[must_use]
    pub fn house_balance(&self) -> Decimal {
        self.house_balance
    }

    /// Top `n` ranking rows.
    #[must_use]
    pub fn ranking(&self, n: usize) -> Vec<RankingEntry> {
        self.ranking.top(n)
    }

    /// One identity's ranking row.
    #[must_use]
    pub fn ranking_entry(&self, identity_id: IdentityId) -> Option<&RankingEntry> {
        self.ranking.entry(identity_id)
    }

    /// The most recent results, newest first.
    #[must_use]
    pub fn recent_results(&self, limit: usize) -> Vec<ResultRecord> {
        self.results.recent(limit)
    }
}
