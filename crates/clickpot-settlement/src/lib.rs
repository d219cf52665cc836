//! # clickpot-settlement
//!
//! **Finality plane**: payout application, ranking, result history, and
//! the credit conservation invariant.
//!
//! ## Settlement flow
//!
//! The engine receives the final [`Standings`](clickpot_session::Standings)
//! of a room and:
//! 1. Counts the game for every participant
//! 2. Consumes the bet via [`EscrowLedger::settle`](clickpot_escrow::EscrowLedger::settle)
//! 3. Credits payouts into the [`BalanceBook`](clickpot_escrow::BalanceBook)
//! 4. Accrues the house fee and the winner's stats
//! 5. Appends the bounded result record
//! 6. Verifies `Σ balances + Σ escrowed + house = Σ grants`
//!
//! Step 6 is the ultimate safety net — if conservation breaks, something
//! has gone catastrophically wrong and settlement halts with a critical
//! error rather than propagating a corrupted ledger.

pub mod conservation;
pub mod engine;
pub mod ranking;
pub mod results;

pub use conservation::CreditConservation;
pub use engine::{RoomSettlement, SettlementEngine};
pub use ranking::RankingBoard;
pub use results::ResultLog;
