//! # clickpot-escrow
//!
//! **Credit custody plane**: balance accounting, the escrow ledger, and
//! the stake matchmaking queue.
//!
//! ## Architecture
//!
//! Custody sits between the session directory and game sessions:
//! 1. **BalanceBook**: available credits per identity, the source of truth
//! 2. **EscrowLedger**: atomically debits and locks stakes, settles pots,
//!    and keeps the bounded transaction log
//! 3. **MatchmakingQueue**: pairs waiting stakes of equal amount, FIFO
//!
//! ## Stake Flow
//!
//! ```text
//! queue:join → EscrowLedger.lock() → MatchmakingQueue.queue_stake()
//!            → (paired) mark_matched() × 2 → attach_room() → session
//!            → settle() → payouts back into the BalanceBook
//! ```
//!
//! Every credit entering a pot **must** pass through an escrow lock.

pub mod balance_book;
pub mod ledger;
pub mod queue;

pub use balance_book::BalanceBook;
pub use ledger::{EscrowLedger, Settlement};
pub use queue::{MatchmakingQueue, QueueOutcome, StakeOffer};
