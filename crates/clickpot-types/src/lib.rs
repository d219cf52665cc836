//! # clickpot-types
//!
//! Shared types, errors, and configuration for the **ClickPot** wagering
//! game core.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`IdentityId`], [`ConnectionId`], [`RoomId`], [`EntryId`]
//! - **Escrow model**: [`Escrow`], [`EscrowStatus`], [`BetRecord`], [`Payout`],
//!   [`TransactionLogEntry`], [`TransactionKind`]
//! - **Wire protocol**: [`ClientMessage`], [`ServerMessage`], [`QueueStatus`],
//!   [`OpponentSummary`], [`ParticipantSummary`]
//! - **Records**: [`ResultRecord`], [`FinishReason`], [`RankingEntry`]
//! - **Configuration**: [`DirectoryConfig`]
//! - **Errors**: [`ClickpotError`] with `CP_ERR_` prefix codes
//! - **Constants**: system-wide defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod escrow;
pub mod ids;
pub mod message;
pub mod record;

// Re-export all primary types at crate root for ergonomic imports:
//   use clickpot_types::{Escrow, BetRecord, ServerMessage, ...};

pub use config::*;
pub use error::*;
pub use escrow::*;
pub use ids::*;
pub use message::*;
pub use record::*;

// Constants are accessed via `clickpot_types::constants::FOO`
// (not re-exported to avoid name collisions).
