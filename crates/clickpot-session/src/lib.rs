//! # clickpot-session
//!
//! **Game plane for ClickPot** — it takes a formed room and produces final
//! standings. It has:
//!
//! - **Zero money knowledge**: sessions count clicks; escrow and payouts
//!   live elsewhere
//! - **A monotonic state machine**: `Waiting → Running → Ended`, with an
//!   idempotent `finish` that survives a tick racing a disconnect
//! - **Deterministic throttling**: the click rate limiter takes `now_ms`
//!   from the caller, never the wall clock

pub mod arena;
pub mod rate_limiter;
pub mod session;

pub use arena::SessionArena;
pub use rate_limiter::{ClickDecision, ClickRateLimiter};
pub use session::{MatchSession, ParticipantState, SessionStatus, Standings};
