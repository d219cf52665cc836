//! # clickpot-directory
//!
//! **Top-level orchestrator** binding the identity/connection lifecycle to
//! the escrow, session, and settlement planes.
//!
//! ## Event flow
//!
//! ```text
//! register → queue-join(stake) → queue pairs two stakes
//!          → directory verifies both connections live
//!          → EscrowLedger.attach_room() → MatchSession in the arena
//!          → ticks + rate-limited clicks
//!          → time expiry or forfeit → SettlementEngine.settle_room()
//!          → result broadcast, session discarded
//! ```
//!
//! ## Concurrency model
//!
//! Every inbound event is a discrete, non-preemptible task: the whole
//! directory lives behind one coarse lock (see [`runtime`]), so no
//! participant can ever observe a half-settled state. External
//! collaborators sit behind traits: the transport behind
//! [`ConnectionSink`], identity-proof verification behind
//! [`IdentityVerifier`].

pub mod connection;
pub mod directory;
pub mod runtime;
pub mod verifier;

pub use connection::{ConnectionSink, RecordingSink};
pub use directory::{SessionDirectory, TickOutcome};
pub use runtime::{
    SharedDirectory, handle_disconnect, handle_frame, init_tracing, shared, spawn_session_ticker,
};
pub use verifier::{IdentityVerifier, PlainVerifier, VerifiedIdentity};
