//! Error types for the ClickPot game core.
//!
//! All errors use the `CP_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Registration / validation errors
//! - 2xx: Balance errors
//! - 3xx: Escrow errors
//! - 4xx: Session-conflict errors
//! - 6xx: Settlement errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{IdentityId, RoomId};

/// Central error enum for all ClickPot operations.
#[derive(Debug, Error)]
pub enum ClickpotError {
    // =================================================================
    // Registration / Validation Errors (1xx)
    // =================================================================
    /// The identity proof did not verify. The connection is terminated.
    #[error("CP_ERR_100: Identity proof rejected: {reason}")]
    IdentityProofRejected { reason: String },

    /// The connection has not completed registration.
    #[error("CP_ERR_101: Not registered")]
    NotRegistered,

    /// The referenced identity is not known to the directory.
    #[error("CP_ERR_102: Unknown identity: {0}")]
    UnknownIdentity(IdentityId),

    /// The stake amount is not in the allow-list.
    #[error("CP_ERR_103: Invalid stake amount: {amount}")]
    InvalidStake { amount: Decimal },

    /// The inbound message could not be decoded.
    #[error("CP_ERR_104: Malformed message: {reason}")]
    MalformedMessage { reason: String },

    // =================================================================
    // Balance Errors (2xx)
    // =================================================================
    /// Not enough available credits to perform the operation.
    #[error("CP_ERR_200: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    // =================================================================
    // Escrow Errors (3xx)
    // =================================================================
    /// The identity already has credits locked in escrow.
    #[error("CP_ERR_300: Credits already locked for {0}")]
    AlreadyLocked(IdentityId),

    /// No escrow exists for the identity where one was required.
    #[error("CP_ERR_301: No escrow found for {0}")]
    EscrowNotFound(IdentityId),

    // =================================================================
    // Session-Conflict Errors (4xx)
    // =================================================================
    /// The identity is already inside a running session.
    #[error("CP_ERR_400: Already in session {0}")]
    AlreadyInSession(RoomId),

    // =================================================================
    // Settlement Errors (6xx)
    // =================================================================
    /// Credit conservation invariant violated — critical safety alert.
    #[error("CP_ERR_600: Conservation violation: {reason}")]
    ConservationViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("CP_ERR_900: Internal error: {0}")]
    Internal(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, ClickpotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = ClickpotError::NotRegistered;
        let msg = format!("{err}");
        assert!(msg.starts_with("CP_ERR_101"), "Got: {msg}");
    }

    #[test]
    fn insufficient_balance_display() {
        let err = ClickpotError::InsufficientBalance {
            needed: Decimal::new(10, 0),
            available: Decimal::new(3, 0),
        };
        let msg = format!("{err}");
        assert!(msg.contains("CP_ERR_200"));
        assert!(msg.contains("10"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn all_errors_have_cp_err_prefix() {
        let errors: Vec<ClickpotError> = vec![
            ClickpotError::IdentityProofRejected {
                reason: "bad hash".into(),
            },
            ClickpotError::NotRegistered,
            ClickpotError::InvalidStake {
                amount: Decimal::new(7, 0),
            },
            ClickpotError::AlreadyLocked(IdentityId::from_external("x")),
            ClickpotError::ConservationViolation {
                reason: "test".into(),
            },
            ClickpotError::Internal("test".into()),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("CP_ERR_"),
                "Error missing CP_ERR_ prefix: {msg}"
            );
        }
    }
}
