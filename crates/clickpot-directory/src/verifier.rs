//! The identity-proof seam.
//!
//! Verifying a proof token (HMAC check, expiry, payload decode) is an
//! external collaborator's job; the directory only consumes its verdict.
//! A failed verification is an auth error: the connection is terminated.

use clickpot_types::{ClickpotError, Result};

/// A successfully verified identity proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Stable external identity (e.g. the messenger user id).
    pub external_id: String,
    /// Human-readable name as attested by the proof.
    pub display_name: String,
}

/// Verifies opaque identity-proof tokens presented at registration.
pub trait IdentityVerifier: Send {
    /// Verify a proof, returning the attested identity.
    ///
    /// # Errors
    /// Returns `IdentityProofRejected` for invalid or expired proofs.
    fn verify(&self, proof: &str) -> Result<VerifiedIdentity>;
}

/// Development/test verifier that accepts `"<external_id>:<display_name>"`
/// proofs at face value — the equivalent of running without a signing
/// secret configured. Never use where stakes matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainVerifier;

impl IdentityVerifier for PlainVerifier {
    fn verify(&self, proof: &str) -> Result<VerifiedIdentity> {
        let (external_id, display_name) =
            proof
                .split_once(':')
                .ok_or_else(|| ClickpotError::IdentityProofRejected {
                    reason: "expected <external_id>:<display_name>".to_string(),
                })?;
        if external_id.is_empty() {
            return Err(ClickpotError::IdentityProofRejected {
                reason: "empty external id".to_string(),
            });
        }
        Ok(VerifiedIdentity {
            external_id: external_id.to_string(),
            display_name: display_name.to_string(),
        })
    }
}
