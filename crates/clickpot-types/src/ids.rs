//! Globally unique identifiers used throughout ClickPot.
//!
//! Connection, room, and log-entry IDs use UUIDv7 for time-ordered
//! lexicographic sorting. `IdentityId` is instead derived
//! deterministically from the verified external identity, so the same
//! player always maps to the same id across reconnects and the balance
//! survives re-registration.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// IdentityId
// ---------------------------------------------------------------------------

/// Unique identifier for a registered player identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct IdentityId(pub Uuid);

impl IdentityId {
    /// Derive the `IdentityId` for a verified external identity.
    ///
    /// Every registration with the same external id produces the **exact
    /// same** `IdentityId` — this is what ties a reconnecting player back
    /// to their balance and ranking.
    #[must_use]
    pub fn from_external(external_id: &str) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"clickpot:identity:v1:");
        hasher.update(external_id.as_bytes());
        let hash = hasher.finalize();
        let bytes: [u8; 16] = hash[..16].try_into().expect("SHA-256 produces 32 bytes");
        Self(Uuid::from_bytes(bytes))
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Short hex form for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0.as_bytes()[..4])
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ConnectionId
// ---------------------------------------------------------------------------

/// Unique identifier for one live connection. A player re-registering on
/// a new connection gets a fresh `ConnectionId`; the old one is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RoomId
// ---------------------------------------------------------------------------

/// Unique identifier for a match session (room). Uses UUIDv7 so room ids
/// sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RoomId(pub Uuid);

impl RoomId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntryId
// ---------------------------------------------------------------------------

/// Unique identifier for a transaction-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct EntryId(pub Uuid);

impl EntryId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_id_deterministic() {
        let a = IdentityId::from_external("tg:12345");
        let b = IdentityId::from_external("tg:12345");
        assert_eq!(a, b);
        let c = IdentityId::from_external("tg:67890");
        assert_ne!(a, c);
    }

    #[test]
    fn identity_id_short_is_hex() {
        let id = IdentityId::from_external("tg:12345");
        let short = id.short();
        assert_eq!(short.len(), 8);
        assert!(short.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn connection_id_uniqueness() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn room_id_ordering() {
        let a = RoomId::new();
        let b = RoomId::new();
        assert!(a < b);
    }

    #[test]
    fn serde_roundtrips() {
        let id = IdentityId::from_external("tg:12345");
        let json = serde_json::to_string(&id).unwrap();
        let back: IdentityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);

        let room = RoomId::new();
        let json = serde_json::to_string(&room).unwrap();
        let back: RoomId = serde_json::from_str(&json).unwrap();
        assert_eq!(room, back);
    }
}
