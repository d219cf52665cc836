//! Wire messages exchanged with connected players.
//!
//! Every event is an explicit tagged type with required fields — a payload
//! that fails to decode is rejected before it reaches any game state.
//! Inbound messages carry no identity: the directory resolves the sender
//! from the connection, never from the payload.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BetRecord, IdentityId, Payout, RoomId};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Messages a client sends to the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Present an identity proof and obtain a registered identity.
    Register { proof: String },
    /// Commit a stake and wait for (or immediately get) an opponent.
    QueueJoin { amount: Decimal },
    /// One click. No payload — the connection identifies the clicker.
    Click,
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Queue-join outcome reported back to the initiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueStatus {
    /// No equal-amount offer was pending; the stake now waits.
    Waiting,
    /// Paired immediately with an earlier offer.
    Matched,
}

/// What one participant sees about their opponent when a match forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentSummary {
    pub identity_id: IdentityId,
    pub display_name: String,
}

/// Per-participant line in a result broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub identity_id: IdentityId,
    pub display_name: String,
    pub clicks: u32,
    pub balance: Decimal,
}

/// Messages the directory sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Registration succeeded.
    RegisterAck {
        identity_id: IdentityId,
        display_name: String,
        balance: Decimal,
        allowed_stakes: Vec<Decimal>,
        house_cut_rate: Decimal,
    },
    /// The stake was accepted; reports whether an opponent was found.
    QueueJoined {
        status: QueueStatus,
        amount: Decimal,
        pot: Decimal,
        house_fee: Decimal,
    },
    /// A room formed around this participant's stake.
    MatchFound {
        room_id: RoomId,
        bet: BetRecord,
        opponent: OpponentSummary,
    },
    /// The match is running; the countdown starts now.
    GameStart {
        room_id: RoomId,
        duration_ms: u64,
        time_left_ms: u64,
        bet: BetRecord,
    },
    /// Periodic countdown broadcast.
    GameTick { time_left_ms: u64 },
    /// Full click snapshot after an accepted click — a snapshot rather
    /// than a delta, since any participant may have missed earlier ticks.
    GameUpdate { clicks: BTreeMap<IdentityId, u32> },
    /// Terminal result broadcast for a room.
    GameResult {
        room_id: RoomId,
        winner: Option<IdentityId>,
        participants: Vec<ParticipantSummary>,
        payouts: Vec<Payout>,
        bet: BetRecord,
        house_balance: Decimal,
    },
    /// The receiver's balance changed.
    BalanceUpdate { balance: Decimal },
    /// Non-fatal advisory (rate limit exceeded, ...).
    Warning { message: String },
    /// Operation rejected; surfaced only to the initiator.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_tagged_decode() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"queue-join","amount":"5"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::QueueJoin {
                amount: Decimal::new(5, 0)
            }
        );

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"click"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Click);
    }

    #[test]
    fn malformed_client_message_rejected() {
        // Missing required field.
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"queue-join"}"#).is_err());
        // Unknown tag.
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"cheat"}"#).is_err());
    }

    #[test]
    fn server_message_tag_is_kebab_case() {
        let msg = ServerMessage::GameTick { time_left_ms: 4200 };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"game-tick""#), "Got: {json}");
    }

    #[test]
    fn game_update_snapshot_roundtrip() {
        let a = IdentityId::from_external("a");
        let b = IdentityId::from_external("b");
        let mut clicks = BTreeMap::new();
        clicks.insert(a, 12);
        clicks.insert(b, 7);
        let msg = ServerMessage::GameUpdate { clicks };
        let json = serde_json::to_string(&msg).unwrap();
        let back: ServerMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, back);
    }
}
