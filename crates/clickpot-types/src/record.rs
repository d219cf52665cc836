//! Append-only result history and the ranking read model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BetRecord, IdentityId, ParticipantSummary, RoomId};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    /// The match duration elapsed.
    Time,
    /// A participant disconnected mid-session and forfeited.
    Disconnect,
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Time => write!(f, "time"),
            Self::Disconnect => write!(f, "disconnect"),
        }
    }
}

/// One settled match in the bounded result history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub room_id: RoomId,
    /// `None` on a tie.
    pub winner: Option<IdentityId>,
    pub reason: FinishReason,
    pub participants: Vec<ParticipantSummary>,
    pub bet: BetRecord,
    pub timestamp: DateTime<Utc>,
}

/// One identity's row in the ranking, updated on every settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub identity_id: IdentityId,
    pub display_name: String,
    pub wins: u32,
    pub games_played: u32,
    pub credits_earned: Decimal,
}

impl RankingEntry {
    /// Fresh zeroed row for an identity.
    #[must_use]
    pub fn new(identity_id: IdentityId, display_name: String) -> Self {
        Self {
            identity_id,
            display_name,
            wins: 0,
            games_played: 0,
            credits_earned: Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_reason_display() {
        assert_eq!(FinishReason::Time.to_string(), "time");
        assert_eq!(FinishReason::Disconnect.to_string(), "disconnect");
    }

    #[test]
    fn ranking_entry_starts_zeroed() {
        let entry = RankingEntry::new(IdentityId::from_external("a"), "Ann".into());
        assert_eq!(entry.wins, 0);
        assert_eq!(entry.games_played, 0);
        assert_eq!(entry.credits_earned, Decimal::ZERO);
    }

    #[test]
    fn finish_reason_serde_kebab() {
        let json = serde_json::to_string(&FinishReason::Disconnect).unwrap();
        assert_eq!(json, r#""disconnect""#);
    }
}
