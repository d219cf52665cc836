//! Ranking read model, updated on every settlement.

use std::collections::HashMap;

use clickpot_types::{IdentityId, RankingEntry};
use rust_decimal::Decimal;

/// Win/loss statistics per identity, ordered by wins then credits earned.
pub struct RankingBoard {
    entries: HashMap<IdentityId, RankingEntry>,
}

impl RankingBoard {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Count one played game for an identity, refreshing the display name.
    pub fn record_game(&mut self, identity_id: IdentityId, display_name: &str) {
        let entry = self
            .entries
            .entry(identity_id)
            .or_insert_with(|| RankingEntry::new(identity_id, display_name.to_string()));
        entry.display_name = display_name.to_string();
        entry.games_played += 1;
    }

    /// Count one win and the credits it earned.
    pub fn record_win(&mut self, identity_id: IdentityId, display_name: &str, credits: Decimal) {
        let entry = self
            .entries
            .entry(identity_id)
            .or_insert_with(|| RankingEntry::new(identity_id, display_name.to_string()));
        entry.wins += 1;
        entry.credits_earned += credits;
    }

    /// Look up one identity's row.
    #[must_use]
    pub fn entry(&self, identity_id: IdentityId) -> Option<&RankingEntry> {
        self.entries.get(&identity_id)
    }

    /// Top `n` entries: wins descending, then credits earned descending,
    /// then identity id for a stable order.
    #[must_use]
    pub fn top(&self, n: usize) -> Vec<RankingEntry> {
        let mut all: Vec<RankingEntry> = self.entries.values().cloned().collect();
        all.sort_by(|a, b| {
            b.wins
                .cmp(&a.wins)
                .then_with(|| b.credits_earned.cmp(&a.credits_earned))
                .then_with(|| a.identity_id.cmp(&b.identity_id))
        });
        all.truncate(n);
        all
    }

    /// Number of ranked identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nobody has played yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RankingBoard {
    fn default() -> Self {
        Self::new()
    }
}
