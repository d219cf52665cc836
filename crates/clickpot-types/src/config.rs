//! Configuration for the ClickPot session directory.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Configuration for a session directory instance.
///
/// One value of this struct parameterizes every component: stakes and
/// house cut for the escrow ledger, timings for sessions and the click
/// rate limiter, and capacities for the bounded audit logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Credits granted once per identity on first registration.
    pub starting_balance: Decimal,
    /// Stake amounts players may wager. Kept sorted ascending.
    pub allowed_stakes: Vec<Decimal>,
    /// Fraction of the pot retained by the house on a decisive result.
    pub house_cut_rate: Decimal,
    /// Match duration in milliseconds.
    pub game_duration_ms: u64,
    /// Countdown tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Minimum spacing between accepted clicks per connection.
    pub min_click_interval_ms: u64,
    /// Maximum accepted clicks within the trailing window.
    pub max_clicks_per_window: u32,
    /// Trailing rate-limit window in milliseconds.
    pub click_window_ms: u64,
    /// Transaction log ring-buffer capacity.
    pub transaction_log_cap: usize,
    /// Result history capacity.
    pub result_log_cap: usize,
}

impl DirectoryConfig {
    /// Whether `amount` is an allowed stake.
    #[must_use]
    pub fn stake_allowed(&self, amount: Decimal) -> bool {
        self.allowed_stakes.contains(&amount)
    }

    /// Replace the stake allow-list, keeping it sorted ascending.
    #[must_use]
    pub fn with_stakes(mut self, stakes: Vec<Decimal>) -> Self {
        self.allowed_stakes = stakes;
        self.allowed_stakes.sort();
        self
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            starting_balance: Decimal::new(constants::DEFAULT_STARTING_BALANCE, 0),
            allowed_stakes: constants::DEFAULT_ALLOWED_STAKES
                .iter()
                .map(|&s| Decimal::new(s, 0))
                .collect(),
            house_cut_rate: Decimal::new(constants::DEFAULT_HOUSE_CUT_PERCENT, 2),
            game_duration_ms: constants::DEFAULT_GAME_DURATION_MS,
            tick_interval_ms: constants::DEFAULT_TICK_INTERVAL_MS,
            min_click_interval_ms: constants::DEFAULT_MIN_CLICK_INTERVAL_MS,
            max_clicks_per_window: constants::DEFAULT_MAX_CLICKS_PER_WINDOW,
            click_window_ms: constants::DEFAULT_CLICK_WINDOW_MS,
            transaction_log_cap: constants::DEFAULT_TRANSACTION_LOG_CAP,
            result_log_cap: constants::DEFAULT_RESULT_LOG_CAP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stakes_sorted() {
        let cfg = DirectoryConfig::default();
        let mut sorted = cfg.allowed_stakes.clone();
        sorted.sort();
        assert_eq!(cfg.allowed_stakes, sorted);
        assert_eq!(cfg.allowed_stakes.len(), 3);
    }

    #[test]
    fn default_house_cut_is_ten_percent() {
        let cfg = DirectoryConfig::default();
        assert_eq!(cfg.house_cut_rate, Decimal::new(1, 1));
    }

    #[test]
    fn stake_allowed_checks_list() {
        let cfg = DirectoryConfig::default();
        assert!(cfg.stake_allowed(Decimal::new(5, 0)));
        assert!(!cfg.stake_allowed(Decimal::new(7, 0)));
    }

    #[test]
    fn with_stakes_sorts() {
        let cfg = DirectoryConfig::default().with_stakes(vec![
            Decimal::new(10, 0),
            Decimal::new(2, 0),
            Decimal::new(5, 0),
        ]);
        assert_eq!(
            cfg.allowed_stakes,
            vec![Decimal::new(2, 0), Decimal::new(5, 0), Decimal::new(10, 0)]
        );
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = DirectoryConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: DirectoryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.house_cut_rate, back.house_cut_rate);
        assert_eq!(cfg.allowed_stakes, back.allowed_stakes);
        assert_eq!(cfg.game_duration_ms, back.game_duration_ms);
    }
}
