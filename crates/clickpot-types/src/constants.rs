//! System-wide constants for the ClickPot game core.

/// Starting balance granted once per identity on first registration.
pub const DEFAULT_STARTING_BALANCE: i64 = 20;

/// Stake amounts players may wager, ascending.
pub const DEFAULT_ALLOWED_STAKES: [i64; 3] = [1, 5, 10];

/// House cut in percent of the pot, collected only on decisive results.
pub const DEFAULT_HOUSE_CUT_PERCENT: i64 = 10;

/// Match duration in milliseconds.
pub const DEFAULT_GAME_DURATION_MS: u64 = 10_000;

/// Interval between countdown tick broadcasts in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Minimum spacing between two accepted clicks from one connection.
pub const DEFAULT_MIN_CLICK_INTERVAL_MS: u64 = 60;

/// Maximum accepted clicks within the trailing rate window.
pub const DEFAULT_MAX_CLICKS_PER_WINDOW: u32 = 15;

/// Trailing rate-limit window in milliseconds.
pub const DEFAULT_CLICK_WINDOW_MS: u64 = 1_000;

/// Transaction log ring-buffer capacity.
pub const DEFAULT_TRANSACTION_LOG_CAP: usize = 200;

/// Result history capacity.
pub const DEFAULT_RESULT_LOG_CAP: usize = 25;

/// Maximum display-name length; longer names are trimmed.
pub const DISPLAY_NAME_CAP: usize = 18;

/// Fallback display name when the verified name is empty.
pub const FALLBACK_DISPLAY_NAME: &str = "Player";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "ClickPot";
