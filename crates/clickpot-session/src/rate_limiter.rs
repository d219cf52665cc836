//! Per-connection click throttle — the sole anti-cheat mechanism.
//!
//! Two independent bounds, checked in order:
//! 1. **Spacing**: a click landing within `min_interval_ms` of the last
//!    accepted one is dropped silently (expected under network jitter).
//! 2. **Trailing window**: at most `max_per_window` accepted clicks per
//!    `window_ms`; once the window rolls over the counter resets. A click
//!    beyond the cap is dropped with a non-fatal advisory to the offender —
//!    the session keeps running.
//!
//! Callers inject `now_ms` so the limiter is fully deterministic in tests.

/// What to do with one inbound click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickDecision {
    /// Count it and broadcast the snapshot.
    Accepted,
    /// Too close to the previous accepted click; drop silently.
    TooSoon,
    /// Window cap exceeded; drop and warn the offender.
    WindowExceeded,
}

/// Spacing + trailing-window throttle for one connection.
#[derive(Debug, Clone)]
pub struct ClickRateLimiter {
    min_interval_ms: u64,
    window_ms: u64,
    max_per_window: u32,
    last_accepted_ms: Option<u64>,
    window_start_ms: Option<u64>,
    window_count: u32,
}

impl ClickRateLimiter {
    /// Create a limiter with the given bounds.
    #[must_use]
    pub fn new(min_interval_ms: u64, window_ms: u64, max_per_window: u32) -> Self {
        Self {
            min_interval_ms,
            window_ms,
            max_per_window,
            last_accepted_ms: None,
            window_start_ms: None,
            window_count: 0,
        }
    }

    /// Decide one click arriving at `now_ms`.
    pub fn check(&mut self, now_ms: u64) -> ClickDecision {
        if let Some(last) = self.last_accepted_ms {
            if now_ms.saturating_sub(last) < self.min_interval_ms {
                return ClickDecision::TooSoon;
            }
        }

        let window_elapsed = match self.window_start_ms {
            Some(start) => now_ms.saturating_sub(start) >= self.window_ms,
            None => true,
        };
        if window_elapsed {
            self.window_start_ms = Some(now_ms);
            self.window_count = 0;
        }

        if self.window_count >= self.max_per_window {
            return ClickDecision::WindowExceeded;
        }

        self.window_count += 1;
        self.last_accepted_ms = Some(now_ms);
        ClickDecision::Accepted
    }

    /// Clear all counters (session ended, connection reused for a new match).
    pub fn reset(&mut self) {
        self.last_accepted_ms = None;
        self.window_start_ms = None;
        self.window_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> ClickRateLimiter {
        // Defaults from the game config: 60ms spacing, 15 per 1s window.
        ClickRateLimiter::new(60, 1_000, 15)
    }

    #[test]
    fn first_click_accepted() {
        let mut rl = limiter();
        assert_eq!(rl.check(0), ClickDecision::Accepted);
    }

    #[test]
    fn spacing_bound_drops_rapid_clicks() {
        let mut rl = limiter();
        assert_eq!(rl.check(1_000), ClickDecision::Accepted);
        assert_eq!(rl.check(1_030), ClickDecision::TooSoon);
        assert_eq!(rl.check(1_059), ClickDecision::TooSoon);
        assert_eq!(rl.check(1_060), ClickDecision::Accepted);
    }

    #[test]
    fn rejected_click_does_not_reset_spacing() {
        let mut rl = limiter();
        assert_eq!(rl.check(1_000), ClickDecision::Accepted);
        // Dropped click at 1_030 must not push the next window out.
        assert_eq!(rl.check(1_030), ClickDecision::TooSoon);
        assert_eq!(rl.check(1_061), ClickDecision::Accepted);
    }

    #[test]
    fn burst_of_thirty_in_half_second_accepts_about_eight() {
        let mut rl = limiter();
        let mut accepted = 0;
        // 30 clicks spread over 500ms.
        for i in 0..30 {
            let now = 1_000 + i * 500 / 30;
            if rl.check(now) == ClickDecision::Accepted {
                accepted += 1;
            }
        }
        // 60ms spacing bounds acceptance to ~500/60 + 1.
        assert!((7..=9).contains(&accepted), "accepted {accepted}");
    }

    #[test]
    fn window_cap_warns_without_ending() {
        let mut rl = limiter();
        // 15 clicks spaced exactly at the minimum interval: all accepted.
        for i in 0..15 {
            assert_eq!(rl.check(i * 60), ClickDecision::Accepted, "click {i}");
        }
        // Clicks 16 and 17 land inside the same 1s window: capped.
        assert_eq!(rl.check(900), ClickDecision::WindowExceeded);
        assert_eq!(rl.check(960), ClickDecision::WindowExceeded);
        // Window rolls over at 1000 from window start 0: accepted again.
        assert_eq!(rl.check(1_020), ClickDecision::Accepted);
    }

    #[test]
    fn acceptance_never_exceeds_window_cap() {
        let mut rl = ClickRateLimiter::new(0, 1_000, 15);
        let mut accepted = 0;
        // No spacing bound; hammer 100 clicks inside one window.
        for i in 0..100 {
            if rl.check(i) == ClickDecision::Accepted {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 15);
    }

    #[test]
    fn reset_clears_all_counters() {
        let mut rl = limiter();
        for i in 0..15 {
            rl.check(i * 60);
        }
        assert_eq!(rl.check(901), ClickDecision::WindowExceeded);

        rl.reset();
        assert_eq!(rl.check(902), ClickDecision::Accepted);
    }
}
