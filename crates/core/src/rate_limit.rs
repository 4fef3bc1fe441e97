//! Fixed-window rate-limit policies.
//!
//! Counters are not stored: the limiter counts timestamped action log entries
//! inside `[window_start, window_end)` at query time, so nothing needs to
//! decay.

use chrono::Duration;

use crate::types::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Action name stored alongside each log entry.
    pub action: &'static str,
    /// Actions allowed per window.
    pub limit: i64,
    pub window_secs: i64,
}

/// Test notifications: 5 per caller per hour.
pub const TEST_NOTIFICATION: RateLimitPolicy = RateLimitPolicy {
    action: "test-notification",
    limit: 5,
    window_secs: 3600,
};

impl RateLimitPolicy {
    /// The window that ends at `now`, including actions recorded at `now`.
    pub fn window_ending_at(&self, now: Timestamp) -> (Timestamp, Timestamp) {
        (
            now - Duration::seconds(self.window_secs),
            now + Duration::microseconds(1),
        )
    }
}

/// Whether one more action fits given `count` actions already in the window.
pub fn admits(count: i64, limit: i64) -> bool {
    count < limit
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn window_spans_policy_length() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let (start, end) = TEST_NOTIFICATION.window_ending_at(now);
        assert_eq!(start, now - Duration::hours(1));
        assert!(end > now);
    }

    #[test]
    fn admits_below_limit_only() {
        assert!(admits(0, 5));
        assert!(admits(4, 5));
        assert!(!admits(5, 5));
        assert!(!admits(9, 5));
    }
}
