//! Fixed-window limits on actions a caller can repeat.
//!
//! Checking and recording happen in one store call, so two concurrent
//! requests cannot both take the last slot.

use std::sync::Arc;

use classpulse_core::error::CoreError;
use classpulse_core::rate_limit::RateLimitPolicy;
use classpulse_core::types::Timestamp;
use classpulse_db::store::NotifyStore;

use crate::error::AppResult;

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn NotifyStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn NotifyStore>) -> Self {
        Self { store }
    }

    /// Count `subject_key`'s actions in the policy window ending at `now`;
    /// record one more and return `true` only when under the limit.
    pub async fn check_and_record(
        &self,
        subject_key: &str,
        policy: RateLimitPolicy,
        now: Timestamp,
    ) -> AppResult<bool> {
        let allowed = self
            .store
            .check_and_record_action(
                subject_key,
                policy.action,
                policy.window_ending_at(now),
                policy.limit,
                now,
            )
            .await?;
        Ok(allowed)
    }

    /// Like [`check_and_record`](Self::check_and_record), rejecting with
    /// `RateLimited` when over the limit.
    pub async fn enforce(
        &self,
        subject_key: &str,
        policy: RateLimitPolicy,
        now: Timestamp,
    ) -> AppResult<()> {
        if self.check_and_record(subject_key, policy, now).await? {
            return Ok(());
        }
        tracing::warn!(subject = subject_key, action = policy.action, "Rate limit exceeded");
        Err(CoreError::RateLimited(format!(
            "Rate limit exceeded: maximum {} {} requests per {} minutes",
            policy.limit,
            policy.action,
            policy.window_secs / 60
        ))
        .into())
    }
}
