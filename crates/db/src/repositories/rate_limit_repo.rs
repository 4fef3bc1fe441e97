//! Repository for the `rate_limit_events` action log.

use classpulse_core::types::Timestamp;
use sqlx::PgPool;

pub struct RateLimitRepo;

impl RateLimitRepo {
    /// Count-then-record under a per-subject advisory lock so concurrent callers
    /// cannot both take the last slot.
    pub async fn check_and_record(
        pool: &PgPool,
        subject_key: &str,
        action: &str,
        window: (Timestamp, Timestamp),
        limit: i64,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1 || ':' || $2))")
            .bind(subject_key)
            .bind(action)
            .execute(&mut *tx)
            .await?;

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM rate_limit_events \
             WHERE subject_key = $1 AND action = $2 \
               AND occurred_at >= $3 AND occurred_at < $4",
        )
        .bind(subject_key)
        .bind(action)
        .bind(window.0)
        .bind(window.1)
        .fetch_one(&mut *tx)
        .await?;

        if count >= limit {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO rate_limit_events (subject_key, action, occurred_at) VALUES ($1, $2, $3)",
        )
        .bind(subject_key)
        .bind(action)
        .bind(at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(true)
    }
}
