//! Repositories for `otp_challenges` and `otp_logs`.

use classpulse_core::otp::OtpChallenge;
use sqlx::PgPool;

use crate::models::otp::OtpChallengeRow;

pub struct OtpChallengeRepo;

impl OtpChallengeRepo {
    pub async fn find(
        pool: &PgPool,
        phone_hash: &str,
    ) -> Result<Option<OtpChallengeRow>, sqlx::Error> {
        sqlx::query_as::<_, OtpChallengeRow>(
            "SELECT phone_hash, otp_hash, expires_at, request_attempts, verify_attempts, created_at \
             FROM otp_challenges WHERE phone_hash = $1",
        )
        .bind(phone_hash)
        .fetch_optional(pool)
        .await
    }

    /// Write the challenge, replacing any existing one for the same phone.
    pub async fn put(pool: &PgPool, challenge: &OtpChallenge) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO otp_challenges \
                (phone_hash, otp_hash, expires_at, request_attempts, verify_attempts, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (phone_hash) DO UPDATE SET \
                otp_hash = EXCLUDED.otp_hash, \
                expires_at = EXCLUDED.expires_at, \
                request_attempts = EXCLUDED.request_attempts, \
                verify_attempts = EXCLUDED.verify_attempts, \
                created_at = EXCLUDED.created_at",
        )
        .bind(&challenge.phone_hash)
        .bind(&challenge.otp_hash)
        .bind(challenge.expires_at)
        .bind(challenge.request_attempts)
        .bind(challenge.verify_attempts)
        .bind(challenge.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn increment_verify_attempts(
        pool: &PgPool,
        phone_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE otp_challenges SET verify_attempts = verify_attempts + 1 WHERE phone_hash = $1",
        )
        .bind(phone_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &PgPool, phone_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM otp_challenges WHERE phone_hash = $1")
            .bind(phone_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub struct OtpLogRepo;

impl OtpLogRepo {
    pub async fn create(
        pool: &PgPool,
        phone: &str,
        kind: &str,
        channel: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO otp_logs (phone, kind, channel) VALUES ($1, $2, $3)")
            .bind(phone)
            .bind(kind)
            .bind(channel)
            .execute(pool)
            .await?;
        Ok(())
    }
}
