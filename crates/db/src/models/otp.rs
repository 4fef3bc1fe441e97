//! OTP challenge rows and the OTP send log.

use classpulse_core::otp::OtpChallenge;
use classpulse_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Kind recorded for parent portal login codes.
pub const PARENT_LOGIN: &str = "parent_login";

/// A row from the `otp_challenges` table.
#[derive(Debug, Clone, FromRow)]
pub struct OtpChallengeRow {
    pub phone_hash: String,
    pub otp_hash: String,
    pub expires_at: Timestamp,
    pub request_attempts: i32,
    pub verify_attempts: i32,
    pub created_at: Timestamp,
}

impl From<OtpChallengeRow> for OtpChallenge {
    fn from(row: OtpChallengeRow) -> Self {
        OtpChallenge {
            phone_hash: row.phone_hash,
            otp_hash: row.otp_hash,
            expires_at: row.expires_at,
            request_attempts: row.request_attempts,
            verify_attempts: row.verify_attempts,
            created_at: row.created_at,
        }
    }
}

/// A row from the `otp_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OtpLog {
    pub id: DbId,
    pub phone: String,
    pub kind: String,
    pub channel: String,
    pub sent_at: Timestamp,
}
