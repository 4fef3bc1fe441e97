//! Persisted form of [`DeliveryRecord`].

use classpulse_core::delivery::{DeliveryRecord, SubjectRef};
use classpulse_core::error::CoreError;
use classpulse_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `delivery_records` table. Enum columns are stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct DeliveryRecordRow {
    pub subject_kind: String,
    pub subject_id: DbId,
    pub institute_id: Option<DbId>,
    pub recipient: String,
    pub status: String,
    pub channel: Option<String>,
    pub provider: Option<String>,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
    pub retry_count: i32,
    pub last_attempt_at: Option<Timestamp>,
    pub sent_at: Option<Timestamp>,
}

impl TryFrom<DeliveryRecordRow> for DeliveryRecord {
    type Error = CoreError;

    fn try_from(row: DeliveryRecordRow) -> Result<Self, Self::Error> {
        Ok(DeliveryRecord {
            subject: SubjectRef::new(row.subject_kind.parse()?, row.subject_id),
            institute_id: row.institute_id,
            recipient: row.recipient,
            status: row.status.parse()?,
            channel: row.channel.as_deref().map(str::parse).transpose()?,
            provider: row.provider,
            provider_message_id: row.provider_message_id,
            error: row.error,
            retry_count: row.retry_count,
            last_attempt_at: row.last_attempt_at,
            sent_at: row.sent_at,
        })
    }
}
