//! Repository for `delivery_records`.

use classpulse_core::delivery::{DeliveryRecord, SubjectRef};
use sqlx::PgPool;

use crate::models::delivery_record::DeliveryRecordRow;

const COLUMNS: &str = "subject_kind, subject_id, institute_id, recipient, status, channel, \
    provider, provider_message_id, error, retry_count, last_attempt_at, sent_at";

pub struct DeliveryRecordRepo;

impl DeliveryRecordRepo {
    pub async fn find(
        pool: &PgPool,
        subject: SubjectRef,
    ) -> Result<Option<DeliveryRecordRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM delivery_records WHERE subject_kind = $1 AND subject_id = $2"
        );
        sqlx::query_as::<_, DeliveryRecordRow>(&query)
            .bind(subject.kind.as_str())
            .bind(subject.id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or overwrite the record for its subject.
    pub async fn upsert(pool: &PgPool, record: &DeliveryRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO delivery_records \
                (subject_kind, subject_id, institute_id, recipient, status, channel, provider, \
                 provider_message_id, error, retry_count, last_attempt_at, sent_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (subject_kind, subject_id) DO UPDATE SET \
                institute_id = EXCLUDED.institute_id, \
                recipient = EXCLUDED.recipient, \
                status = EXCLUDED.status, \
                channel = EXCLUDED.channel, \
                provider = EXCLUDED.provider, \
                provider_message_id = EXCLUDED.provider_message_id, \
                error = EXCLUDED.error, \
                retry_count = GREATEST(delivery_records.retry_count, EXCLUDED.retry_count), \
                last_attempt_at = EXCLUDED.last_attempt_at, \
                sent_at = EXCLUDED.sent_at, \
                updated_at = NOW()",
        )
        .bind(record.subject.kind.as_str())
        .bind(record.subject.id)
        .bind(record.institute_id)
        .bind(&record.recipient)
        .bind(record.status.as_str())
        .bind(record.channel.map(|c| c.as_str()))
        .bind(&record.provider)
        .bind(&record.provider_message_id)
        .bind(&record.error)
        .bind(record.retry_count)
        .bind(record.last_attempt_at)
        .bind(record.sent_at)
        .execute(pool)
        .await?;
        Ok(())
    }
}
