//! Repository for `attendance` and its `attendance_records` children.

use classpulse_core::types::DbId;
use sqlx::PgPool;

use crate::models::attendance::{AttendanceEntry, AttendanceRecord};

pub struct AttendanceRepo;

impl AttendanceRepo {
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<AttendanceEntry>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceEntry>(
            "SELECT id, institute_id, batch_id, date, submitted_by, submitted_at \
             FROM attendance WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_record(
        pool: &PgPool,
        record_id: DbId,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(
            "SELECT id, attendance_id, student_id, student_name, parent_phone, status \
             FROM attendance_records WHERE id = $1",
        )
        .bind(record_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_records(
        pool: &PgPool,
        attendance_id: DbId,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(
            "SELECT id, attendance_id, student_id, student_name, parent_phone, status \
             FROM attendance_records \
             WHERE attendance_id = $1 \
             ORDER BY id ASC",
        )
        .bind(attendance_id)
        .fetch_all(pool)
        .await
    }

    /// Stamp the fan-out summary on the entry.
    pub async fn mark_processed(
        pool: &PgPool,
        id: DbId,
        notifications_sent: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE attendance \
             SET notifications_sent = $2, notifications_processed_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(notifications_sent)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
