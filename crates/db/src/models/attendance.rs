//! Attendance entries and their per-student records.

use classpulse_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `attendance` table: one submitted roll call.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub id: DbId,
    pub institute_id: DbId,
    pub batch_id: DbId,
    pub date: Timestamp,
    pub submitted_by: Option<DbId>,
    pub submitted_at: Timestamp,
}

/// A row from the `attendance_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceRecord {
    pub id: DbId,
    pub attendance_id: DbId,
    pub student_id: DbId,
    pub student_name: String,
    pub parent_phone: Option<String>,
    /// One of `present`, `absent`, `late`.
    pub status: String,
}
