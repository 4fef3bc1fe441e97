//! Leave request model.

use classpulse_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `leave_requests` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: DbId,
    pub institute_id: DbId,
    pub batch_id: Option<DbId>,
    pub parent_id: DbId,
    pub student_id: DbId,
    /// `pending`, `approved` or `rejected`.
    pub status: String,
    pub review_notes: Option<String>,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
}
