//! Repository for `leave_requests`.

use classpulse_core::types::DbId;
use sqlx::PgPool;

use crate::models::leave_request::LeaveRequest;

pub struct LeaveRequestRepo;

impl LeaveRequestRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<LeaveRequest>, sqlx::Error> {
        sqlx::query_as::<_, LeaveRequest>(
            "SELECT id, institute_id, batch_id, parent_id, student_id, status, review_notes, \
                    start_date, end_date \
             FROM leave_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
