//! Teacher invitation model.

use classpulse_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `teacher_invitations` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TeacherInvitation {
    pub id: DbId,
    pub institute_id: DbId,
    pub institute_name: String,
    pub phone: String,
    /// `admin` or `teacher`.
    pub role: String,
    pub invited_by: Option<DbId>,
    pub invited_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub is_accepted: bool,
}
