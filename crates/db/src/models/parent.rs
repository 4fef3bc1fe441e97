//! Parent account model.

use classpulse_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Statuses that may log in with an OTP.
pub const LOGIN_STATUSES: [&str; 2] = ["active", "pending"];

/// A row from the `parents` table. `phone` is stored normalized.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Parent {
    pub id: DbId,
    pub institute_id: DbId,
    pub name: String,
    pub phone: String,
    pub status: String,
    pub student_ids: Vec<DbId>,
    pub last_login_at: Option<Timestamp>,
}

impl Parent {
    pub fn can_log_in(&self) -> bool {
        LOGIN_STATUSES.contains(&self.status.as_str())
    }
}
