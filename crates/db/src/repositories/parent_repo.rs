//! Repository for `parents`.

use classpulse_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::parent::Parent;

const COLUMNS: &str = "id, institute_id, name, phone, status, student_ids, last_login_at";

pub struct ParentRepo;

impl ParentRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Parent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM parents WHERE id = $1");
        sqlx::query_as::<_, Parent>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// First parent account registered under a normalized phone.
    pub async fn find_by_phone(pool: &PgPool, phone: &str) -> Result<Option<Parent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM parents WHERE phone = $1 ORDER BY id LIMIT 1");
        sqlx::query_as::<_, Parent>(&query)
            .bind(phone)
            .fetch_optional(pool)
            .await
    }

    /// Stamp a successful login and activate a pending account.
    pub async fn record_login(pool: &PgPool, id: DbId, at: Timestamp) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE parents SET last_login_at = $2, status = 'active' WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
