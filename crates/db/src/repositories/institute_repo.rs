//! Repositories for `institutes`, `batches`, `students` and `teachers`.

use classpulse_core::types::DbId;
use sqlx::PgPool;

use crate::models::institute::{Batch, Institute, Student};

const INSTITUTE_COLUMNS: &str = "id, name, notifications_enabled, notify_for_present, \
    absent_template, late_template, present_template";

pub struct InstituteRepo;

impl InstituteRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Institute>, sqlx::Error> {
        let query = format!("SELECT {INSTITUTE_COLUMNS} FROM institutes WHERE id = $1");
        sqlx::query_as::<_, Institute>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Keyset page of institutes ordered by id, starting after `after`.
    pub async fn list_page(
        pool: &PgPool,
        after: Option<DbId>,
        limit: i64,
    ) -> Result<Vec<Institute>, sqlx::Error> {
        let query = format!(
            "SELECT {INSTITUTE_COLUMNS} FROM institutes \
             WHERE ($1::BIGINT IS NULL OR id > $1) \
             ORDER BY id ASC \
             LIMIT $2"
        );
        sqlx::query_as::<_, Institute>(&query)
            .bind(after)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}

pub struct BatchRepo;

impl BatchRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Batch>, sqlx::Error> {
        sqlx::query_as::<_, Batch>("SELECT id, institute_id, name FROM batches WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

pub struct StudentRepo;

impl StudentRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Student>, sqlx::Error> {
        sqlx::query_as::<_, Student>(
            "SELECT id, institute_id, batch_id, name, parent_phone FROM students WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

pub struct TeacherRepo;

impl TeacherRepo {
    /// Institute the authenticated user teaches at, if any.
    pub async fn institute_of(pool: &PgPool, user_id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT institute_id FROM teachers WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
