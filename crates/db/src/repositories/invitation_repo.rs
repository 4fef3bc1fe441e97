//! Repository for `teacher_invitations`.

use classpulse_core::types::DbId;
use sqlx::PgPool;

use crate::models::invitation::TeacherInvitation;

pub struct InvitationRepo;

impl InvitationRepo {
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TeacherInvitation>, sqlx::Error> {
        sqlx::query_as::<_, TeacherInvitation>(
            "SELECT id, institute_id, institute_name, phone, role, invited_by, invited_at, \
                    expires_at, is_accepted \
             FROM teacher_invitations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
