//! Role and institute-scope checks.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use classpulse_core::error::CoreError;
use classpulse_core::types::DbId;
use classpulse_db::store::NotifyStore;

use super::auth::AuthUser;
use crate::auth::jwt::ROLE_PARENT;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Requires a staff token (teacher or institute admin). Parent sessions
/// are rejected with 403 Forbidden.
///
/// ```ignore
/// async fn staff_only(RequireStaff(user): RequireStaff) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireStaff(pub AuthUser);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role == ROLE_PARENT {
            return Err(AppError::Core(CoreError::Forbidden(
                "Staff role required".into(),
            )));
        }
        Ok(RequireStaff(user))
    }
}

impl AuthUser {
    /// Reject unless the caller teaches at `institute_id`.
    ///
    /// Runs before any recipient data of the institute is read.
    pub async fn ensure_institute(
        &self,
        store: &dyn NotifyStore,
        institute_id: DbId,
    ) -> AppResult<()> {
        let own = store.teacher_institute(self.user_id).await?;
        if own != Some(institute_id) {
            tracing::warn!(
                user_id = self.user_id,
                institute_id,
                "Caller not authorized for institute"
            );
            return Err(AppError::Core(CoreError::Forbidden(
                "Not authorized for this institute".into(),
            )));
        }
        Ok(())
    }
}
