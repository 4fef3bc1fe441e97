//! Handlers for the `/invitations` resource.

use axum::extract::{Path, State};
use axum::Json;
use classpulse_core::delivery::{DeliveryRecord, DeliveryStatus};
use classpulse_core::error::CoreError;
use classpulse_core::types::DbId;
use classpulse_db::store::NotifyStore;

use crate::error::AppResult;
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/invitations/{id}/resend
///
/// Send the reminder wording of a pending invitation again.
pub async fn resend(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path(invitation_id): Path<DbId>,
) -> AppResult<Json<DataResponse<DeliveryRecord>>> {
    let invitation = state
        .store
        .invitation(invitation_id)
        .await?
        .ok_or_else(|| CoreError::not_found("invitation", invitation_id))?;
    user.ensure_institute(state.store.as_ref(), invitation.institute_id)
        .await?;

    if invitation.is_accepted {
        return Err(CoreError::FailedPrecondition("Invitation already accepted".into()).into());
    }

    let request = state.composer.invitation(&invitation, true);
    let record = state.orchestrator.resend(&request).await?;
    if record.status != DeliveryStatus::Sent {
        let error = record.error.clone().unwrap_or_default();
        return Err(match record.provider {
            None => CoreError::FailedPrecondition(error),
            Some(_) => CoreError::Provider(error),
        }
        .into());
    }

    tracing::info!(
        user_id = user.user_id,
        invitation_id,
        provider = record.provider.as_deref().unwrap_or_default(),
        "Invitation resent"
    );
    Ok(Json(DataResponse { data: record }))
}
