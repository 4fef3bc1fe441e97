//! Handlers scoped under `/institutes/{id}`.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use classpulse_core::types::DbId;
use classpulse_events::ReminderReceipt;

use crate::error::AppResult;
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/institutes/{id}/invoices/{invoice_id}/remind
///
/// Send a payment reminder for one invoice now, outside the daily run.
pub async fn remind_invoice(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Path((institute_id, invoice_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<ReminderReceipt>>> {
    user.ensure_institute(state.store.as_ref(), institute_id)
        .await?;

    let receipt = state
        .reminders
        .remind_invoice(institute_id, invoice_id, Utc::now())
        .await?;
    tracing::info!(user_id = user.user_id, institute_id, invoice_id, "Manual payment reminder sent");

    Ok(Json(DataResponse { data: receipt }))
}
