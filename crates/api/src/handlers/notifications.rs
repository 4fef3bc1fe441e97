//! Handlers for the `/notifications` resource.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use classpulse_core::delivery::{Channel, DeliveryRecord, SubjectKind, SubjectRef};
use classpulse_core::error::CoreError;
use classpulse_core::messages::TEST_MESSAGE;
use classpulse_core::phone;
use classpulse_core::rate_limit::TEST_NOTIFICATION;
use classpulse_core::types::DbId;
use classpulse_db::store::NotifyStore;
use classpulse_events::{DeliveryOutcome, MessageContent, Plan};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /notifications/retry`.
#[derive(Debug, Deserialize)]
pub struct RetryRequest {
    pub kind: SubjectKind,
    pub id: DbId,
}

/// POST /api/v1/notifications/retry
///
/// Re-attempt one failed delivery. Rejected once three attempts have failed.
pub async fn retry(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Json(input): Json<RetryRequest>,
) -> AppResult<Json<DataResponse<DeliveryRecord>>> {
    let subject = SubjectRef::new(input.kind, input.id);
    let store = state.store.as_ref();

    let record = store
        .delivery_record(subject)
        .await?
        .ok_or_else(|| CoreError::not_found("delivery record", subject))?;
    let institute_id = record.institute_id.ok_or_else(|| {
        CoreError::Forbidden("Not authorized for this institute".into())
    })?;
    user.ensure_institute(store, institute_id).await?;

    let request = state.composer.rebuild(store, subject).await?;
    let record = state.orchestrator.retry(&request).await?;
    tracing::info!(
        user_id = user.user_id,
        %subject,
        status = %record.status,
        retry_count = record.retry_count,
        "Manual retry finished"
    );

    Ok(Json(DataResponse { data: record }))
}

/// Body of `POST /notifications/test`.
#[derive(Debug, Deserialize)]
pub struct TestNotificationRequest {
    #[serde(default)]
    pub phone_number: String,
    pub channel: Channel,
}

#[derive(Debug, Serialize)]
pub struct TestNotificationSent {
    pub channel: Channel,
    pub provider: &'static str,
    pub message_id: Option<String>,
}

/// POST /api/v1/notifications/test
///
/// Send the fixed test message on exactly the requested channel. Limited to
/// five per caller per hour; every attempt counts, including rejected ones.
pub async fn send_test(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Json(input): Json<TestNotificationRequest>,
) -> AppResult<Json<DataResponse<TestNotificationSent>>> {
    state
        .rate_limiter
        .enforce(&format!("user:{}", user.user_id), TEST_NOTIFICATION, Utc::now())
        .await?;

    if input.phone_number.trim().is_empty() {
        return Err(CoreError::Validation("Phone number required".into()).into());
    }
    if !phone::is_valid(&input.phone_number) {
        return Err(CoreError::Validation("Invalid phone number format".into()).into());
    }
    let to = phone::normalize(&input.phone_number);

    let content = MessageContent::text_only(TEST_MESSAGE);
    match state
        .orchestrator
        .deliver(Plan::Only(input.channel), &to, &content)
        .await
    {
        DeliveryOutcome::Sent {
            channel,
            provider,
            message_id,
        } => Ok(Json(DataResponse {
            data: TestNotificationSent {
                channel,
                provider,
                message_id,
            },
        })),
        DeliveryOutcome::Failed { provider: None, .. } => Err(CoreError::FailedPrecondition(
            format!("{} channel is not configured", input.channel),
        )
        .into()),
        DeliveryOutcome::Failed { error, .. } => Err(CoreError::Provider(error).into()),
    }
}
