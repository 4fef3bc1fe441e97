//! Change-feed ingestion.
//!
//! The document store posts each entity snapshot to
//! `/triggers/{kind}`; the snapshot is published on the event bus and
//! handled asynchronously by the trigger dispatcher.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use classpulse_core::error::CoreError;
use classpulse_events::{TriggerEvent, TriggerKind};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

const TRIGGER_KEY_HEADER: &str = "x-trigger-key";

#[derive(Debug, Serialize)]
pub struct TriggerAccepted {
    pub kind: String,
    /// Subscribers the event was handed to.
    pub receivers: usize,
}

type HmacSha256 = Hmac<Sha256>;

fn key_tag(trigger_key: &str, value: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(trigger_key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(value.as_bytes());
    mac
}

/// Compare the supplied key with the configured one through their MACs
/// under the configured key, so the check runs in constant time.
fn trigger_key_matches(trigger_key: &str, supplied: &str) -> bool {
    let expected = key_tag(trigger_key, trigger_key).finalize().into_bytes();
    key_tag(trigger_key, supplied).verify_slice(&expected).is_ok()
}

/// POST /api/v1/triggers/{kind}
pub async fn ingest(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    Json(snapshot): Json<serde_json::Value>,
) -> AppResult<(StatusCode, Json<DataResponse<TriggerAccepted>>)> {
    let supplied = headers
        .get(TRIGGER_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !trigger_key_matches(&state.config.trigger_key, supplied) {
        return Err(CoreError::Unauthorized("Invalid trigger key".into()).into());
    }

    let kind: TriggerKind = kind.parse()?;
    let serde_json::Value::Object(mut fields) = snapshot else {
        return Err(AppError::BadRequest("Snapshot must be a JSON object".into()));
    };
    fields.insert("kind".into(), kind.as_str().into());
    let event: TriggerEvent = serde_json::from_value(serde_json::Value::Object(fields))
        .map_err(|e| AppError::BadRequest(format!("Invalid {kind} snapshot: {e}")))?;

    let receivers = state.event_bus.publish(event);
    tracing::info!(trigger = %kind, receivers, "Trigger accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: TriggerAccepted {
                kind: kind.to_string(),
                receivers,
            },
        }),
    ))
}
