//! Provider delivery-status callbacks.
//!
//! Both receivers authenticate the caller, then log the reported status
//! keyed by provider message id. Responses are plain text: 200 on success,
//! 403 on a bad signature or key, 400 on a malformed payload. Other methods
//! get 405 from the router.

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::{OriginalUri, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::{Form, Json};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha1::Sha1;

use crate::state::AppState;

type HmacSha1 = Hmac<Sha1>;

type WebhookReply = (StatusCode, &'static str);

const OK: WebhookReply = (StatusCode::OK, "OK");
const FORBIDDEN: WebhookReply = (StatusCode::FORBIDDEN, "Forbidden");
const BAD_REQUEST: WebhookReply = (StatusCode::BAD_REQUEST, "Bad request");

// ---------------------------------------------------------------------------
// Twilio
// ---------------------------------------------------------------------------

/// Twilio's request signature: base64 HMAC-SHA1, keyed by the auth token,
/// over the full callback URL followed by every form parameter as
/// `name + value`, sorted by name.
pub fn twilio_signature(auth_token: &str, url: &str, params: &[(String, String)]) -> String {
    STANDARD.encode(twilio_mac(auth_token, url, params).finalize().into_bytes())
}

fn twilio_mac(auth_token: &str, url: &str, params: &[(String, String)]) -> HmacSha1 {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();

    let mut mac =
        HmacSha1::new_from_slice(auth_token.as_bytes()).expect("HMAC accepts any key length");
    mac.update(url.as_bytes());
    for (name, value) in sorted {
        mac.update(name.as_bytes());
        mac.update(value.as_bytes());
    }
    mac
}

fn twilio_signature_matches(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
    header: &str,
) -> bool {
    let Ok(expected) = STANDARD.decode(header.trim()) else {
        return false;
    };
    twilio_mac(auth_token, url, params)
        .verify_slice(&expected)
        .is_ok()
}

/// The URL Twilio signed: the configured public origin, or the `Host`
/// header over https, followed by the request path and query.
fn callback_url(state: &AppState, headers: &HeaderMap, uri: &Uri) -> String {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    match &state.config.public_base_url {
        Some(base) => format!("{base}{path}"),
        None => {
            let host = headers
                .get("host")
                .and_then(|h| h.to_str().ok())
                .unwrap_or_default();
            format!("https://{host}{path}")
        }
    }
}

fn form_value<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
}

/// POST /api/v1/webhooks/twilio
pub async fn twilio(
    State(state): State<AppState>,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> WebhookReply {
    let Ok(Form(params)) = form else {
        return BAD_REQUEST;
    };

    if let Some(auth_token) = state.config.delivery.twilio_auth_token() {
        let signature = headers
            .get("x-twilio-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let url = callback_url(&state, &headers, &uri);
        if !twilio_signature_matches(auth_token, &url, &params, signature) {
            tracing::warn!(webhook = "twilio", "Invalid Twilio webhook signature");
            return FORBIDDEN;
        }
    }

    let (Some(message_sid), Some(status)) = (
        form_value(&params, "MessageSid"),
        form_value(&params, "MessageStatus"),
    ) else {
        return BAD_REQUEST;
    };

    tracing::info!(
        webhook = "twilio",
        message_id = message_sid,
        status,
        error_code = form_value(&params, "ErrorCode"),
        "Twilio webhook received"
    );
    OK
}

// ---------------------------------------------------------------------------
// MSG91
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Msg91Status {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
}

/// POST /api/v1/webhooks/msg91
pub async fn msg91(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Msg91Status>, JsonRejection>,
) -> WebhookReply {
    if let Some(auth_key) = state.config.delivery.msg91_auth_key() {
        let supplied = headers.get("authkey").and_then(|v| v.to_str().ok());
        if supplied != Some(auth_key) {
            tracing::warn!(webhook = "msg91", "Invalid MSG91 webhook auth key");
            return FORBIDDEN;
        }
    }

    let Ok(Json(payload)) = body else {
        return BAD_REQUEST;
    };
    let Some(request_id) = payload.request_id.filter(|id| !id.is_empty()) else {
        return BAD_REQUEST;
    };

    tracing::info!(
        webhook = "msg91",
        message_id = %request_id,
        status = payload.status.as_deref(),
        mobile = payload.mobile.as_deref(),
        "MSG91 webhook received"
    );
    OK
}
