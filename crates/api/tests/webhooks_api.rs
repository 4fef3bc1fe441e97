//! Integration tests for provider status callbacks.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use classpulse_api::handlers::webhooks::twilio_signature;
use common::{body_text, get, MSG91_AUTH_KEY, PUBLIC_BASE_URL, TWILIO_AUTH_TOKEN};
use tower::ServiceExt;

const TWILIO_PATH: &str = "/api/v1/webhooks/twilio";
const MSG91_PATH: &str = "/api/v1/webhooks/msg91";

fn form_pairs(pairs: &[(&str, &str)]) -> (String, Vec<(String, String)>) {
    let encoded = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let owned = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    (encoded, owned)
}

async fn post_twilio(
    app: Router,
    pairs: &[(&str, &str)],
    signature: Option<String>,
) -> axum::http::Response<Body> {
    let (encoded, _) = form_pairs(pairs);
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(TWILIO_PATH)
        .header("content-type", "application/x-www-form-urlencoded");
    if let Some(signature) = signature {
        builder = builder.header("x-twilio-signature", signature);
    }
    app.oneshot(builder.body(Body::from(encoded)).unwrap())
        .await
        .unwrap()
}

fn sign(pairs: &[(&str, &str)]) -> String {
    let (_, owned) = form_pairs(pairs);
    twilio_signature(
        TWILIO_AUTH_TOKEN,
        &format!("{PUBLIC_BASE_URL}{TWILIO_PATH}"),
        &owned,
    )
}

async fn post_msg91(app: Router, authkey: Option<&str>, body: &str) -> axum::http::Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(MSG91_PATH)
        .header("content-type", "application/json");
    if let Some(key) = authkey {
        builder = builder.header("authkey", key);
    }
    app.oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Twilio
// ---------------------------------------------------------------------------

#[tokio::test]
async fn twilio_signed_callback_is_accepted() {
    let app = common::build_test_app();
    let pairs = [("MessageSid", "SM123"), ("MessageStatus", "delivered")];

    let response = post_twilio(app.router(), &pairs, Some(sign(&pairs))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}

#[tokio::test]
async fn twilio_unsigned_or_tampered_callback_is_forbidden() {
    let app = common::build_test_app();
    let pairs = [("MessageSid", "SM123"), ("MessageStatus", "delivered")];

    let response = post_twilio(app.router(), &pairs, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let signature = sign(&pairs);
    let tampered = [("MessageSid", "SM123"), ("MessageStatus", "failed")];
    let response = post_twilio(app.router(), &tampered, Some(signature)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, "Forbidden");
}

#[tokio::test]
async fn twilio_callback_without_status_is_bad_request() {
    let app = common::build_test_app();
    let pairs = [("MessageSid", "SM123")];

    let response = post_twilio(app.router(), &pairs, Some(sign(&pairs))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webhooks_reject_other_methods() {
    let app = common::build_test_app();

    assert_eq!(
        get(app.router(), TWILIO_PATH).await.status(),
        StatusCode::METHOD_NOT_ALLOWED
    );
    assert_eq!(
        get(app.router(), MSG91_PATH).await.status(),
        StatusCode::METHOD_NOT_ALLOWED
    );
}

// ---------------------------------------------------------------------------
// MSG91
// ---------------------------------------------------------------------------

#[tokio::test]
async fn msg91_callback_with_auth_key_is_accepted() {
    let app = common::build_test_app();

    let response = post_msg91(
        app.router(),
        Some(MSG91_AUTH_KEY),
        r#"{"requestId":"req-9","status":"delivered","mobile":"919876543210"}"#,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn msg91_callback_with_wrong_or_missing_key_is_forbidden() {
    let app = common::build_test_app();
    let body = r#"{"requestId":"req-9","status":"delivered"}"#;

    let response = post_msg91(app.router(), Some("guess"), body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_msg91(app.router(), None, body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn msg91_malformed_payload_is_bad_request() {
    let app = common::build_test_app();

    let response = post_msg91(app.router(), Some(MSG91_AUTH_KEY), r#"{"status":"failed"}"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_msg91(app.router(), Some(MSG91_AUTH_KEY), "not json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
