//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly; no router is involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use classpulse_api::error::AppError;
use classpulse_core::error::CoreError;
use classpulse_db::store::StoreError;
use http_body_util::BodyExt;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::not_found("invitation", 42));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "invitation with id 42 not found");
}

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("Phone number required".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Phone number required");
}

#[tokio::test]
async fn rate_limited_returns_429() {
    let err = AppError::Core(CoreError::RateLimited("slow down".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn retry_limit_returns_412_with_attempts() {
    let err = AppError::Core(CoreError::RetryLimitExceeded { attempts: 3 });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(json["code"], "RETRY_LIMIT_EXCEEDED");
    assert_eq!(json["error"], "Maximum retry attempts reached (3)");
}

#[tokio::test]
async fn failed_precondition_returns_412() {
    let err = AppError::Core(CoreError::FailedPrecondition("Invoice is fully paid".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(json["code"], "FAILED_PRECONDITION");
}

#[tokio::test]
async fn expired_returns_410() {
    let err = AppError::Core(CoreError::Expired("OTP expired".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::GONE);
    assert_eq!(json["code"], "EXPIRED");
}

#[tokio::test]
async fn provider_error_returns_502() {
    let err = AppError::Core(CoreError::Provider("gateway timeout".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "PROVIDER_ERROR");
    assert_eq!(json["error"], "gateway timeout");
}

#[tokio::test]
async fn internal_errors_are_sanitized() {
    for err in [
        AppError::Core(CoreError::Internal("secret detail".into())),
        AppError::Store(StoreError::Corrupt("bad row".into())),
        AppError::InternalError("token signing failed".into()),
    ] {
        let (status, json) = error_to_response(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert_eq!(json["error"], "An internal error occurred");
    }
}

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("Snapshot must be a JSON object".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}
