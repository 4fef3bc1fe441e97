//! Parent OTP login handlers. Both endpoints are public.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::auth::otp::{OtpRequested, ParentSession};
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OtpRequestBody {
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpVerifyBody {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub otp: String,
}

/// POST /api/v1/parents/otp/request
pub async fn request_otp(
    State(state): State<AppState>,
    Json(input): Json<OtpRequestBody>,
) -> AppResult<Json<DataResponse<OtpRequested>>> {
    let requested = state.otp.request(&input.phone, Utc::now()).await?;
    Ok(Json(DataResponse { data: requested }))
}

/// POST /api/v1/parents/otp/verify
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(input): Json<OtpVerifyBody>,
) -> AppResult<Json<DataResponse<ParentSession>>> {
    let session = state
        .otp
        .verify(&input.phone, &input.otp, Utc::now())
        .await?;
    Ok(Json(DataResponse { data: session }))
}
