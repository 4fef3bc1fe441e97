//! Parent login by one-time passcode.
//!
//! `request` issues a six-digit code over SMS to a known parent phone;
//! `verify` consumes it and returns a signed parent session. Only the
//! SHA-256 of a code is ever stored, and codes are never logged.

use std::sync::Arc;

use classpulse_core::error::CoreError;
use classpulse_core::hashing;
use classpulse_core::messages;
use classpulse_core::otp::{self, OtpChallenge, VerifyOutcome, OTP_TTL_MINUTES};
use classpulse_core::phone;
use classpulse_core::types::{DbId, Timestamp};
use classpulse_db::models::otp::PARENT_LOGIN;
use classpulse_db::store::NotifyStore;
use classpulse_events::{DeliveryOrchestrator, DeliveryOutcome, MessageContent, Plan};
use serde::Serialize;

use crate::auth::jwt::{generate_parent_session, JwtConfig};
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
pub struct OtpRequested {
    pub message: &'static str,
    /// Seconds until the code expires.
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct ParentProfile {
    pub id: DbId,
    pub phone: String,
    pub name: String,
    pub institute_id: DbId,
    pub student_ids: Vec<DbId>,
}

#[derive(Debug, Serialize)]
pub struct ParentSession {
    pub token: String,
    pub parent: ParentProfile,
}

pub struct OtpAuthenticator {
    orchestrator: Arc<DeliveryOrchestrator>,
    jwt: JwtConfig,
}

impl OtpAuthenticator {
    pub fn new(orchestrator: Arc<DeliveryOrchestrator>, jwt: JwtConfig) -> Self {
        Self { orchestrator, jwt }
    }

    fn store(&self) -> &dyn NotifyStore {
        self.orchestrator.store().as_ref()
    }

    /// Issue and send a code to `raw_phone`.
    ///
    /// The challenge is persisted only after the request-count check and the
    /// parent lookup pass, so a rejected request leaves storage untouched.
    pub async fn request(&self, raw_phone: &str, now: Timestamp) -> AppResult<OtpRequested> {
        if raw_phone.trim().is_empty() {
            return Err(CoreError::Validation("Phone number is required".into()).into());
        }
        if !phone::is_valid(raw_phone) {
            return Err(CoreError::Validation("Invalid phone number format".into()).into());
        }
        let normalized = phone::normalize(raw_phone);
        let key = hashing::phone_key(&normalized);

        let previous = self.store().otp_challenge(&key).await?;
        let code = otp::generate_code();
        let challenge = OtpChallenge::issue(&key, &code, previous.as_ref(), now)?;

        let parent = self
            .store()
            .parent_by_phone(&normalized)
            .await?
            .ok_or_else(|| CoreError::not_found("parent account", &normalized))?;
        if !parent.can_log_in() {
            return Err(CoreError::Forbidden(
                "Your account is inactive. Please contact your institute.".into(),
            )
            .into());
        }

        self.store().put_otp_challenge(&challenge).await?;

        let content = MessageContent::text_only(messages::otp(&code));
        let channel = match self
            .orchestrator
            .deliver(Plan::SmsOnly, &normalized, &content)
            .await
        {
            DeliveryOutcome::Sent { channel, .. } => channel,
            DeliveryOutcome::Failed { error, .. } => {
                tracing::error!(phone = %normalized, error = %error, "Failed to send OTP");
                return Err(CoreError::Provider("Failed to send OTP. Please try again.".into()).into());
            }
        };

        self.store()
            .append_otp_log(&normalized, PARENT_LOGIN, channel.as_str())
            .await?;
        tracing::info!(
            phone = %normalized,
            %channel,
            request_attempts = challenge.request_attempts,
            "OTP sent"
        );

        Ok(OtpRequested {
            message: "OTP sent successfully",
            expires_in: OTP_TTL_MINUTES * 60,
        })
    }

    /// Check `code` for `raw_phone` and open a parent session on a match.
    pub async fn verify(
        &self,
        raw_phone: &str,
        code: &str,
        now: Timestamp,
    ) -> AppResult<ParentSession> {
        if raw_phone.trim().is_empty() || code.trim().is_empty() {
            return Err(
                CoreError::Validation("Phone number and OTP are required".into()).into(),
            );
        }
        let normalized = phone::normalize(raw_phone);
        let key = hashing::phone_key(&normalized);

        let challenge = self
            .store()
            .otp_challenge(&key)
            .await?
            .ok_or_else(|| CoreError::not_found("otp challenge", &normalized))?;

        let outcome = challenge.assess(code, now);
        if outcome.purges_challenge() {
            self.store().delete_otp_challenge(&key).await?;
        }
        match outcome {
            VerifyOutcome::Verified => {}
            VerifyOutcome::Expired => {
                return Err(
                    CoreError::Expired("OTP has expired. Please request a new one.".into()).into(),
                );
            }
            VerifyOutcome::Exhausted => {
                tracing::warn!(phone = %normalized, "OTP verify attempts exhausted");
                return Err(CoreError::RateLimited(
                    "Too many incorrect attempts. Please request a new OTP.".into(),
                )
                .into());
            }
            VerifyOutcome::Invalid { remaining } => {
                self.store().increment_otp_verify_attempts(&key).await?;
                return Err(CoreError::Unauthorized(format!(
                    "Invalid OTP. {remaining} attempts remaining."
                ))
                .into());
            }
        }

        let parent = self
            .store()
            .parent_by_phone(&normalized)
            .await?
            .ok_or_else(|| CoreError::not_found("parent account", &normalized))?;
        self.store().record_parent_login(parent.id, now).await?;

        let token = generate_parent_session(parent.id, parent.institute_id, &self.jwt)
            .map_err(|e| AppError::InternalError(format!("Failed to sign session: {e}")))?;
        tracing::info!(parent_id = parent.id, institute_id = parent.institute_id, "Parent logged in");

        Ok(ParentSession {
            token,
            parent: ParentProfile {
                id: parent.id,
                phone: parent.phone,
                name: parent.name,
                institute_id: parent.institute_id,
                student_ids: parent.student_ids,
            },
        })
    }
}
