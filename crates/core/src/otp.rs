//! One-time passcode challenges for parent login.
//!
//! A challenge is keyed by [`crate::hashing::phone_key`] and stores only
//! [`crate::hashing::otp_hash`] of the code. At most one live challenge
//! exists per phone; a new request overwrites it.
//!
//! ```text
//! none --request--> challenged --match--> verified   (deleted)
//!                              --late---> expired    (deleted)
//!                              --5th miss--> exhausted (deleted)
//!                              --miss---> challenged (verify_attempts += 1)
//! ```

use chrono::Duration;
use rand::Rng;
use serde::Serialize;

use crate::error::CoreError;
use crate::hashing::otp_hash;
use crate::types::Timestamp;

/// Lifetime of an issued code.
pub const OTP_TTL_MINUTES: i64 = 10;

/// Code requests allowed against one live challenge.
pub const MAX_OTP_REQUESTS: i32 = 3;

/// Wrong codes allowed before the challenge is destroyed.
pub const MAX_VERIFY_ATTEMPTS: i32 = 5;

/// Uniformly random six-digit code in `100000..=999999`.
pub fn generate_code() -> String {
    rand::rng().random_range(100_000..=999_999u32).to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OtpChallenge {
    pub phone_hash: String,
    pub otp_hash: String,
    pub expires_at: Timestamp,
    pub request_attempts: i32,
    pub verify_attempts: i32,
    pub created_at: Timestamp,
}

/// Result of checking a supplied code against a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Code matched; the challenge must be deleted.
    Verified,
    /// Challenge outlived its expiry; it must be deleted.
    Expired,
    /// Attempt cap reached; the challenge must be deleted.
    Exhausted,
    /// Wrong code; `verify_attempts` must be incremented.
    Invalid { remaining: i32 },
}

impl VerifyOutcome {
    pub fn purges_challenge(self) -> bool {
        !matches!(self, VerifyOutcome::Invalid { .. })
    }
}

impl OtpChallenge {
    /// Build the challenge for a fresh code, replacing `previous`.
    ///
    /// An unexpired previous challenge that already absorbed
    /// [`MAX_OTP_REQUESTS`] requests blocks issuance until it expires.
    pub fn issue(
        phone_hash: &str,
        code: &str,
        previous: Option<&OtpChallenge>,
        now: Timestamp,
    ) -> Result<Self, CoreError> {
        let prior_requests = match previous {
            Some(p) if !p.is_expired(now) => p.request_attempts,
            _ => 0,
        };
        if prior_requests >= MAX_OTP_REQUESTS {
            return Err(CoreError::RateLimited(
                "Too many OTP requests. Please try again later.".into(),
            ));
        }

        Ok(Self {
            phone_hash: phone_hash.to_string(),
            otp_hash: otp_hash(code),
            expires_at: now + Duration::minutes(OTP_TTL_MINUTES),
            request_attempts: prior_requests + 1,
            verify_attempts: 0,
            created_at: now,
        })
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// Judge one verification attempt. Does not mutate; the caller applies
    /// the outcome to storage.
    pub fn assess(&self, code: &str, now: Timestamp) -> VerifyOutcome {
        if self.is_expired(now) {
            return VerifyOutcome::Expired;
        }
        if self.verify_attempts >= MAX_VERIFY_ATTEMPTS {
            return VerifyOutcome::Exhausted;
        }
        if otp_hash(code) == self.otp_hash {
            return VerifyOutcome::Verified;
        }
        let used = self.verify_attempts + 1;
        if used >= MAX_VERIFY_ATTEMPTS {
            VerifyOutcome::Exhausted
        } else {
            VerifyOutcome::Invalid {
                remaining: MAX_VERIFY_ATTEMPTS - used,
            }
        }
    }
}
