//! HS256 token generation and validation.
//!
//! Staff (teachers, institute admins) carry short-lived access tokens. A
//! parent who verified an OTP receives a longer session token whose claims
//! carry the parent role and the parent's institute.

use classpulse_core::types::DbId;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role claim of a parent session.
pub const ROLE_PARENT: &str = "parent";

/// JWT claims embedded in every token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's or parent's database id.
    pub sub: DbId,
    /// `teacher`, `admin` or `parent`.
    pub role: String,
    /// Institute scope; always present on parent sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institute_id: Option<DbId>,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4).
    pub jti: String,
}

/// Configuration for token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Staff access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
    /// Parent session lifetime in days (default: 30).
    pub parent_session_expiry_days: i64,
}

const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
const DEFAULT_PARENT_SESSION_EXPIRY_DAYS: i64 = 30;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                      | Required | Default |
    /// |------------------------------|----------|---------|
    /// | `JWT_SECRET`                 | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`     | no       | `15`    |
    /// | `PARENT_SESSION_EXPIRY_DAYS` | no       | `30`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        let parent_session_expiry_days: i64 = std::env::var("PARENT_SESSION_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_PARENT_SESSION_EXPIRY_DAYS.to_string())
            .parse()
            .expect("PARENT_SESSION_EXPIRY_DAYS must be a valid i64");

        Self {
            secret,
            access_token_expiry_mins,
            parent_session_expiry_days,
        }
    }
}

fn sign(claims: &Claims, config: &JwtConfig) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(), // HS256
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Generate a staff access token.
pub fn generate_access_token(
    user_id: DbId,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    sign(
        &Claims {
            sub: user_id,
            role: role.to_string(),
            institute_id: None,
            exp: now + config.access_token_expiry_mins * 60,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        },
        config,
    )
}

/// Generate the session token issued after a successful OTP verification.
pub fn generate_parent_session(
    parent_id: DbId,
    institute_id: DbId,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    sign(
        &Claims {
            sub: parent_id,
            role: ROLE_PARENT.to_string(),
            institute_id: Some(institute_id),
            exp: now + config.parent_session_expiry_days * 86_400,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        },
        config,
    )
}

/// Validate and decode a token, returning the embedded [`Claims`].
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}
