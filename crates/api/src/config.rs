use classpulse_events::DeliveryConfig;

use crate::auth::jwt::JwtConfig;

/// Default link sent in teacher invitations.
const DEFAULT_APP_DOWNLOAD_LINK: &str = "https://apps.apple.com/app/classpulse";

/// Server configuration loaded from environment variables.
///
/// Loaded once in `main` and shared through [`AppState`](crate::state::AppState).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT signing secret and token lifetimes.
    pub jwt: JwtConfig,
    /// Link embedded in invitation messages.
    pub app_download_link: String,
    /// Externally visible origin, used to rebuild the URL Twilio signed.
    pub public_base_url: Option<String>,
    /// Shared secret the change feed sends in `x-trigger-key`.
    pub trigger_key: String,
    /// Provider credentials, channel policy and template ids.
    pub delivery: DeliveryConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `APP_DOWNLOAD_LINK`    | App Store listing          |
    /// | `PUBLIC_BASE_URL`      | unset                      |
    /// | `TRIGGER_KEY`          | **required**               |
    ///
    /// JWT settings come from [`JwtConfig::from_env`], provider settings from
    /// [`DeliveryConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics on unparsable numbers or a missing `TRIGGER_KEY`.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let app_download_link = std::env::var("APP_DOWNLOAD_LINK")
            .unwrap_or_else(|_| DEFAULT_APP_DOWNLOAD_LINK.into());

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .ok()
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let trigger_key =
            std::env::var("TRIGGER_KEY").expect("TRIGGER_KEY must be set in the environment");
        assert!(!trigger_key.is_empty(), "TRIGGER_KEY must not be empty");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            app_download_link,
            public_base_url,
            trigger_key,
            delivery: DeliveryConfig::from_env(),
        }
    }
}
