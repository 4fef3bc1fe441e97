#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tokio::sync::Mutex;
use tower::ServiceExt;

use classpulse_api::auth::jwt::{generate_access_token, JwtConfig};
use classpulse_api::config::ServerConfig;
use classpulse_api::router::build_app_router;
use classpulse_api::state::AppState;
use classpulse_core::delivery::Channel;
use classpulse_core::types::DbId;
use classpulse_db::store::memory::MemoryStore;
use classpulse_events::delivery::config::{Msg91Credentials, TwilioCredentials};
use classpulse_events::delivery::{OutboundMessage, ProviderError, SendReceipt, SmsProvider};
use classpulse_events::{DeliveryConfig, EventBus, ProviderClient, ProviderSet};

pub const TRIGGER_KEY: &str = "trigger-test-key";
pub const TWILIO_AUTH_TOKEN: &str = "twilio-test-token";
pub const MSG91_AUTH_KEY: &str = "msg91-test-key";
pub const PUBLIC_BASE_URL: &str = "https://api.classpulse.test";

/// Build a test `ServerConfig` with safe defaults.
///
/// Provider credentials are present so webhook verification is active;
/// the providers themselves are replaced by [`Outbox`] doubles.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "api-test-secret".into(),
            access_token_expiry_mins: 15,
            parent_session_expiry_days: 30,
        },
        app_download_link: "https://get.classpulse.test".into(),
        public_base_url: Some(PUBLIC_BASE_URL.into()),
        trigger_key: TRIGGER_KEY.into(),
        delivery: DeliveryConfig {
            primary_channel: Channel::Whatsapp,
            sms_provider: SmsProvider::Msg91,
            twilio: Some(TwilioCredentials {
                account_sid: "AC-test".into(),
                auth_token: TWILIO_AUTH_TOKEN.into(),
                whatsapp_number: "+14155238886".into(),
                sms_number: None,
            }),
            msg91: Some(Msg91Credentials {
                auth_key: MSG91_AUTH_KEY.into(),
                sender_id: "CLSPLS".into(),
            }),
            templates: Default::default(),
        },
    }
}

// ---------------------------------------------------------------------------
// Provider double
// ---------------------------------------------------------------------------

/// Records every message instead of sending it.
pub struct Outbox {
    name: &'static str,
    channel: Channel,
    fail: bool,
    sent: Mutex<Vec<(String, String)>>,
}

impl Outbox {
    pub fn new(name: &'static str, channel: Channel, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            channel,
            fail,
            sent: Mutex::new(Vec::new()),
        })
    }

    /// `(to, body)` pairs in send order.
    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl ProviderClient for Outbox {
    fn name(&self) -> &'static str {
        self.name
    }

    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(
        &self,
        to: &str,
        message: &OutboundMessage,
    ) -> Result<SendReceipt, ProviderError> {
        if self.fail {
            return Err(ProviderError::Rejected(format!("{} unavailable", self.name)));
        }
        let mut sent = self.sent.lock().await;
        sent.push((to.to_string(), message.body.clone()));
        Ok(SendReceipt {
            message_id: Some(format!("{}-{}", self.name, sent.len())),
        })
    }
}

// ---------------------------------------------------------------------------
// Test application
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub config: ServerConfig,
    pub whatsapp: Arc<Outbox>,
    pub sms: Arc<Outbox>,
    pub event_bus: Arc<EventBus>,
    pub state: AppState,
}

impl TestApp {
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// A staff token for `user_id`.
    pub fn staff_token(&self, user_id: DbId) -> String {
        generate_access_token(user_id, "teacher", &self.config.jwt).unwrap()
    }
}

/// Build the full application router over an in-memory store, with both
/// channels bound to healthy [`Outbox`] doubles.
pub fn build_test_app() -> TestApp {
    build_test_app_with(false, false)
}

/// Like [`build_test_app`] but with each channel optionally failing.
pub fn build_test_app_with(whatsapp_fails: bool, sms_fails: bool) -> TestApp {
    let config = test_config();
    let store = MemoryStore::new();
    let whatsapp = Outbox::new("fake-whatsapp", Channel::Whatsapp, whatsapp_fails);
    let sms = Outbox::new("fake-sms", Channel::Sms, sms_fails);
    let providers = ProviderSet {
        rich: Some(whatsapp.clone() as Arc<dyn ProviderClient>),
        sms: Some(sms.clone() as Arc<dyn ProviderClient>),
        sms_backup: None,
    };
    let event_bus = Arc::new(EventBus::default());

    let state = AppState::new(
        Arc::new(store.clone()),
        config.clone(),
        providers,
        Arc::clone(&event_bus),
    );
    let router = build_app_router(state.clone(), &config);

    TestApp {
        router,
        store,
        config,
        whatsapp,
        sms,
        event_bus,
        state,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}
