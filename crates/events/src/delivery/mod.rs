//! Provider channels for outbound parent messages.
//!
//! Every concrete binding implements [`ProviderClient`]: one `send` with a
//! named identity. The orchestrator holds a short ordered list of them and
//! walks it until one succeeds.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use classpulse_core::delivery::Channel;

pub mod config;
pub mod msg91;
pub mod twilio;

pub use config::{DeliveryConfig, SmsProvider, TemplateCatalog};

// ---------------------------------------------------------------------------
// Message and result types
// ---------------------------------------------------------------------------

/// What a single provider call carries.
///
/// A rich provider sends `template_id` + `variables` when a template id is
/// present and falls back to `body` otherwise. A plain SMS provider sends
/// `body`, tagged with `template_id` where the gateway requires a registered
/// template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutboundMessage {
    pub template_id: Option<String>,
    pub variables: BTreeMap<String, String>,
    pub body: String,
}

impl OutboundMessage {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: Option<String>,
}

/// Error type for a failed provider call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("Provider returned HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// The provider accepted the call but reported a failure in its body.
    #[error("{0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// ProviderClient
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Short provider name recorded on delivery records (`twilio`, `msg91`).
    fn name(&self) -> &'static str;

    fn channel(&self) -> Channel;

    /// Send one message to a normalized `+<country><number>` destination.
    async fn send(&self, to: &str, message: &OutboundMessage)
        -> Result<SendReceipt, ProviderError>;
}

/// The configured bindings, one slot per role.
#[derive(Clone, Default)]
pub struct ProviderSet {
    /// Rich template channel.
    pub rich: Option<Arc<dyn ProviderClient>>,
    /// Plain SMS channel chosen by `SMS_PROVIDER`.
    pub sms: Option<Arc<dyn ProviderClient>>,
    /// Second plain SMS binding tried after `sms`.
    pub sms_backup: Option<Arc<dyn ProviderClient>>,
}

impl ProviderSet {
    /// Build the bindings whose credentials are present in `config`.
    pub fn from_config(config: &DeliveryConfig, http: reqwest::Client) -> Self {
        let twilio = config.twilio.clone();
        let msg91 = config.msg91.clone();

        let rich = twilio.clone().map(|creds| {
            Arc::new(twilio::TwilioWhatsApp::new(http.clone(), creds)) as Arc<dyn ProviderClient>
        });
        let twilio_sms = twilio.and_then(|creds| {
            creds.sms_number.clone().map(|_| {
                Arc::new(twilio::TwilioSms::new(http.clone(), creds)) as Arc<dyn ProviderClient>
            })
        });
        let msg91_sms = msg91.map(|creds| {
            Arc::new(msg91::Msg91Sms::new(http.clone(), creds)) as Arc<dyn ProviderClient>
        });

        let (sms, sms_backup) = match config.sms_provider {
            SmsProvider::Msg91 => (msg91_sms, twilio_sms),
            SmsProvider::Twilio => (twilio_sms, None),
        };

        Self {
            rich,
            sms,
            sms_backup,
        }
    }

    /// Names of the configured bindings, for the start-up log line.
    pub fn describe(&self) -> Vec<&'static str> {
        [&self.rich, &self.sms, &self.sms_backup]
            .into_iter()
            .flatten()
            .map(|p| p.name())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
