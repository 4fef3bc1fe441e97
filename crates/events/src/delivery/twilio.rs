//! Twilio Messages API bindings: WhatsApp (rich) and SMS (plain).
//!
//! Both post form-encoded requests to
//! `/2010-04-01/Accounts/{sid}/Messages.json` with HTTP basic auth. WhatsApp
//! uses a Content API template (`ContentSid` + `ContentVariables`) when one
//! is given, a freeform `Body` otherwise.

use async_trait::async_trait;
use classpulse_core::delivery::Channel;
use serde::Deserialize;

use super::config::TwilioCredentials;
use super::{OutboundMessage, ProviderClient, ProviderError, SendReceipt};

const API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Success body: only the message SID is used.
#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
}

/// Error body returned with 4xx/5xx statuses.
#[derive(Debug, Deserialize)]
struct ErrorResource {
    message: String,
}

async fn create_message(
    http: &reqwest::Client,
    creds: &TwilioCredentials,
    form: &[(&'static str, String)],
) -> Result<SendReceipt, ProviderError> {
    let url = format!("{API_BASE}/Accounts/{}/Messages.json", creds.account_sid);
    let response = http
        .post(url)
        .basic_auth(&creds.account_sid, Some(&creds.auth_token))
        .form(form)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResource>(&text)
            .map(|e| e.message)
            .unwrap_or(text);
        return Err(ProviderError::HttpStatus {
            status: status.as_u16(),
            message,
        });
    }

    let resource: MessageResource = response.json().await?;
    Ok(SendReceipt {
        message_id: Some(resource.sid),
    })
}

// ---------------------------------------------------------------------------
// WhatsApp
// ---------------------------------------------------------------------------

pub struct TwilioWhatsApp {
    http: reqwest::Client,
    creds: TwilioCredentials,
}

impl TwilioWhatsApp {
    pub fn new(http: reqwest::Client, creds: TwilioCredentials) -> Self {
        Self { http, creds }
    }

    fn form(&self, to: &str, message: &OutboundMessage) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("From", format!("whatsapp:{}", self.creds.whatsapp_number)),
            ("To", format!("whatsapp:{to}")),
        ];
        match &message.template_id {
            Some(sid) => {
                form.push(("ContentSid", sid.clone()));
                form.push((
                    "ContentVariables",
                    serde_json::to_string(&message.variables).unwrap_or_else(|_| "{}".into()),
                ));
            }
            None => form.push(("Body", message.body.clone())),
        }
        form
    }
}

#[async_trait]
impl ProviderClient for TwilioWhatsApp {
    fn name(&self) -> &'static str {
        "twilio"
    }

    fn channel(&self) -> Channel {
        Channel::Whatsapp
    }

    async fn send(
        &self,
        to: &str,
        message: &OutboundMessage,
    ) -> Result<SendReceipt, ProviderError> {
        if message.template_id.is_none() {
            tracing::debug!(to, "No content template, sending freeform WhatsApp body");
        }
        create_message(&self.http, &self.creds, &self.form(to, message)).await
    }
}

// ---------------------------------------------------------------------------
// SMS
// ---------------------------------------------------------------------------

pub struct TwilioSms {
    http: reqwest::Client,
    creds: TwilioCredentials,
}

impl TwilioSms {
    pub fn new(http: reqwest::Client, creds: TwilioCredentials) -> Self {
        Self { http, creds }
    }

    fn form(&self, to: &str, message: &OutboundMessage) -> Vec<(&'static str, String)> {
        vec![
            ("From", self.creds.sms_number.clone().unwrap_or_default()),
            ("To", to.to_string()),
            ("Body", message.body.clone()),
        ]
    }
}

#[async_trait]
impl ProviderClient for TwilioSms {
    fn name(&self) -> &'static str {
        "twilio"
    }

    fn channel(&self) -> Channel {
        Channel::Sms
    }

    async fn send(
        &self,
        to: &str,
        message: &OutboundMessage,
    ) -> Result<SendReceipt, ProviderError> {
        if self.creds.sms_number.is_none() {
            return Err(ProviderError::Rejected("Twilio SMS not configured".into()));
        }
        create_message(&self.http, &self.creds, &self.form(to, message)).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
