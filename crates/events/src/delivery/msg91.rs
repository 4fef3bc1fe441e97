//! MSG91 flow API binding for the plain SMS channel.

use async_trait::async_trait;
use classpulse_core::delivery::Channel;
use serde::Deserialize;
use serde_json::json;

use super::config::Msg91Credentials;
use super::{OutboundMessage, ProviderClient, ProviderError, SendReceipt};

const FLOW_URL: &str = "https://api.msg91.com/api/v5/flow/";

#[derive(Debug, Deserialize)]
struct FlowResponse {
    #[serde(rename = "type")]
    kind: String,
    request_id: Option<String>,
    message: Option<String>,
}

pub struct Msg91Sms {
    http: reqwest::Client,
    creds: Msg91Credentials,
}

impl Msg91Sms {
    pub fn new(http: reqwest::Client, creds: Msg91Credentials) -> Self {
        Self { http, creds }
    }

    /// Flow payload. MSG91 wants the number with country code and no `+`;
    /// the text travels in the template's `VAR1` slot.
    fn payload(&self, to: &str, message: &OutboundMessage) -> serde_json::Value {
        json!({
            "template_id": message.template_id,
            "sender": self.creds.sender_id,
            "short_url": "0",
            "mobiles": to.trim_start_matches('+'),
            "VAR1": message.body,
        })
    }
}

#[async_trait]
impl ProviderClient for Msg91Sms {
    fn name(&self) -> &'static str {
        "msg91"
    }

    fn channel(&self) -> Channel {
        Channel::Sms
    }

    async fn send(
        &self,
        to: &str,
        message: &OutboundMessage,
    ) -> Result<SendReceipt, ProviderError> {
        let response = self
            .http
            .post(FLOW_URL)
            .header("authkey", &self.creds.auth_key)
            .json(&self.payload(to, message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: FlowResponse = response.json().await?;
        if body.kind == "success" {
            Ok(SendReceipt {
                message_id: body.request_id,
            })
        } else {
            Err(ProviderError::Rejected(
                body.message.unwrap_or_else(|| "MSG91 error".into()),
            ))
        }
    }
}
