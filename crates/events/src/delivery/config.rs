//! Provider credentials, channel policy and template ids.
//!
//! Loaded once at start-up and passed into [`ProviderSet::from_config`] and
//! the orchestrator. A provider whose credentials are absent is left out of
//! the channel chain.
//!
//! [`ProviderSet::from_config`]: super::ProviderSet::from_config

use classpulse_core::delivery::Channel;
use classpulse_core::render::{AttendanceStatus, RichTemplateIds};

/// Default Twilio WhatsApp sender (the Twilio sandbox number).
const DEFAULT_WHATSAPP_NUMBER: &str = "+14155238886";

/// Default MSG91 sender id.
const DEFAULT_MSG91_SENDER_ID: &str = "CLSPLS";

/// Which gateway serves the plain SMS channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmsProvider {
    Msg91,
    Twilio,
}

#[derive(Debug, Clone)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender for the WhatsApp channel, without the `whatsapp:` prefix.
    pub whatsapp_number: String,
    /// Sender for Twilio SMS; Twilio SMS is unavailable without it.
    pub sms_number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Msg91Credentials {
    pub auth_key: String,
    pub sender_id: String,
}

/// Registered template ids for attendance messages.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    /// WhatsApp Content API template SIDs.
    pub rich: RichTemplateIds,
    /// MSG91 DLT template for absences.
    pub sms_absent: Option<String>,
    /// MSG91 DLT template for late arrivals.
    pub sms_late: Option<String>,
}

impl TemplateCatalog {
    pub fn sms_for_status(&self, status: AttendanceStatus) -> Option<String> {
        match status {
            AttendanceStatus::Absent => self.sms_absent.clone(),
            AttendanceStatus::Late => self.sms_late.clone(),
            AttendanceStatus::Present => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub primary_channel: Channel,
    pub sms_provider: SmsProvider,
    pub twilio: Option<TwilioCredentials>,
    pub msg91: Option<Msg91Credentials>,
    pub templates: TemplateCatalog,
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl DeliveryConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                        | Default         |
    /// |---------------------------------|-----------------|
    /// | `PRIMARY_CHANNEL`               | `whatsapp`      |
    /// | `SMS_PROVIDER`                  | `msg91`         |
    /// | `TWILIO_ACCOUNT_SID`            | unset           |
    /// | `TWILIO_AUTH_TOKEN`             | unset           |
    /// | `TWILIO_WHATSAPP_NUMBER`        | `+14155238886`  |
    /// | `TWILIO_SMS_NUMBER`             | unset           |
    /// | `MSG91_AUTH_KEY`                | unset           |
    /// | `MSG91_SENDER_ID`               | `CLSPLS`        |
    /// | `MSG91_ABSENT_TEMPLATE_ID`      | unset           |
    /// | `MSG91_LATE_TEMPLATE_ID`        | unset           |
    /// | `WHATSAPP_ABSENT_TEMPLATE_SID`  | unset           |
    /// | `WHATSAPP_LATE_TEMPLATE_SID`    | unset           |
    /// | `WHATSAPP_PRESENT_TEMPLATE_SID` | unset           |
    pub fn from_env() -> Self {
        let primary_channel = match optional("PRIMARY_CHANNEL") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Unknown PRIMARY_CHANNEL, using whatsapp");
                Channel::Whatsapp
            }),
            None => Channel::Whatsapp,
        };

        let sms_provider = match optional("SMS_PROVIDER").as_deref() {
            Some("twilio") => SmsProvider::Twilio,
            _ => SmsProvider::Msg91,
        };

        let twilio = match (optional("TWILIO_ACCOUNT_SID"), optional("TWILIO_AUTH_TOKEN")) {
            (Some(account_sid), Some(auth_token)) => Some(TwilioCredentials {
                account_sid,
                auth_token,
                whatsapp_number: optional("TWILIO_WHATSAPP_NUMBER")
                    .unwrap_or_else(|| DEFAULT_WHATSAPP_NUMBER.to_string()),
                sms_number: optional("TWILIO_SMS_NUMBER"),
            }),
            _ => None,
        };

        let msg91 = optional("MSG91_AUTH_KEY").map(|auth_key| Msg91Credentials {
            auth_key,
            sender_id: optional("MSG91_SENDER_ID")
                .unwrap_or_else(|| DEFAULT_MSG91_SENDER_ID.to_string()),
        });

        Self {
            primary_channel,
            sms_provider,
            twilio,
            msg91,
            templates: TemplateCatalog {
                rich: RichTemplateIds {
                    absent: optional("WHATSAPP_ABSENT_TEMPLATE_SID"),
                    late: optional("WHATSAPP_LATE_TEMPLATE_SID"),
                    present: optional("WHATSAPP_PRESENT_TEMPLATE_SID"),
                },
                sms_absent: optional("MSG91_ABSENT_TEMPLATE_ID"),
                sms_late: optional("MSG91_LATE_TEMPLATE_ID"),
            },
        }
    }

    /// Twilio auth token, the secret behind `X-Twilio-Signature`.
    pub fn twilio_auth_token(&self) -> Option<&str> {
        self.twilio.as_ref().map(|t| t.auth_token.as_str())
    }

    /// MSG91 auth key, echoed back in the webhook `authkey` header.
    pub fn msg91_auth_key(&self) -> Option<&str> {
        self.msg91.as_ref().map(|m| m.auth_key.as_str())
    }
}
