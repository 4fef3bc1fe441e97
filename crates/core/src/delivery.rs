//! Per-recipient delivery state.
//!
//! A [`DeliveryRecord`] is written once per recipient per notification and
//! only ever mutated by the delivery orchestrator. Transitions:
//!
//! ```text
//! pending --send ok--> sent
//! pending --send failed--> failed (retry_count += 1)
//! failed --manual retry, retry_count < 3--> pending
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Total failed attempts after which manual retry is refused.
pub const MAX_DELIVERY_ATTEMPTS: i32 = 3;

/// Failure reason recorded when the recipient phone does not validate.
pub const INVALID_RECIPIENT: &str = "invalid-recipient";

/// Failure reason recorded when no provider is configured for a request.
pub const NO_PROVIDER: &str = "No provider configured";

macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(CoreError::Validation(format!(
                        concat!("Unknown ", stringify!($name), " '{}'"),
                        other
                    ))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

text_enum!(DeliveryStatus {
    Pending => "pending",
    Sent => "sent",
    Failed => "failed",
});

/// The transport a message went out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Rich template channel (WhatsApp Business API).
    Whatsapp,
    /// Plain SMS gateway.
    Sms,
}

text_enum!(Channel {
    Whatsapp => "whatsapp",
    Sms => "sms",
});

/// What a notification is about; with an id this names its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubjectKind {
    Attendance,
    Invitation,
    LeaveDecision,
    PaymentReminder,
    Test,
}

text_enum!(SubjectKind {
    Attendance => "attendance",
    Invitation => "invitation",
    LeaveDecision => "leave-decision",
    PaymentReminder => "payment-reminder",
    Test => "test",
});

/// Identifies the entity that owns a delivery record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectRef {
    pub kind: SubjectKind,
    pub id: DbId,
}

impl SubjectRef {
    pub fn new(kind: SubjectKind, id: DbId) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryRecord {
    pub subject: SubjectRef,
    pub institute_id: Option<DbId>,
    /// Recipient phone as stored on the owning entity.
    pub recipient: String,
    pub status: DeliveryStatus,
    pub channel: Option<Channel>,
    pub provider: Option<String>,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
    pub retry_count: i32,
    pub last_attempt_at: Option<Timestamp>,
    pub sent_at: Option<Timestamp>,
}

impl DeliveryRecord {
    pub fn pending(subject: SubjectRef, institute_id: Option<DbId>, recipient: &str) -> Self {
        Self {
            subject,
            institute_id,
            recipient: recipient.to_string(),
            status: DeliveryStatus::Pending,
            channel: None,
            provider: None,
            provider_message_id: None,
            error: None,
            retry_count: 0,
            last_attempt_at: None,
            sent_at: None,
        }
    }

    /// Record a successful send. Any earlier error is cleared.
    pub fn mark_sent(
        &mut self,
        channel: Channel,
        provider: &str,
        provider_message_id: Option<String>,
        at: Timestamp,
    ) {
        self.status = DeliveryStatus::Sent;
        self.channel = Some(channel);
        self.provider = Some(provider.to_string());
        self.provider_message_id = provider_message_id;
        self.error = None;
        self.last_attempt_at = Some(at);
        self.sent_at = Some(at);
    }

    /// Record a terminal failure of one attempt.
    pub fn mark_failed(&mut self, provider: Option<&str>, error: &str, at: Timestamp) {
        self.status = DeliveryStatus::Failed;
        self.provider = provider.map(str::to_string);
        self.error = Some(error.to_string());
        self.retry_count += 1;
        self.last_attempt_at = Some(at);
    }

    pub fn retries_exhausted(&self) -> bool {
        self.retry_count >= MAX_DELIVERY_ATTEMPTS
    }

    /// Move the record back to `pending` for a manual retry.
    ///
    /// Refused once [`MAX_DELIVERY_ATTEMPTS`] failures are on record, and for
    /// records that were already delivered.
    pub fn reopen_for_retry(&mut self) -> Result<(), CoreError> {
        if self.retries_exhausted() {
            return Err(CoreError::RetryLimitExceeded {
                attempts: self.retry_count,
            });
        }
        if self.status == DeliveryStatus::Sent {
            return Err(CoreError::FailedPrecondition(
                "Notification was already delivered".into(),
            ));
        }
        self.status = DeliveryStatus::Pending;
        Ok(())
    }
}
