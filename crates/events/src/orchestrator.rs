//! Delivery orchestration: channel cascade and per-recipient record keeping.
//!
//! [`DeliveryOrchestrator::deliver`] walks the channel chain for a [`Plan`]
//! and reports which binding succeeded, without touching storage.
//! [`DeliveryOrchestrator::dispatch`] wraps it for one [`NotificationRequest`],
//! moving the request's [`DeliveryRecord`] through its states and persisting
//! it. [`DeliveryOrchestrator::retry`] is the manual, bounded re-attempt.

use std::sync::Arc;

use chrono::Utc;
use classpulse_core::delivery::{
    Channel, DeliveryRecord, DeliveryStatus, SubjectRef, INVALID_RECIPIENT, NO_PROVIDER,
};
use classpulse_core::error::CoreError;
use classpulse_core::phone::Recipient;
use classpulse_core::render::RichMessage;
use classpulse_core::types::DbId;
use classpulse_db::store::{NotifyStore, StoreResult};

use crate::delivery::{OutboundMessage, ProviderClient, ProviderSet};
use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Which channels a message may go out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Configured primary channel; a rich primary falls back to plain SMS.
    Primary,
    /// Plain SMS bindings only (invitations, OTP codes).
    SmsOnly,
    /// Exactly the named channel, no fallback (test notifications).
    Only(Channel),
}

/// Per-channel renderings of one message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageContent {
    /// Template selection for the rich channel.
    pub rich: Option<RichMessage>,
    /// Long-form body for the rich channel when no template id is set.
    pub text: String,
    /// Plain SMS body.
    pub plain: String,
    /// Registered SMS template id, where the gateway needs one.
    pub sms_template_id: Option<String>,
}

impl MessageContent {
    /// Same text on every channel.
    pub fn text_only(body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            rich: None,
            text: body.clone(),
            plain: body,
            sms_template_id: None,
        }
    }

    pub fn for_channel(&self, channel: Channel) -> OutboundMessage {
        match channel {
            Channel::Whatsapp => {
                let (template_id, variables) = match &self.rich {
                    Some(rich) if rich.template_id.is_some() => {
                        (rich.template_id.clone(), rich.variables.clone())
                    }
                    _ => (None, Default::default()),
                };
                OutboundMessage {
                    template_id,
                    variables,
                    body: self.text.clone(),
                }
            }
            Channel::Sms => OutboundMessage {
                template_id: self.sms_template_id.clone(),
                variables: Default::default(),
                body: self.plain.clone(),
            },
        }
    }
}

/// One message for one recipient, owned by `subject`.
#[derive(Debug, Clone)]
pub struct NotificationRequest {
    pub subject: SubjectRef,
    pub institute_id: Option<DbId>,
    /// Phone as stored on the owning entity.
    pub recipient: String,
    pub content: MessageContent,
    pub plan: Plan,
}

/// Result of walking a channel chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent {
        channel: Channel,
        provider: &'static str,
        message_id: Option<String>,
    },
    Failed {
        /// Last binding tried, if any was configured.
        provider: Option<&'static str>,
        error: String,
    },
}

impl DeliveryOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryOutcome::Sent { .. })
    }
}

// ---------------------------------------------------------------------------
// DeliveryOrchestrator
// ---------------------------------------------------------------------------

pub struct DeliveryOrchestrator {
    store: Arc<dyn NotifyStore>,
    providers: ProviderSet,
    primary: Channel,
}

impl DeliveryOrchestrator {
    pub fn new(store: Arc<dyn NotifyStore>, providers: ProviderSet, primary: Channel) -> Self {
        Self {
            store,
            providers,
            primary,
        }
    }

    pub fn store(&self) -> &Arc<dyn NotifyStore> {
        &self.store
    }

    pub fn primary(&self) -> Channel {
        self.primary
    }

    pub fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    /// Ordered bindings to try for `plan`.
    pub fn chain(&self, plan: Plan) -> Vec<Arc<dyn ProviderClient>> {
        let ProviderSet {
            rich,
            sms,
            sms_backup,
        } = &self.providers;
        let slots: Vec<&Option<Arc<dyn ProviderClient>>> = match plan {
            Plan::Primary => match self.primary {
                Channel::Whatsapp => vec![rich, sms, sms_backup],
                Channel::Sms => vec![sms, sms_backup],
            },
            Plan::SmsOnly => vec![sms, sms_backup],
            Plan::Only(Channel::Whatsapp) => vec![rich],
            Plan::Only(Channel::Sms) => vec![sms],
        };
        slots.into_iter().flatten().cloned().collect()
    }

    /// Send `content` to a normalized destination, trying each binding of
    /// the plan's chain in order until one succeeds.
    pub async fn deliver(&self, plan: Plan, to: &str, content: &MessageContent) -> DeliveryOutcome {
        let mut outcome = DeliveryOutcome::Failed {
            provider: None,
            error: NO_PROVIDER.to_string(),
        };

        for (position, provider) in self.chain(plan).into_iter().enumerate() {
            let channel = provider.channel();
            if position > 0 {
                tracing::info!(to, provider = provider.name(), %channel, "Trying fallback channel");
            }
            match provider.send(to, &content.for_channel(channel)).await {
                Ok(receipt) => {
                    return DeliveryOutcome::Sent {
                        channel,
                        provider: provider.name(),
                        message_id: receipt.message_id,
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        to,
                        provider = provider.name(),
                        %channel,
                        error = %e,
                        "Provider send failed"
                    );
                    outcome = DeliveryOutcome::Failed {
                        provider: Some(provider.name()),
                        error: e.to_string(),
                    };
                }
            }
        }
        outcome
    }

    /// Deliver one request and persist its record.
    ///
    /// A subject whose record already reached `sent` or `failed` is returned
    /// unchanged so repeated triggers converge on the same record. A failed
    /// record only moves again through [`DeliveryOrchestrator::retry`].
    pub async fn dispatch(&self, request: &NotificationRequest) -> StoreResult<DeliveryRecord> {
        let existing = self.store.delivery_record(request.subject).await?;
        if let Some(record) = &existing {
            if record.status != DeliveryStatus::Pending {
                tracing::debug!(subject = %request.subject, status = %record.status, "Delivery already settled");
                return Ok(record.clone());
            }
        }

        let mut record = existing.unwrap_or_else(|| {
            DeliveryRecord::pending(request.subject, request.institute_id, &request.recipient)
        });
        record.recipient = request.recipient.clone();
        record.status = DeliveryStatus::Pending;
        self.attempt(&mut record, request).await?;
        Ok(record)
    }

    /// Send another copy even when the record was delivered, e.g. an explicit
    /// invitation resend. Failed attempts still count against the cap.
    pub async fn resend(&self, request: &NotificationRequest) -> Result<DeliveryRecord, EngineError> {
        let mut record = self
            .store
            .delivery_record(request.subject)
            .await?
            .unwrap_or_else(|| {
                DeliveryRecord::pending(request.subject, request.institute_id, &request.recipient)
            });
        if record.retries_exhausted() {
            return Err(CoreError::RetryLimitExceeded {
                attempts: record.retry_count,
            }
            .into());
        }
        record.recipient = request.recipient.clone();
        record.status = DeliveryStatus::Pending;
        self.attempt(&mut record, request).await?;
        Ok(record)
    }

    /// Manual re-attempt of one record.
    ///
    /// Fails fast with `RetryLimitExceeded` once three attempts have failed,
    /// without contacting any provider.
    pub async fn retry(&self, request: &NotificationRequest) -> Result<DeliveryRecord, EngineError> {
        let mut record = self
            .store
            .delivery_record(request.subject)
            .await?
            .ok_or_else(|| CoreError::not_found("delivery record", request.subject))?;

        record.reopen_for_retry()?;
        tracing::info!(subject = %request.subject, retry_count = record.retry_count, "Retrying delivery");
        self.attempt(&mut record, request).await?;
        Ok(record)
    }

    async fn attempt(
        &self,
        record: &mut DeliveryRecord,
        request: &NotificationRequest,
    ) -> StoreResult<()> {
        let recipient = Recipient::parse(&request.recipient);
        let now = Utc::now();

        if !recipient.is_valid {
            tracing::warn!(
                subject = %request.subject,
                phone = %recipient.normalized,
                "Invalid recipient phone, not contacting providers"
            );
            record.mark_failed(None, INVALID_RECIPIENT, now);
            return self.store.save_delivery_record(record).await;
        }

        match self
            .deliver(request.plan, &recipient.normalized, &request.content)
            .await
        {
            DeliveryOutcome::Sent {
                channel,
                provider,
                message_id,
            } => {
                tracing::info!(
                    subject = %request.subject,
                    phone = %recipient.normalized,
                    provider,
                    %channel,
                    "Notification sent"
                );
                record.mark_sent(channel, provider, message_id, Utc::now());
            }
            DeliveryOutcome::Failed { provider, error } => {
                tracing::error!(
                    subject = %request.subject,
                    phone = %recipient.normalized,
                    provider = provider.unwrap_or("none"),
                    error = %error,
                    "Notification failed"
                );
                record.mark_failed(provider, &error, Utc::now());
            }
        }
        self.store.save_delivery_record(record).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
