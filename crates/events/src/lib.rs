//! ClassPulse notification dispatch engine.
//!
//! - [`EventBus`]: in-process publish/subscribe hub for change-feed triggers.
//! - [`TriggerDispatcher`]: maps each trigger kind to its handler.
//! - [`delivery`]: provider clients for the rich (WhatsApp) and SMS channels.
//! - [`DeliveryOrchestrator`]: channel fallback and per-recipient delivery records.
//! - [`ReminderBatchJob`]: time-budgeted overdue-fee reminder scan.

pub mod bus;
pub mod composer;
pub mod delivery;
pub mod error;
pub mod fanout;
pub mod orchestrator;
pub mod reminders;
pub mod triggers;

#[cfg(test)]
mod testing;

pub use bus::{EventBus, TriggerEvent, TriggerKind};
pub use composer::Composer;
pub use delivery::{DeliveryConfig, ProviderClient, ProviderSet};
pub use error::EngineError;
pub use fanout::{FanOutPolicy, FanOutSummary};
pub use orchestrator::{DeliveryOrchestrator, DeliveryOutcome, MessageContent, NotificationRequest, Plan};
pub use reminders::{ReminderBatchJob, ReminderReceipt, ReminderSummary};
pub use triggers::TriggerDispatcher;
