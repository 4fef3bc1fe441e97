//! In-process trigger bus backed by a `tokio::sync::broadcast` channel.
//!
//! The external document store's change feed is posted to the API, which
//! publishes each snapshot here as a [`TriggerEvent`]; the
//! [`TriggerDispatcher`](crate::triggers::TriggerDispatcher) consumes them.

use std::fmt;
use std::str::FromStr;

use classpulse_core::error::CoreError;
use classpulse_db::models::attendance::AttendanceEntry;
use classpulse_db::models::invitation::TeacherInvitation;
use classpulse_db::models::leave_request::LeaveRequest;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// TriggerEvent
// ---------------------------------------------------------------------------

/// Kinds of change the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    AttendanceSubmitted,
    InvitationCreated,
    LeaveRequestUpdated,
}

impl TriggerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerKind::AttendanceSubmitted => "attendance-submitted",
            TriggerKind::InvitationCreated => "invitation-created",
            TriggerKind::LeaveRequestUpdated => "leave-request-updated",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attendance-submitted" => Ok(TriggerKind::AttendanceSubmitted),
            "invitation-created" => Ok(TriggerKind::InvitationCreated),
            "leave-request-updated" => Ok(TriggerKind::LeaveRequestUpdated),
            other => Err(CoreError::Validation(format!("Unknown trigger '{other}'"))),
        }
    }
}

/// Immutable snapshot of a changed entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TriggerEvent {
    /// A new attendance entry; its records may become visible slightly later.
    AttendanceSubmitted { attendance: AttendanceEntry },
    InvitationCreated { invitation: TeacherInvitation },
    /// A leave request after an update, with its status before the update.
    LeaveRequestUpdated {
        previous_status: String,
        request: LeaveRequest,
    },
}

impl TriggerEvent {
    pub fn kind(&self) -> TriggerKind {
        match self {
            TriggerEvent::AttendanceSubmitted { .. } => TriggerKind::AttendanceSubmitted,
            TriggerEvent::InvitationCreated { .. } => TriggerKind::InvitationCreated,
            TriggerEvent::LeaveRequestUpdated { .. } => TriggerKind::LeaveRequestUpdated,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out bus for [`TriggerEvent`]s.
pub struct EventBus {
    sender: broadcast::Sender<TriggerEvent>,
}

impl EventBus {
    /// When the buffer is full the oldest unconsumed events are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Returns how many received it.
    pub fn publish(&self, event: TriggerEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TriggerEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
