//! Trigger handlers and their dispatch table.
//!
//! Each change-feed event kind maps to exactly one handler taking the
//! entity snapshot. [`TriggerDispatcher::run`] consumes the [`EventBus`]
//! and handles every event as an independent task.
//!
//! [`EventBus`]: crate::bus::EventBus

use std::sync::Arc;

use classpulse_core::delivery::DeliveryStatus;
use classpulse_core::error::CoreError;
use classpulse_core::render::AttendanceStatus;
use classpulse_db::models::attendance::AttendanceEntry;
use classpulse_db::models::invitation::TeacherInvitation;
use classpulse_db::models::leave_request::LeaveRequest;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::TriggerEvent;
use crate::composer::Composer;
use crate::error::EngineError;
use crate::fanout::{dispatch_chunked, read_records_with_backoff, FanOutPolicy, FanOutSummary};
use crate::orchestrator::DeliveryOrchestrator;

/// Leave status that must precede a decision for the parent to be notified.
const LEAVE_PENDING: &str = "pending";

pub struct TriggerDispatcher {
    orchestrator: Arc<DeliveryOrchestrator>,
    composer: Composer,
    fanout: FanOutPolicy,
}

impl TriggerDispatcher {
    pub fn new(
        orchestrator: Arc<DeliveryOrchestrator>,
        composer: Composer,
        fanout: FanOutPolicy,
    ) -> Self {
        Self {
            orchestrator,
            composer,
            fanout,
        }
    }

    /// Route one event to its handler.
    pub async fn handle(&self, event: TriggerEvent) -> Result<FanOutSummary, EngineError> {
        match event {
            TriggerEvent::AttendanceSubmitted { attendance } => {
                self.on_attendance_submitted(&attendance).await
            }
            TriggerEvent::InvitationCreated { invitation } => {
                self.on_invitation_created(&invitation).await
            }
            TriggerEvent::LeaveRequestUpdated {
                previous_status,
                request,
            } => self.on_leave_request_updated(&previous_status, &request).await,
        }
    }

    /// Consume `receiver` until the bus closes or `cancel` fires.
    pub async fn run(
        self: Arc<Self>,
        mut receiver: broadcast::Receiver<TriggerEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Trigger dispatcher cancelled");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => {
                        let dispatcher = Arc::clone(&self);
                        tokio::spawn(async move {
                            let kind = event.kind();
                            if let Err(e) = dispatcher.handle(event).await {
                                tracing::error!(trigger = %kind, error = %e, "Trigger handler failed");
                            }
                        });
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Trigger dispatcher lagged, events were dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, trigger dispatcher shutting down");
                        break;
                    }
                }
            }
        }
    }

    async fn on_attendance_submitted(
        &self,
        entry: &AttendanceEntry,
    ) -> Result<FanOutSummary, EngineError> {
        let store = self.orchestrator.store().as_ref();
        let attendance_id = entry.id;
        let institute_id = entry.institute_id;
        tracing::info!(institute_id, attendance_id, "Processing attendance");

        let institute = store
            .institute(institute_id)
            .await?
            .ok_or_else(|| CoreError::not_found("institute", institute_id))?;
        if !institute.notifications_enabled {
            tracing::info!(institute_id, attendance_id, "Notifications disabled, skipping");
            return Ok(FanOutSummary::default());
        }
        let batch = store
            .batch(entry.batch_id)
            .await?
            .ok_or_else(|| CoreError::not_found("batch", entry.batch_id))?;

        let records = read_records_with_backoff(store, attendance_id, &self.fanout.read_backoff).await?;
        if records.is_empty() {
            tracing::warn!(institute_id, attendance_id, "No records found after retries, skipping");
            return Ok(FanOutSummary::default());
        }
        let total_records = records.len();

        let mut requests = Vec::with_capacity(records.len());
        for record in &records {
            if record.status == AttendanceStatus::Present.as_str() && !institute.notify_for_present {
                continue;
            }
            match self.composer.attendance(&institute, &batch, entry, record) {
                Ok(Some(request)) => requests.push(request),
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    attendance_id,
                    record_id = record.id,
                    error = %e,
                    "Skipping unreadable attendance record"
                ),
            }
        }

        tracing::info!(
            institute_id,
            attendance_id,
            to_notify = requests.len(),
            total_records,
            "Sending notifications"
        );
        if requests.is_empty() {
            return Ok(FanOutSummary::default());
        }

        let summary = dispatch_chunked(&self.orchestrator, &requests, &self.fanout).await;
        store
            .mark_attendance_processed(attendance_id, summary.sent as i32)
            .await?;
        tracing::info!(
            institute_id,
            attendance_id,
            sent = summary.sent,
            failed = summary.failed,
            "Completed processing attendance"
        );
        Ok(summary)
    }

    async fn on_invitation_created(
        &self,
        invitation: &TeacherInvitation,
    ) -> Result<FanOutSummary, EngineError> {
        tracing::info!(
            institute_id = invitation.institute_id,
            invitation_id = invitation.id,
            "Processing teacher invitation"
        );
        if invitation.is_accepted {
            return Ok(FanOutSummary::default());
        }
        let record = self
            .orchestrator
            .dispatch(&self.composer.invitation(invitation, false))
            .await?;
        Ok(tally(record.status))
    }

    async fn on_leave_request_updated(
        &self,
        previous_status: &str,
        request: &LeaveRequest,
    ) -> Result<FanOutSummary, EngineError> {
        if previous_status != LEAVE_PENDING || request.status == previous_status {
            return Ok(FanOutSummary::default());
        }
        let store = self.orchestrator.store().as_ref();
        let parent = store
            .parent(request.parent_id)
            .await?
            .ok_or_else(|| CoreError::not_found("parent", request.parent_id))?;

        let student_name = match store.student(request.student_id).await {
            Ok(student) => student.map(|s| s.name),
            Err(e) => {
                tracing::error!(
                    leave_request_id = request.id,
                    student_id = request.student_id,
                    error = %e,
                    "Error fetching student"
                );
                None
            }
        };

        let Some(notification) =
            self.composer
                .leave_decision(request, &parent.phone, student_name.as_deref())
        else {
            tracing::debug!(leave_request_id = request.id, status = %request.status, "Not a decision, skipping");
            return Ok(FanOutSummary::default());
        };

        let record = self.orchestrator.dispatch(&notification).await?;
        tracing::info!(
            institute_id = request.institute_id,
            leave_request_id = request.id,
            status = %record.status,
            "Leave decision notification processed"
        );
        Ok(tally(record.status))
    }
}

fn tally(status: DeliveryStatus) -> FanOutSummary {
    match status {
        DeliveryStatus::Sent => FanOutSummary { sent: 1, failed: 0 },
        _ => FanOutSummary { sent: 0, failed: 1 },
    }
}
