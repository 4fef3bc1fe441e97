//! Background loop that fires the payment-reminder batch once a day.

use std::sync::Arc;

use chrono::Utc;
use classpulse_core::types::Timestamp;
use classpulse_events::{ReminderBatchJob, ReminderSummary};
use tokio_util::sync::CancellationToken;

use crate::schedule::DailySchedule;

pub struct ReminderScheduler {
    job: Arc<ReminderBatchJob>,
    schedule: DailySchedule,
}

impl ReminderScheduler {
    pub fn new(job: Arc<ReminderBatchJob>, schedule: DailySchedule) -> Self {
        Self { job, schedule }
    }

    /// Sleep until each scheduled instant and run one batch, until `cancel`
    /// fires. A run in progress is finished before cancellation is observed.
    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            let now = Utc::now();
            let next = self.schedule.next_run_after(now);
            let wait = (next - now).to_std().unwrap_or_default();
            tracing::info!(next_run = %next, "Next payment reminder run scheduled");

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Reminder scheduler cancelled");
                    break;
                }
                _ = tokio::time::sleep(wait) => {
                    self.run_once(Utc::now()).await;
                }
            }
        }
    }

    /// Run one batch now. Errors are logged, never propagated.
    pub async fn run_once(&self, now: Timestamp) -> Option<ReminderSummary> {
        match self.job.run(now).await {
            Ok(summary) => {
                tracing::info!(
                    sent = summary.sent,
                    failed = summary.failed,
                    skipped = summary.skipped,
                    institutes_scanned = summary.institutes_scanned,
                    stopped_early = summary.stopped_early,
                    "Payment reminder run finished"
                );
                Some(summary)
            }
            Err(e) => {
                tracing::error!(error = %e, "Payment reminder run failed");
                None
            }
        }
    }
}
