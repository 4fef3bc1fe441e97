//! Overdue-fee reminders: the daily batch scan and the manual per-invoice send.
//!
//! The batch job walks institutes in id order, one page at a time, and sends
//! reminders sequentially. It runs against a wall-clock budget checked before
//! every page fetch and before every institute; once spent, the run stops and
//! the next scheduled run starts over from the first institute. Balances are
//! re-read on every run, so an invoice paid in between is skipped.

use std::sync::Arc;
use std::time::Duration;

use classpulse_core::delivery::Channel;
use classpulse_core::error::CoreError;
use classpulse_core::messages;
use classpulse_core::phone;
use classpulse_core::reminder::days_overdue;
use classpulse_core::types::{DbId, Timestamp};
use classpulse_db::models::institute::Institute;
use classpulse_db::models::invoice::{Invoice, NewPaymentReminder};
use serde::Serialize;
use tokio::time::Instant;

use crate::error::EngineError;
use crate::orchestrator::{DeliveryOrchestrator, DeliveryOutcome, MessageContent, Plan};

/// Wall-clock ceiling of one batch run.
pub const REMINDER_BUDGET: Duration = Duration::from_secs(500);

/// Institutes fetched per page.
pub const INSTITUTE_PAGE_SIZE: i64 = 20;

const UNKNOWN_BATCH: &str = "Unknown Batch";

/// Counters reported at the end of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderSummary {
    pub sent: usize,
    pub failed: usize,
    /// Invoices passed over: cleared balance, unknown student or unusable phone.
    pub skipped: usize,
    pub institutes_scanned: usize,
    /// The budget ran out before every institute was visited.
    pub stopped_early: bool,
}

/// Result of one delivered reminder.
#[derive(Debug, Clone, Serialize)]
pub struct ReminderReceipt {
    pub reminder_id: DbId,
    pub invoice_id: DbId,
    pub amount: f64,
    pub days_overdue: i64,
    pub channel: Channel,
    pub provider_message_id: Option<String>,
}

/// Everything needed to send one reminder, resolved from the store.
struct PreparedReminder {
    invoice_id: DbId,
    institute_id: DbId,
    student_id: DbId,
    student_name: String,
    to: String,
    amount: f64,
    days_overdue: i64,
    body: String,
}

pub struct ReminderBatchJob {
    orchestrator: Arc<DeliveryOrchestrator>,
    budget: Duration,
    page_size: i64,
}

impl ReminderBatchJob {
    pub fn new(orchestrator: Arc<DeliveryOrchestrator>) -> Self {
        Self {
            orchestrator,
            budget: REMINDER_BUDGET,
            page_size: INSTITUTE_PAGE_SIZE,
        }
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// One full scan. Only a failed page fetch aborts the run; everything
    /// below institute level is counted and logged.
    pub async fn run(&self, now: Timestamp) -> Result<ReminderSummary, EngineError> {
        let store = self.orchestrator.store().as_ref();
        let started = Instant::now();
        let mut summary = ReminderSummary::default();
        let mut after: Option<DbId> = None;

        tracing::info!(budget_secs = self.budget.as_secs(), "Starting payment reminder run");

        'pages: loop {
            if started.elapsed() >= self.budget {
                summary.stopped_early = true;
                break;
            }
            let page = store.institutes_page(after, self.page_size).await?;
            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.id);

            for institute in &page {
                if started.elapsed() >= self.budget {
                    summary.stopped_early = true;
                    break 'pages;
                }
                summary.institutes_scanned += 1;
                self.scan_institute(institute, now, &mut summary).await;
            }

            if (page.len() as i64) < self.page_size {
                break;
            }
        }

        if summary.stopped_early {
            tracing::warn!(
                elapsed_secs = started.elapsed().as_secs(),
                institutes_scanned = summary.institutes_scanned,
                "Reminder budget exhausted, remaining institutes left for the next run"
            );
        }
        tracing::info!(
            sent = summary.sent,
            failed = summary.failed,
            skipped = summary.skipped,
            institutes_scanned = summary.institutes_scanned,
            "Payment reminder run finished"
        );
        Ok(summary)
    }

    async fn scan_institute(
        &self,
        institute: &Institute,
        now: Timestamp,
        summary: &mut ReminderSummary,
    ) {
        if !institute.notifications_enabled {
            tracing::debug!(institute_id = institute.id, "Notifications disabled, skipping");
            return;
        }

        let invoices = match self
            .orchestrator
            .store()
            .overdue_invoices(institute.id, now)
            .await
        {
            Ok(invoices) => invoices,
            Err(e) => {
                tracing::error!(institute_id = institute.id, error = %e, "Failed to list overdue invoices");
                return;
            }
        };

        for invoice in &invoices {
            let prepared = match self.prepare(institute, invoice, now).await {
                Ok(prepared) => prepared,
                Err(EngineError::Core(
                    e @ (CoreError::FailedPrecondition(_) | CoreError::NotFound { .. }),
                )) => {
                    tracing::debug!(invoice_id = invoice.id, reason = %e, "Skipping invoice");
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::error!(invoice_id = invoice.id, error = %e, "Failed to prepare reminder");
                    summary.failed += 1;
                    continue;
                }
            };

            match self.send(prepared, false).await {
                Ok(_) => summary.sent += 1,
                Err(e) => {
                    tracing::error!(
                        institute_id = institute.id,
                        invoice_id = invoice.id,
                        error = %e,
                        "Error sending reminder"
                    );
                    summary.failed += 1;
                }
            }
        }
    }

    /// Manual reminder for one invoice of `institute_id`.
    pub async fn remind_invoice(
        &self,
        institute_id: DbId,
        invoice_id: DbId,
        now: Timestamp,
    ) -> Result<ReminderReceipt, EngineError> {
        let store = self.orchestrator.store();
        let invoice = store
            .invoice(invoice_id)
            .await?
            .filter(|i| i.institute_id == institute_id)
            .ok_or_else(|| CoreError::not_found("invoice", invoice_id))?;
        let institute = store
            .institute(institute_id)
            .await?
            .ok_or_else(|| CoreError::not_found("institute", institute_id))?;

        let prepared = self.prepare(&institute, &invoice, now).await?;
        self.send(prepared, true).await
    }

    async fn prepare(
        &self,
        institute: &Institute,
        invoice: &Invoice,
        now: Timestamp,
    ) -> Result<PreparedReminder, EngineError> {
        let balance = invoice.balance_due();
        if balance <= 0.0 {
            return Err(CoreError::FailedPrecondition("Invoice is already paid".into()).into());
        }

        let store = self.orchestrator.store();
        let student = store
            .student(invoice.student_id)
            .await?
            .ok_or_else(|| CoreError::not_found("student", invoice.student_id))?;
        let to = match student.parent_phone.as_deref() {
            Some(raw) if phone::is_valid(raw) => phone::normalize(raw),
            _ => {
                return Err(CoreError::FailedPrecondition(
                    "Student has no valid parent phone".into(),
                )
                .into())
            }
        };
        let batch_name = store
            .batch(invoice.batch_id)
            .await?
            .map(|b| b.name)
            .unwrap_or_else(|| UNKNOWN_BATCH.to_string());

        let days = days_overdue(invoice.due_date, now).max(0);
        let body = messages::payment_reminder(&student.name, balance, &batch_name, days, &institute.name);

        Ok(PreparedReminder {
            invoice_id: invoice.id,
            institute_id: institute.id,
            student_id: student.id,
            student_name: student.name,
            to,
            amount: balance,
            days_overdue: days,
            body,
        })
    }

    async fn send(
        &self,
        reminder: PreparedReminder,
        manual: bool,
    ) -> Result<ReminderReceipt, EngineError> {
        let content = MessageContent::text_only(reminder.body);
        let (channel, message_id) = match self
            .orchestrator
            .deliver(Plan::Primary, &reminder.to, &content)
            .await
        {
            DeliveryOutcome::Sent {
                channel,
                message_id,
                ..
            } => (channel, message_id),
            DeliveryOutcome::Failed {
                provider: None,
                error,
            } => return Err(CoreError::FailedPrecondition(error).into()),
            DeliveryOutcome::Failed { error, .. } => {
                return Err(CoreError::Provider(error).into())
            }
        };

        let reminder_id = self
            .orchestrator
            .store()
            .append_payment_reminder(&NewPaymentReminder {
                institute_id: reminder.institute_id,
                invoice_id: reminder.invoice_id,
                student_id: reminder.student_id,
                student_name: reminder.student_name,
                amount: reminder.amount,
                days_overdue: reminder.days_overdue,
                channel: channel.as_str().to_string(),
                provider_message_id: message_id.clone(),
                manual,
            })
            .await?;
        tracing::info!(
            institute_id = reminder.institute_id,
            invoice_id = reminder.invoice_id,
            %channel,
            manual,
            "Payment reminder sent"
        );

        Ok(ReminderReceipt {
            reminder_id,
            invoice_id: reminder.invoice_id,
            amount: reminder.amount,
            days_overdue: reminder.days_overdue,
            channel,
            provider_message_id: message_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use classpulse_db::models::institute::{Batch, Student};
    use classpulse_db::store::memory::MemoryStore;

    use crate::delivery::{ProviderClient, ProviderSet};
    use crate::testing::{FakeProvider, Script};

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, 15, 3, 30, 0).unwrap()
    }

    fn job(store: &MemoryStore, sms: Arc<FakeProvider>) -> ReminderBatchJob {
        ReminderBatchJob::new(Arc::new(DeliveryOrchestrator::new(
            Arc::new(store.clone()),
            ProviderSet {
                sms: Some(sms as Arc<dyn ProviderClient>),
                ..ProviderSet::default()
            },
            Channel::Whatsapp,
        )))
    }

    fn invoice(id: DbId, institute_id: DbId, paid: f64) -> Invoice {
        Invoice {
            id,
            institute_id,
            student_id: id,
            batch_id: 100 + institute_id,
            final_amount: 1500.0,
            paid_amount: paid,
            due_date: now() - ChronoDuration::days(4),
            status: "pending".into(),
        }
    }

    /// One institute per id, each with a batch, a student and one overdue invoice.
    async fn seed(store: &MemoryStore, ids: std::ops::RangeInclusive<DbId>) {
        for id in ids {
            store
                .insert_institute(Institute {
                    id,
                    name: format!("Institute {id}"),
                    notifications_enabled: true,
                    notify_for_present: false,
                    absent_template: None,
                    late_template: None,
                    present_template: None,
                })
                .await;
            store
                .insert_batch(Batch {
                    id: 100 + id,
                    institute_id: id,
                    name: "NEET Bio".into(),
                })
                .await;
            store
                .insert_student(Student {
                    id,
                    institute_id: id,
                    batch_id: 100 + id,
                    name: format!("Student {id}"),
                    parent_phone: Some("9876543210".into()),
                })
                .await;
            store.insert_invoice(invoice(id, id, 0.0)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn budget_stops_run_and_next_run_skips_paid_invoice() {
        let store = MemoryStore::new();
        seed(&store, 1..=4).await;
        let sms = Arc::new(
            FakeProvider::new("fake-sms", Channel::Sms, Script::AlwaysOk)
                .with_latency(Duration::from_secs(200)),
        );
        let job = job(&store, sms.clone());

        let first = job.run(now()).await.unwrap();
        assert_eq!(first.sent, 3);
        assert_eq!(first.institutes_scanned, 3);
        assert!(first.stopped_early);
        assert_eq!(store.payment_reminders().await.len(), 3);

        // Paid in full between runs; status left stale on purpose.
        let mut paid = invoice(1, 1, 1500.0);
        paid.status = "partial".into();
        store.insert_invoice(paid).await;

        let second = job.run(now()).await.unwrap();
        assert_eq!(second.sent, 3);
        assert_eq!(second.skipped, 1);
        assert!(!second.stopped_early);

        let reminders = store.payment_reminders().await;
        assert_eq!(reminders.len(), 6);
        assert_eq!(reminders.iter().filter(|r| r.invoice_id == 1).count(), 1);
        assert!(reminders.iter().all(|r| !r.manual && r.days_overdue == 4));
    }

    #[tokio::test]
    async fn pages_through_every_institute() {
        let store = MemoryStore::new();
        seed(&store, 1..=5).await;
        let sms = FakeProvider::sms(Script::AlwaysOk);
        let job = job(&store, sms.clone()).with_page_size(2);

        let summary = job.run(now()).await.unwrap();
        assert_eq!(summary.sent, 5);
        assert_eq!(summary.institutes_scanned, 5);
        assert_eq!(sms.calls().await.len(), 5);
    }

    #[tokio::test]
    async fn failures_are_counted_not_fatal() {
        let store = MemoryStore::new();
        seed(&store, 1..=3).await;
        let sms = FakeProvider::sms(Script::FailTimes(1));

        let summary = job(&store, sms).run(now()).await.unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.sent, 2);
        assert_eq!(store.payment_reminders().await.len(), 2);
    }

    #[tokio::test]
    async fn manual_reminder_for_upcoming_invoice() {
        let store = MemoryStore::new();
        seed(&store, 1..=1).await;
        let mut upcoming = invoice(1, 1, 700.0);
        upcoming.due_date = now() + ChronoDuration::days(3);
        store.insert_invoice(upcoming).await;
        let sms = FakeProvider::sms(Script::AlwaysOk);

        let receipt = job(&store, sms.clone())
            .remind_invoice(1, 1, now())
            .await
            .unwrap();
        assert_eq!(receipt.days_overdue, 0);
        assert_eq!(receipt.amount, 800.0);
        assert_eq!(receipt.channel, Channel::Sms);

        let calls = sms.calls().await;
        assert_eq!(calls[0].0, "+919876543210");
        assert!(calls[0].1.body.contains("Rs.800 for NEET Bio is due soon"));
        assert!(store.payment_reminders().await[0].manual);
    }

    #[tokio::test]
    async fn manual_reminder_rejections() {
        let store = MemoryStore::new();
        seed(&store, 1..=2).await;
        store.insert_invoice(invoice(1, 1, 1500.0)).await;
        let job = job(&store, FakeProvider::sms(Script::AlwaysFail));

        assert_matches!(
            job.remind_invoice(1, 1, now()).await,
            Err(EngineError::Core(CoreError::FailedPrecondition(_)))
        );
        assert_matches!(
            job.remind_invoice(1, 2, now()).await,
            Err(EngineError::Core(CoreError::NotFound { entity: "invoice", .. }))
        );
        assert_matches!(
            job.remind_invoice(2, 2, now()).await,
            Err(EngineError::Core(CoreError::Provider(_)))
        );
        assert!(store.payment_reminders().await.is_empty());
    }
}
