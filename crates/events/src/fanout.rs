//! Chunked fan-out of one event's notifications.
//!
//! Recipients are dispatched in chunks of [`FanOutPolicy::chunk_size`]; all
//! requests in a chunk run concurrently and the whole chunk is joined before
//! the next starts, with [`FanOutPolicy::chunk_delay`] in between.

use std::time::Duration;

use classpulse_core::delivery::{DeliveryRecord, DeliveryStatus};
use classpulse_core::types::DbId;
use classpulse_db::models::attendance::AttendanceRecord;
use classpulse_db::store::{NotifyStore, StoreResult};
use futures::future::join_all;

use crate::orchestrator::{DeliveryOrchestrator, NotificationRequest};

#[derive(Debug, Clone)]
pub struct FanOutPolicy {
    pub chunk_size: usize,
    pub chunk_delay: Duration,
    /// Waits between re-reads of an event's records while none are visible.
    pub read_backoff: Vec<Duration>,
}

impl Default for FanOutPolicy {
    fn default() -> Self {
        Self {
            chunk_size: 10,
            chunk_delay: Duration::from_secs(1),
            read_backoff: vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(2),
            ],
        }
    }
}

/// Tally of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutSummary {
    pub sent: usize,
    pub failed: usize,
}

/// Read an attendance entry's records, re-reading on the backoff schedule
/// while none are visible yet. Returns an empty list if they never appear.
pub async fn read_records_with_backoff(
    store: &dyn NotifyStore,
    attendance_id: DbId,
    backoff: &[Duration],
) -> StoreResult<Vec<AttendanceRecord>> {
    let mut records = store.attendance_records(attendance_id).await?;
    for delay in backoff {
        if !records.is_empty() {
            break;
        }
        tracing::warn!(attendance_id, retry_delay_ms = delay.as_millis() as u64, "Records empty, retrying");
        tokio::time::sleep(*delay).await;
        records = store.attendance_records(attendance_id).await?;
    }
    Ok(records)
}

/// Dispatch `requests` chunk by chunk. A store error on one request is
/// logged and counted as a failure; it never aborts its siblings.
pub async fn dispatch_chunked(
    orchestrator: &DeliveryOrchestrator,
    requests: &[NotificationRequest],
    policy: &FanOutPolicy,
) -> FanOutSummary {
    let mut summary = FanOutSummary::default();
    let chunk_size = policy.chunk_size.max(1);
    let chunk_count = requests.len().div_ceil(chunk_size);

    for (index, chunk) in requests.chunks(chunk_size).enumerate() {
        let results = join_all(chunk.iter().map(|req| orchestrator.dispatch(req))).await;
        for (req, result) in chunk.iter().zip(results) {
            match result {
                Ok(DeliveryRecord {
                    status: DeliveryStatus::Sent,
                    ..
                }) => summary.sent += 1,
                Ok(_) => summary.failed += 1,
                Err(e) => {
                    tracing::error!(subject = %req.subject, error = %e, "Failed to persist delivery record");
                    summary.failed += 1;
                }
            }
        }

        if index + 1 < chunk_count {
            tokio::time::sleep(policy.chunk_delay).await;
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use classpulse_core::delivery::{Channel, SubjectKind, SubjectRef};
    use classpulse_db::store::memory::MemoryStore;
    use tokio::time::Instant;

    use crate::delivery::{ProviderClient, ProviderSet};
    use crate::orchestrator::{MessageContent, Plan};
    use crate::testing::{FakeProvider, Script};

    fn request(id: DbId, phone: &str) -> NotificationRequest {
        NotificationRequest {
            subject: SubjectRef::new(SubjectKind::Attendance, id),
            institute_id: Some(1),
            recipient: phone.into(),
            content: MessageContent::text_only("hi"),
            plan: Plan::Primary,
        }
    }

    fn record(id: DbId) -> AttendanceRecord {
        AttendanceRecord {
            id,
            attendance_id: 5,
            student_id: id,
            student_name: format!("Student {id}"),
            parent_phone: Some("9876543210".into()),
            status: "absent".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn chunks_are_spaced_by_delay() {
        let store = MemoryStore::new();
        let sms = FakeProvider::sms(Script::AlwaysOk);
        let orch = DeliveryOrchestrator::new(
            Arc::new(store.clone()),
            ProviderSet {
                sms: Some(sms.clone() as Arc<dyn ProviderClient>),
                ..ProviderSet::default()
            },
            Channel::Sms,
        );
        let mut requests: Vec<_> = (1..=24).map(|id| request(id, "9876543210")).collect();
        requests.push(request(25, "123"));

        let started = Instant::now();
        let summary = dispatch_chunked(&orch, &requests, &FanOutPolicy::default()).await;

        assert_eq!(summary, FanOutSummary { sent: 24, failed: 1 });
        assert_eq!(sms.calls().await.len(), 24);
        // Three chunks, two gaps between them.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_millis(2100));
        assert_eq!(store.delivery_records().await.len(), 25);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_read_waits_for_late_records() {
        let store = MemoryStore::new();
        let writer = store.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1200)).await;
            writer.insert_attendance_record(record(1)).await;
        });

        let started = Instant::now();
        let records = read_records_with_backoff(&store, 5, &FanOutPolicy::default().read_backoff)
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        // Visible at the second re-read: 500ms + 1s.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1500) && elapsed < Duration::from_millis(1600));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_read_gives_up_after_schedule() {
        let store = MemoryStore::new();
        let started = Instant::now();
        let records = read_records_with_backoff(&store, 5, &FanOutPolicy::default().read_backoff)
            .await
            .unwrap();
        assert!(records.is_empty());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(3500) && elapsed < Duration::from_millis(3600));
    }
}
