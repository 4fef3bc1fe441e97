//! In-process [`NotifyStore`] backed by `HashMap`s behind a `tokio::sync::RwLock`.
//!
//! Not durable. Used by tests and local runs without Postgres; the `insert_*`
//! seeding helpers and the read-back accessors exist for those callers.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use classpulse_core::delivery::{DeliveryRecord, SubjectRef};
use classpulse_core::otp::OtpChallenge;
use classpulse_core::rate_limit::admits;
use classpulse_core::reminder::InvoiceStatus;
use classpulse_core::types::{DbId, Timestamp};
use tokio::sync::RwLock;

use super::{NotifyStore, StoreResult};
use crate::models::attendance::{AttendanceEntry, AttendanceRecord};
use crate::models::institute::{Batch, Institute, Student};
use crate::models::invitation::TeacherInvitation;
use crate::models::invoice::{Invoice, NewPaymentReminder, PaymentReminder};
use crate::models::leave_request::LeaveRequest;
use crate::models::otp::OtpLog;
use crate::models::parent::Parent;

#[derive(Default)]
struct Tables {
    // Ordered so that paging by id matches the Postgres keyset query.
    institutes: BTreeMap<DbId, Institute>,
    batches: HashMap<DbId, Batch>,
    students: HashMap<DbId, Student>,
    teachers: HashMap<DbId, DbId>,
    invitations: HashMap<DbId, TeacherInvitation>,
    attendance: HashMap<DbId, AttendanceEntry>,
    attendance_records: Vec<AttendanceRecord>,
    attendance_summaries: HashMap<DbId, i32>,
    invoices: BTreeMap<DbId, Invoice>,
    payment_reminders: Vec<PaymentReminder>,
    leave_requests: HashMap<DbId, LeaveRequest>,
    parents: BTreeMap<DbId, Parent>,
    delivery_records: HashMap<SubjectRef, DeliveryRecord>,
    otp_challenges: HashMap<String, OtpChallenge>,
    otp_logs: Vec<OtpLog>,
    actions: Vec<(String, String, Timestamp)>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    next_id: Arc<AtomicI64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> DbId {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    // -- seeding ---------------------------------------------------------

    pub async fn insert_institute(&self, institute: Institute) {
        self.tables
            .write()
            .await
            .institutes
            .insert(institute.id, institute);
    }

    pub async fn insert_batch(&self, batch: Batch) {
        self.tables.write().await.batches.insert(batch.id, batch);
    }

    pub async fn insert_student(&self, student: Student) {
        self.tables.write().await.students.insert(student.id, student);
    }

    pub async fn insert_teacher(&self, user_id: DbId, institute_id: DbId) {
        self.tables
            .write()
            .await
            .teachers
            .insert(user_id, institute_id);
    }

    pub async fn insert_invitation(&self, invitation: TeacherInvitation) {
        self.tables
            .write()
            .await
            .invitations
            .insert(invitation.id, invitation);
    }

    pub async fn insert_attendance(&self, entry: AttendanceEntry) {
        self.tables.write().await.attendance.insert(entry.id, entry);
    }

    pub async fn insert_leave_request(&self, request: LeaveRequest) {
        self.tables
            .write()
            .await
            .leave_requests
            .insert(request.id, request);
    }

    pub async fn insert_attendance_record(&self, record: AttendanceRecord) {
        self.tables.write().await.attendance_records.push(record);
    }

    /// Insert or replace an invoice.
    pub async fn insert_invoice(&self, invoice: Invoice) {
        self.tables.write().await.invoices.insert(invoice.id, invoice);
    }

    pub async fn insert_parent(&self, parent: Parent) {
        self.tables.write().await.parents.insert(parent.id, parent);
    }

    // -- read-back -------------------------------------------------------

    pub async fn payment_reminders(&self) -> Vec<PaymentReminder> {
        self.tables.read().await.payment_reminders.clone()
    }

    pub async fn otp_logs(&self) -> Vec<OtpLog> {
        self.tables.read().await.otp_logs.clone()
    }

    /// `notifications_sent` stamped on an attendance entry, if processed.
    pub async fn attendance_summary(&self, attendance_id: DbId) -> Option<i32> {
        self.tables
            .read()
            .await
            .attendance_summaries
            .get(&attendance_id)
            .copied()
    }

    pub async fn delivery_records(&self) -> Vec<DeliveryRecord> {
        self.tables
            .read()
            .await
            .delivery_records
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotifyStore for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn institute(&self, id: DbId) -> StoreResult<Option<Institute>> {
        Ok(self.tables.read().await.institutes.get(&id).cloned())
    }

    async fn institutes_page(
        &self,
        after: Option<DbId>,
        limit: i64,
    ) -> StoreResult<Vec<Institute>> {
        let tables = self.tables.read().await;
        let take = usize::try_from(limit).unwrap_or(0);
        Ok(tables
            .institutes
            .values()
            .filter(|i| after.map_or(true, |cursor| i.id > cursor))
            .take(take)
            .cloned()
            .collect())
    }

    async fn batch(&self, id: DbId) -> StoreResult<Option<Batch>> {
        Ok(self.tables.read().await.batches.get(&id).cloned())
    }

    async fn student(&self, id: DbId) -> StoreResult<Option<Student>> {
        Ok(self.tables.read().await.students.get(&id).cloned())
    }

    async fn teacher_institute(&self, user_id: DbId) -> StoreResult<Option<DbId>> {
        Ok(self.tables.read().await.teachers.get(&user_id).copied())
    }

    async fn invitation(&self, id: DbId) -> StoreResult<Option<TeacherInvitation>> {
        Ok(self.tables.read().await.invitations.get(&id).cloned())
    }

    async fn attendance(&self, id: DbId) -> StoreResult<Option<AttendanceEntry>> {
        Ok(self.tables.read().await.attendance.get(&id).cloned())
    }

    async fn attendance_record(&self, record_id: DbId) -> StoreResult<Option<AttendanceRecord>> {
        Ok(self
            .tables
            .read()
            .await
            .attendance_records
            .iter()
            .find(|r| r.id == record_id)
            .cloned())
    }

    async fn attendance_records(&self, attendance_id: DbId) -> StoreResult<Vec<AttendanceRecord>> {
        Ok(self
            .tables
            .read()
            .await
            .attendance_records
            .iter()
            .filter(|r| r.attendance_id == attendance_id)
            .cloned()
            .collect())
    }

    async fn mark_attendance_processed(&self, attendance_id: DbId, sent: i32) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .attendance_summaries
            .insert(attendance_id, sent);
        Ok(())
    }

    async fn invoice(&self, id: DbId) -> StoreResult<Option<Invoice>> {
        Ok(self.tables.read().await.invoices.get(&id).cloned())
    }

    async fn overdue_invoices(
        &self,
        institute_id: DbId,
        now: Timestamp,
    ) -> StoreResult<Vec<Invoice>> {
        let tables = self.tables.read().await;
        Ok(tables
            .invoices
            .values()
            .filter(|inv| inv.institute_id == institute_id && inv.due_date < now)
            .filter(|inv| {
                inv.status
                    .parse::<InvoiceStatus>()
                    .is_ok_and(InvoiceStatus::is_remindable)
            })
            .cloned()
            .collect())
    }

    async fn append_payment_reminder(&self, reminder: &NewPaymentReminder) -> StoreResult<DbId> {
        let id = self.allocate_id();
        self.tables
            .write()
            .await
            .payment_reminders
            .push(PaymentReminder {
                id,
                institute_id: reminder.institute_id,
                invoice_id: reminder.invoice_id,
                student_id: reminder.student_id,
                student_name: reminder.student_name.clone(),
                amount: reminder.amount,
                days_overdue: reminder.days_overdue,
                channel: reminder.channel.clone(),
                provider_message_id: reminder.provider_message_id.clone(),
                manual: reminder.manual,
                sent_at: Utc::now(),
            });
        Ok(id)
    }

    async fn leave_request(&self, id: DbId) -> StoreResult<Option<LeaveRequest>> {
        Ok(self.tables.read().await.leave_requests.get(&id).cloned())
    }

    async fn parent(&self, id: DbId) -> StoreResult<Option<Parent>> {
        Ok(self.tables.read().await.parents.get(&id).cloned())
    }

    async fn parent_by_phone(&self, normalized_phone: &str) -> StoreResult<Option<Parent>> {
        Ok(self
            .tables
            .read()
            .await
            .parents
            .values()
            .find(|p| p.phone == normalized_phone)
            .cloned())
    }

    async fn record_parent_login(&self, id: DbId, at: Timestamp) -> StoreResult<()> {
        if let Some(parent) = self.tables.write().await.parents.get_mut(&id) {
            parent.last_login_at = Some(at);
            parent.status = "active".into();
        }
        Ok(())
    }

    async fn delivery_record(&self, subject: SubjectRef) -> StoreResult<Option<DeliveryRecord>> {
        Ok(self
            .tables
            .read()
            .await
            .delivery_records
            .get(&subject)
            .cloned())
    }

    async fn save_delivery_record(&self, record: &DeliveryRecord) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .delivery_records
            .insert(record.subject, record.clone());
        Ok(())
    }

    async fn otp_challenge(&self, phone_hash: &str) -> StoreResult<Option<OtpChallenge>> {
        Ok(self
            .tables
            .read()
            .await
            .otp_challenges
            .get(phone_hash)
            .cloned())
    }

    async fn put_otp_challenge(&self, challenge: &OtpChallenge) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .otp_challenges
            .insert(challenge.phone_hash.clone(), challenge.clone());
        Ok(())
    }

    async fn increment_otp_verify_attempts(&self, phone_hash: &str) -> StoreResult<()> {
        if let Some(c) = self.tables.write().await.otp_challenges.get_mut(phone_hash) {
            c.verify_attempts += 1;
        }
        Ok(())
    }

    async fn delete_otp_challenge(&self, phone_hash: &str) -> StoreResult<()> {
        self.tables.write().await.otp_challenges.remove(phone_hash);
        Ok(())
    }

    async fn append_otp_log(&self, phone: &str, kind: &str, channel: &str) -> StoreResult<()> {
        let id = self.allocate_id();
        self.tables.write().await.otp_logs.push(OtpLog {
            id,
            phone: phone.to_string(),
            kind: kind.to_string(),
            channel: channel.to_string(),
            sent_at: Utc::now(),
        });
        Ok(())
    }

    async fn check_and_record_action(
        &self,
        subject_key: &str,
        action: &str,
        window: (Timestamp, Timestamp),
        limit: i64,
        at: Timestamp,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let (start, end) = window;
        let count = tables
            .actions
            .iter()
            .filter(|(key, act, t)| key == subject_key && act == action && *t >= start && *t < end)
            .count() as i64;
        if !admits(count, limit) {
            return Ok(false);
        }
        tables
            .actions
            .push((subject_key.to_string(), action.to_string(), at));
        Ok(true)
    }
}
