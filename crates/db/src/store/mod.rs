//! Storage seam for the notification engine.
//!
//! [`NotifyStore`] is everything the dispatch, OTP, rate-limit and reminder
//! paths read or write. [`postgres::PgStore`] backs it with the repositories;
//! [`memory::MemoryStore`] keeps it in process for tests and local runs.

use async_trait::async_trait;
use classpulse_core::delivery::{DeliveryRecord, SubjectRef};
use classpulse_core::otp::OtpChallenge;
use classpulse_core::types::{DbId, Timestamp};
use thiserror::Error;

use crate::models::attendance::{AttendanceEntry, AttendanceRecord};
use crate::models::institute::{Batch, Institute, Student};
use crate::models::invitation::TeacherInvitation;
use crate::models::invoice::{Invoice, NewPaymentReminder};
use crate::models::leave_request::LeaveRequest;
use crate::models::parent::Parent;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// A stored value could not be read back into its domain type.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait NotifyStore: Send + Sync {
    async fn health_check(&self) -> StoreResult<()>;

    // Directory lookups.
    async fn institute(&self, id: DbId) -> StoreResult<Option<Institute>>;
    /// Institutes ordered by id, strictly after `after`, at most `limit`.
    async fn institutes_page(&self, after: Option<DbId>, limit: i64)
        -> StoreResult<Vec<Institute>>;
    async fn batch(&self, id: DbId) -> StoreResult<Option<Batch>>;
    async fn student(&self, id: DbId) -> StoreResult<Option<Student>>;
    /// Institute of the teacher with this user id.
    async fn teacher_institute(&self, user_id: DbId) -> StoreResult<Option<DbId>>;
    async fn invitation(&self, id: DbId) -> StoreResult<Option<TeacherInvitation>>;

    // Attendance.
    async fn attendance(&self, id: DbId) -> StoreResult<Option<AttendanceEntry>>;
    async fn attendance_record(&self, record_id: DbId) -> StoreResult<Option<AttendanceRecord>>;
    async fn attendance_records(&self, attendance_id: DbId) -> StoreResult<Vec<AttendanceRecord>>;
    async fn mark_attendance_processed(&self, attendance_id: DbId, sent: i32) -> StoreResult<()>;

    // Fees.
    async fn invoice(&self, id: DbId) -> StoreResult<Option<Invoice>>;
    async fn overdue_invoices(&self, institute_id: DbId, now: Timestamp)
        -> StoreResult<Vec<Invoice>>;
    async fn append_payment_reminder(&self, reminder: &NewPaymentReminder) -> StoreResult<DbId>;

    async fn leave_request(&self, id: DbId) -> StoreResult<Option<LeaveRequest>>;

    // Parents.
    async fn parent(&self, id: DbId) -> StoreResult<Option<Parent>>;
    async fn parent_by_phone(&self, normalized_phone: &str) -> StoreResult<Option<Parent>>;
    async fn record_parent_login(&self, id: DbId, at: Timestamp) -> StoreResult<()>;

    // Delivery records.
    async fn delivery_record(&self, subject: SubjectRef) -> StoreResult<Option<DeliveryRecord>>;
    async fn save_delivery_record(&self, record: &DeliveryRecord) -> StoreResult<()>;

    // OTP.
    async fn otp_challenge(&self, phone_hash: &str) -> StoreResult<Option<OtpChallenge>>;
    async fn put_otp_challenge(&self, challenge: &OtpChallenge) -> StoreResult<()>;
    async fn increment_otp_verify_attempts(&self, phone_hash: &str) -> StoreResult<()>;
    async fn delete_otp_challenge(&self, phone_hash: &str) -> StoreResult<()>;
    async fn append_otp_log(&self, phone: &str, kind: &str, channel: &str) -> StoreResult<()>;

    /// Count actions in `window`; record one at `at` and return `true` only
    /// when fewer than `limit` were found.
    async fn check_and_record_action(
        &self,
        subject_key: &str,
        action: &str,
        window: (Timestamp, Timestamp),
        limit: i64,
        at: Timestamp,
    ) -> StoreResult<bool>;
}
