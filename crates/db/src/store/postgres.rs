//! [`NotifyStore`] over Postgres, delegating to the repositories.

use async_trait::async_trait;
use classpulse_core::delivery::{DeliveryRecord, SubjectRef};
use classpulse_core::otp::OtpChallenge;
use classpulse_core::types::{DbId, Timestamp};

use super::{NotifyStore, StoreError, StoreResult};
use crate::models::attendance::{AttendanceEntry, AttendanceRecord};
use crate::models::institute::{Batch, Institute, Student};
use crate::models::invitation::TeacherInvitation;
use crate::models::invoice::{Invoice, NewPaymentReminder};
use crate::models::leave_request::LeaveRequest;
use crate::models::parent::Parent;
use crate::repositories::{
    AttendanceRepo, BatchRepo, DeliveryRecordRepo, InstituteRepo, InvitationRepo, InvoiceRepo,
    LeaveRequestRepo, OtpChallengeRepo, OtpLogRepo, ParentRepo, PaymentReminderRepo,
    RateLimitRepo, StudentRepo, TeacherRepo,
};
use crate::DbPool;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl NotifyStore for PgStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(crate::health_check(&self.pool).await?)
    }

    async fn institute(&self, id: DbId) -> StoreResult<Option<Institute>> {
        Ok(InstituteRepo::find_by_id(&self.pool, id).await?)
    }

    async fn institutes_page(
        &self,
        after: Option<DbId>,
        limit: i64,
    ) -> StoreResult<Vec<Institute>> {
        Ok(InstituteRepo::list_page(&self.pool, after, limit).await?)
    }

    async fn batch(&self, id: DbId) -> StoreResult<Option<Batch>> {
        Ok(BatchRepo::find_by_id(&self.pool, id).await?)
    }

    async fn student(&self, id: DbId) -> StoreResult<Option<Student>> {
        Ok(StudentRepo::find_by_id(&self.pool, id).await?)
    }

    async fn teacher_institute(&self, user_id: DbId) -> StoreResult<Option<DbId>> {
        Ok(TeacherRepo::institute_of(&self.pool, user_id).await?)
    }

    async fn invitation(&self, id: DbId) -> StoreResult<Option<TeacherInvitation>> {
        Ok(InvitationRepo::find_by_id(&self.pool, id).await?)
    }

    async fn attendance(&self, id: DbId) -> StoreResult<Option<AttendanceEntry>> {
        Ok(AttendanceRepo::find_by_id(&self.pool, id).await?)
    }

    async fn attendance_record(&self, record_id: DbId) -> StoreResult<Option<AttendanceRecord>> {
        Ok(AttendanceRepo::find_record(&self.pool, record_id).await?)
    }

    async fn attendance_records(&self, attendance_id: DbId) -> StoreResult<Vec<AttendanceRecord>> {
        Ok(AttendanceRepo::list_records(&self.pool, attendance_id).await?)
    }

    async fn mark_attendance_processed(&self, attendance_id: DbId, sent: i32) -> StoreResult<()> {
        AttendanceRepo::mark_processed(&self.pool, attendance_id, sent).await?;
        Ok(())
    }

    async fn invoice(&self, id: DbId) -> StoreResult<Option<Invoice>> {
        Ok(InvoiceRepo::find_by_id(&self.pool, id).await?)
    }

    async fn overdue_invoices(
        &self,
        institute_id: DbId,
        now: Timestamp,
    ) -> StoreResult<Vec<Invoice>> {
        Ok(InvoiceRepo::list_overdue(&self.pool, institute_id, now).await?)
    }

    async fn append_payment_reminder(&self, reminder: &NewPaymentReminder) -> StoreResult<DbId> {
        Ok(PaymentReminderRepo::create(&self.pool, reminder).await?)
    }

    async fn leave_request(&self, id: DbId) -> StoreResult<Option<LeaveRequest>> {
        Ok(LeaveRequestRepo::find_by_id(&self.pool, id).await?)
    }

    async fn parent(&self, id: DbId) -> StoreResult<Option<Parent>> {
        Ok(ParentRepo::find_by_id(&self.pool, id).await?)
    }

    async fn parent_by_phone(&self, normalized_phone: &str) -> StoreResult<Option<Parent>> {
        Ok(ParentRepo::find_by_phone(&self.pool, normalized_phone).await?)
    }

    async fn record_parent_login(&self, id: DbId, at: Timestamp) -> StoreResult<()> {
        ParentRepo::record_login(&self.pool, id, at).await?;
        Ok(())
    }

    async fn delivery_record(&self, subject: SubjectRef) -> StoreResult<Option<DeliveryRecord>> {
        DeliveryRecordRepo::find(&self.pool, subject)
            .await?
            .map(|row| {
                DeliveryRecord::try_from(row).map_err(|e| StoreError::Corrupt(e.to_string()))
            })
            .transpose()
    }

    async fn save_delivery_record(&self, record: &DeliveryRecord) -> StoreResult<()> {
        Ok(DeliveryRecordRepo::upsert(&self.pool, record).await?)
    }

    async fn otp_challenge(&self, phone_hash: &str) -> StoreResult<Option<OtpChallenge>> {
        Ok(OtpChallengeRepo::find(&self.pool, phone_hash)
            .await?
            .map(OtpChallenge::from))
    }

    async fn put_otp_challenge(&self, challenge: &OtpChallenge) -> StoreResult<()> {
        Ok(OtpChallengeRepo::put(&self.pool, challenge).await?)
    }

    async fn increment_otp_verify_attempts(&self, phone_hash: &str) -> StoreResult<()> {
        OtpChallengeRepo::increment_verify_attempts(&self.pool, phone_hash).await?;
        Ok(())
    }

    async fn delete_otp_challenge(&self, phone_hash: &str) -> StoreResult<()> {
        OtpChallengeRepo::delete(&self.pool, phone_hash).await?;
        Ok(())
    }

    async fn append_otp_log(&self, phone: &str, kind: &str, channel: &str) -> StoreResult<()> {
        Ok(OtpLogRepo::create(&self.pool, phone, kind, channel).await?)
    }

    async fn check_and_record_action(
        &self,
        subject_key: &str,
        action: &str,
        window: (Timestamp, Timestamp),
        limit: i64,
        at: Timestamp,
    ) -> StoreResult<bool> {
        Ok(RateLimitRepo::check_and_record(&self.pool, subject_key, action, window, limit, at).await?)
    }
}
