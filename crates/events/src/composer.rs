//! Builds [`NotificationRequest`]s from entity snapshots.
//!
//! Each subject kind has one constructor here; [`Composer::rebuild`] reloads
//! a subject from the store so a manual retry renders exactly what the
//! original dispatch would have.

use classpulse_core::delivery::{SubjectKind, SubjectRef};
use classpulse_core::error::CoreError;
use classpulse_core::messages::{self, InviteRole, LeaveDecision};
use classpulse_core::render::{render_plain, render_rich, render_text, AttendanceFacts};
use classpulse_db::models::attendance::{AttendanceEntry, AttendanceRecord};
use classpulse_db::models::institute::{Batch, Institute};
use classpulse_db::models::invitation::TeacherInvitation;
use classpulse_db::models::leave_request::LeaveRequest;
use classpulse_db::store::NotifyStore;

use crate::delivery::TemplateCatalog;
use crate::error::EngineError;
use crate::orchestrator::{MessageContent, NotificationRequest, Plan};

/// Student name used when a leave request's student cannot be resolved.
const UNKNOWN_STUDENT: &str = "your child";

#[derive(Debug, Clone)]
pub struct Composer {
    templates: TemplateCatalog,
    download_link: String,
}

impl Composer {
    pub fn new(templates: TemplateCatalog, download_link: impl Into<String>) -> Self {
        Self {
            templates,
            download_link: download_link.into(),
        }
    }

    pub fn download_link(&self) -> &str {
        &self.download_link
    }

    /// One student's attendance, rendered for every channel.
    ///
    /// Returns `None` for a record without a parent phone.
    pub fn attendance(
        &self,
        institute: &Institute,
        batch: &Batch,
        entry: &AttendanceEntry,
        record: &AttendanceRecord,
    ) -> Result<Option<NotificationRequest>, CoreError> {
        let Some(phone) = record.parent_phone.as_deref().filter(|p| !p.trim().is_empty()) else {
            return Ok(None);
        };
        let facts = AttendanceFacts {
            student_name: record.student_name.clone(),
            batch_name: batch.name.clone(),
            institute_name: institute.name.clone(),
            status: record.status.parse()?,
            date: entry.date,
        };

        Ok(Some(NotificationRequest {
            subject: SubjectRef::new(SubjectKind::Attendance, record.id),
            institute_id: Some(institute.id),
            recipient: phone.to_string(),
            content: MessageContent {
                rich: Some(render_rich(&facts, &self.templates.rich)),
                text: render_text(&facts, &institute.templates()),
                plain: render_plain(&facts),
                sms_template_id: self.templates.sms_for_status(facts.status),
            },
            plan: Plan::Primary,
        }))
    }

    /// Invitation SMS; `reminder` selects the resend wording.
    pub fn invitation(&self, invitation: &TeacherInvitation, reminder: bool) -> NotificationRequest {
        let role = InviteRole::from_name(&invitation.role);
        let body = if reminder {
            messages::invitation_reminder(&invitation.institute_name, role, &self.download_link)
        } else {
            messages::invitation(&invitation.institute_name, role, &self.download_link)
        };
        NotificationRequest {
            subject: SubjectRef::new(SubjectKind::Invitation, invitation.id),
            institute_id: Some(invitation.institute_id),
            recipient: invitation.phone.clone(),
            content: MessageContent::text_only(body),
            plan: Plan::SmsOnly,
        }
    }

    /// Decision message for a reviewed leave request; `None` while pending.
    pub fn leave_decision(
        &self,
        request: &LeaveRequest,
        parent_phone: &str,
        student_name: Option<&str>,
    ) -> Option<NotificationRequest> {
        let decision = LeaveDecision::from_status(&request.status)?;
        let body = messages::leave_decision(
            decision,
            student_name.unwrap_or(UNKNOWN_STUDENT),
            request.start_date,
            request.end_date,
            request.review_notes.as_deref(),
        );
        Some(NotificationRequest {
            subject: SubjectRef::new(SubjectKind::LeaveDecision, request.id),
            institute_id: Some(request.institute_id),
            recipient: parent_phone.to_string(),
            content: MessageContent::text_only(body),
            plan: Plan::Primary,
        })
    }

    /// Reload `subject` and rebuild the request that notified it.
    pub async fn rebuild(
        &self,
        store: &dyn NotifyStore,
        subject: SubjectRef,
    ) -> Result<NotificationRequest, EngineError> {
        match subject.kind {
            SubjectKind::Attendance => {
                let record = store
                    .attendance_record(subject.id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("attendance record", subject.id))?;
                let entry = store
                    .attendance(record.attendance_id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("attendance", record.attendance_id))?;
                let institute = store
                    .institute(entry.institute_id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("institute", entry.institute_id))?;
                let batch = store
                    .batch(entry.batch_id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("batch", entry.batch_id))?;
                self.attendance(&institute, &batch, &entry, &record)?
                    .ok_or_else(|| {
                        CoreError::FailedPrecondition("Record has no parent phone".into()).into()
                    })
            }
            SubjectKind::Invitation => {
                let invitation = store
                    .invitation(subject.id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("invitation", subject.id))?;
                Ok(self.invitation(&invitation, false))
            }
            SubjectKind::LeaveDecision => {
                let request = store
                    .leave_request(subject.id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("leave request", subject.id))?;
                let parent = store
                    .parent(request.parent_id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("parent", request.parent_id))?;
                let student = store.student(request.student_id).await?;
                self.leave_decision(&request, &parent.phone, student.as_ref().map(|s| s.name.as_str()))
                    .ok_or_else(|| {
                        CoreError::FailedPrecondition("Leave request is still pending".into())
                            .into()
                    })
            }
            SubjectKind::PaymentReminder | SubjectKind::Test => Err(CoreError::Validation(
                format!("{} notifications cannot be retried", subject.kind),
            )
            .into()),
        }
    }
}
