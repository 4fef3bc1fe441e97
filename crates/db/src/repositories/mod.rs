//! Repository layer: one zero-sized struct per table, each method taking the pool.

pub mod attendance_repo;
pub mod delivery_record_repo;
pub mod institute_repo;
pub mod invitation_repo;
pub mod invoice_repo;
pub mod leave_request_repo;
pub mod otp_repo;
pub mod parent_repo;
pub mod rate_limit_repo;

pub use attendance_repo::AttendanceRepo;
pub use delivery_record_repo::DeliveryRecordRepo;
pub use institute_repo::{BatchRepo, InstituteRepo, StudentRepo, TeacherRepo};
pub use invitation_repo::InvitationRepo;
pub use invoice_repo::{InvoiceRepo, PaymentReminderRepo};
pub use leave_request_repo::LeaveRequestRepo;
pub use otp_repo::{OtpChallengeRepo, OtpLogRepo};
pub use parent_repo::ParentRepo;
pub use rate_limit_repo::RateLimitRepo;
