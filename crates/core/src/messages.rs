//! Fixed-wording messages outside the attendance templates.

use crate::render::short_date;
use crate::reminder::format_amount;
use crate::types::Timestamp;

pub const TEST_MESSAGE: &str = "ClassPulse Test: This is a test notification. \
    If you received this, notifications are working correctly!";

/// Role named in a teacher invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteRole {
    Admin,
    Teacher,
}

impl InviteRole {
    pub fn from_name(name: &str) -> Self {
        if name == "admin" {
            InviteRole::Admin
        } else {
            InviteRole::Teacher
        }
    }

    fn label(self) -> &'static str {
        match self {
            InviteRole::Admin => "administrator",
            InviteRole::Teacher => "teacher",
        }
    }
}

pub fn invitation(institute_name: &str, role: InviteRole, download_link: &str) -> String {
    format!(
        "You've been invited to join {institute_name} as a {} on ClassPulse. Download: {download_link}",
        role.label()
    )
}

pub fn invitation_reminder(institute_name: &str, role: InviteRole, download_link: &str) -> String {
    format!(
        "Reminder: You've been invited to join {institute_name} as a {}. Download ClassPulse: {download_link}",
        role.label()
    )
}

pub fn otp(code: &str) -> String {
    format!("Your ClassPulse verification code is {code}. Valid for 10 minutes. Do not share this code.")
}

/// Payment reminder body; uses the "due soon" wording when `days_overdue <= 0`.
pub fn payment_reminder(
    student_name: &str,
    balance: f64,
    batch_name: &str,
    days_overdue: i64,
    institute_name: &str,
) -> String {
    let amount = format_amount(balance);
    if days_overdue > 0 {
        let plural = if days_overdue == 1 { "" } else { "s" };
        format!(
            "Payment Reminder: {student_name}'s fee of {amount} for {batch_name} \
             is overdue by {days_overdue} day{plural}. \
             Please clear the dues at the earliest. - {institute_name}"
        )
    } else {
        format!(
            "Payment Reminder: {student_name}'s fee of {amount} for {batch_name} \
             is due soon. Please make the payment before the due date. - {institute_name}"
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
    Approved,
    Rejected,
}

impl LeaveDecision {
    pub fn from_status(status: &str) -> Option<Self> {
        match status {
            "approved" => Some(LeaveDecision::Approved),
            "rejected" => Some(LeaveDecision::Rejected),
            _ => None,
        }
    }
}

pub fn leave_decision(
    decision: LeaveDecision,
    student_name: &str,
    start: Timestamp,
    end: Timestamp,
    review_notes: Option<&str>,
) -> String {
    let start_label = short_date(start);
    let end_label = short_date(end);
    let range = if start_label == end_label {
        start_label
    } else {
        format!("{start_label} - {end_label}")
    };

    let mut message = match decision {
        LeaveDecision::Approved => format!(
            "Leave Approved\n\nGood news! The leave request for {student_name} ({range}) has been approved."
        ),
        LeaveDecision::Rejected => format!(
            "Leave Rejected\n\nThe leave request for {student_name} ({range}) was not approved."
        ),
    };
    if let Some(notes) = review_notes.filter(|n| !n.trim().is_empty()) {
        message.push_str("\n\nNote from teacher: ");
        message.push_str(notes);
    }
    message.push_str("\n\n- ClassPulse");
    message
}
