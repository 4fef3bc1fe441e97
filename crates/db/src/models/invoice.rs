//! Fee invoices and the payment reminder audit log.

use classpulse_core::reminder::balance_due;
use classpulse_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `invoices` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Invoice {
    pub id: DbId,
    pub institute_id: DbId,
    pub student_id: DbId,
    pub batch_id: DbId,
    pub final_amount: f64,
    pub paid_amount: f64,
    pub due_date: Timestamp,
    pub status: String,
}

impl Invoice {
    pub fn balance_due(&self) -> f64 {
        balance_due(self.final_amount, self.paid_amount)
    }
}

/// A row from the `payment_reminders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PaymentReminder {
    pub id: DbId,
    pub institute_id: DbId,
    pub invoice_id: DbId,
    pub student_id: DbId,
    pub student_name: String,
    pub amount: f64,
    pub days_overdue: i64,
    pub channel: String,
    pub provider_message_id: Option<String>,
    pub manual: bool,
    pub sent_at: Timestamp,
}

/// DTO for appending a reminder audit entry.
#[derive(Debug, Clone)]
pub struct NewPaymentReminder {
    pub institute_id: DbId,
    pub invoice_id: DbId,
    pub student_id: DbId,
    pub student_name: String,
    pub amount: f64,
    pub days_overdue: i64,
    pub channel: String,
    pub provider_message_id: Option<String>,
    pub manual: bool,
}
