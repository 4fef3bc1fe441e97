//! Fee invoice arithmetic for payment reminders.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Partial => "partial",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }

    /// Statuses the reminder scan considers.
    pub fn is_remindable(self) -> bool {
        matches!(self, InvoiceStatus::Pending | InvoiceStatus::Partial)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvoiceStatus::Pending),
            "partial" => Ok(InvoiceStatus::Partial),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            other => Err(CoreError::Validation(format!(
                "Unknown invoice status '{other}'"
            ))),
        }
    }
}

pub fn balance_due(final_amount: f64, paid_amount: f64) -> f64 {
    final_amount - paid_amount
}

/// Whole days elapsed since `due_date`; negative when not yet due.
pub fn days_overdue(due_date: Timestamp, now: Timestamp) -> i64 {
    (now - due_date).num_seconds().div_euclid(86_400)
}

/// `Rs.1500` style rupee amount, rounded to whole rupees.
pub fn format_amount(amount: f64) -> String {
    format!("Rs.{amount:.0}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn days_overdue_floors() {
        let due = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(days_overdue(due, due), 0);
        assert_eq!(days_overdue(due, due + Duration::hours(23)), 0);
        assert_eq!(days_overdue(due, due + Duration::hours(25)), 1);
        assert_eq!(days_overdue(due, due + Duration::days(12)), 12);
        assert_eq!(days_overdue(due, due - Duration::hours(1)), -1);
    }

    #[test]
    fn balance_and_amount_format() {
        assert_eq!(balance_due(2500.0, 1000.0), 1500.0);
        assert!(balance_due(1000.0, 1000.0) <= 0.0);
        assert_eq!(format_amount(1500.0), "Rs.1500");
        assert_eq!(format_amount(1499.6), "Rs.1500");
    }

    #[test]
    fn only_open_invoices_are_remindable() {
        assert!(InvoiceStatus::Pending.is_remindable());
        assert!(InvoiceStatus::Partial.is_remindable());
        assert!(!InvoiceStatus::Paid.is_remindable());
        assert!(!"overdue".parse::<InvoiceStatus>().unwrap().is_remindable());
    }
}
