//! Repositories for `invoices` and the `payment_reminders` audit log.

use classpulse_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::invoice::{Invoice, NewPaymentReminder};

const INVOICE_COLUMNS: &str =
    "id, institute_id, student_id, batch_id, final_amount, paid_amount, due_date, status";

pub struct InvoiceRepo;

impl InvoiceRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Invoice>, sqlx::Error> {
        let query = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1");
        sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Open (`pending`/`partial`) invoices of an institute whose due date has passed.
    pub async fn list_overdue(
        pool: &PgPool,
        institute_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<Invoice>, sqlx::Error> {
        let query = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices \
             WHERE institute_id = $1 \
               AND status IN ('pending', 'partial') \
               AND due_date < $2 \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, Invoice>(&query)
            .bind(institute_id)
            .bind(now)
            .fetch_all(pool)
            .await
    }
}

pub struct PaymentReminderRepo;

impl PaymentReminderRepo {
    pub async fn create(pool: &PgPool, input: &NewPaymentReminder) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO payment_reminders \
                (institute_id, invoice_id, student_id, student_name, amount, days_overdue, \
                 channel, provider_message_id, manual) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(input.institute_id)
        .bind(input.invoice_id)
        .bind(input.student_id)
        .bind(&input.student_name)
        .bind(input.amount)
        .bind(input.days_overdue)
        .bind(&input.channel)
        .bind(&input.provider_message_id)
        .bind(input.manual)
        .fetch_one(pool)
        .await
    }
}
