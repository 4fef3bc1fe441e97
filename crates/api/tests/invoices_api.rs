//! Integration tests for manual payment reminders.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use classpulse_db::models::institute::{Batch, Institute, Student};
use classpulse_db::models::invoice::Invoice;
use common::{body_json, post_json_auth, TestApp};
use serde_json::json;

async fn seed(app: &TestApp) {
    for (id, name) in [(1, "Apex Academy"), (2, "Zenith Classes")] {
        app.store
            .insert_institute(Institute {
                id,
                name: name.into(),
                notifications_enabled: true,
                notify_for_present: false,
                absent_template: None,
                late_template: None,
                present_template: None,
            })
            .await;
    }
    app.store.insert_teacher(7, 1).await;
    app.store
        .insert_batch(Batch {
            id: 4,
            institute_id: 1,
            name: "NEET Bio".into(),
        })
        .await;
    app.store
        .insert_student(Student {
            id: 50,
            institute_id: 1,
            batch_id: 4,
            name: "Diya".into(),
            parent_phone: Some("9876543210".into()),
        })
        .await;
    app.store
        .insert_invoice(invoice(70, 1, 0.0, Utc::now() - Duration::days(3) - Duration::hours(1)))
        .await;
    app.store
        .insert_invoice(invoice(71, 2, 0.0, Utc::now() - Duration::days(3)))
        .await;
}

fn invoice(id: i64, institute_id: i64, paid: f64, due: chrono::DateTime<Utc>) -> Invoice {
    Invoice {
        id,
        institute_id,
        student_id: 50,
        batch_id: 4,
        final_amount: 1500.0,
        paid_amount: paid,
        due_date: due,
        status: "pending".into(),
    }
}

#[tokio::test]
async fn manual_reminder_is_sent_and_audited() {
    let app = common::build_test_app();
    seed(&app).await;
    let token = app.staff_token(7);

    let response = post_json_auth(
        app.router(),
        "/api/v1/institutes/1/invoices/70/remind",
        &token,
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["invoice_id"], 70);
    assert_eq!(json["data"]["amount"], 1500.0);
    assert_eq!(json["data"]["days_overdue"], 3);
    assert_eq!(json["data"]["channel"], "whatsapp");

    let sent = app.whatsapp.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].1,
        "Payment Reminder: Diya's fee of Rs.1500 for NEET Bio is overdue by 3 days. \
         Please clear the dues at the earliest. - Apex Academy"
    );

    let audit = app.store.payment_reminders().await;
    assert_eq!(audit.len(), 1);
    assert!(audit[0].manual);
    assert_eq!(audit[0].days_overdue, 3);
}

#[tokio::test]
async fn manual_reminder_falls_back_to_sms() {
    let app = common::build_test_app_with(true, false);
    seed(&app).await;
    let token = app.staff_token(7);

    let response = post_json_auth(
        app.router(),
        "/api/v1/institutes/1/invoices/70/remind",
        &token,
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["channel"], "sms");
    assert_eq!(app.sms.sent().await.len(), 1);
}

#[tokio::test]
async fn paid_invoice_is_not_reminded() {
    let app = common::build_test_app();
    seed(&app).await;
    app.store
        .insert_invoice(invoice(70, 1, 1500.0, Utc::now() - Duration::days(3)))
        .await;
    let token = app.staff_token(7);

    let response = post_json_auth(
        app.router(),
        "/api/v1/institutes/1/invoices/70/remind",
        &token,
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    assert!(app.whatsapp.sent().await.is_empty());
    assert!(app.store.payment_reminders().await.is_empty());
}

#[tokio::test]
async fn invoice_of_another_institute_is_not_found() {
    let app = common::build_test_app();
    seed(&app).await;
    let token = app.staff_token(7);

    let response = post_json_auth(
        app.router(),
        "/api/v1/institutes/1/invoices/71/remind",
        &token,
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn staff_of_another_institute_is_forbidden() {
    let app = common::build_test_app();
    seed(&app).await;
    let token = app.staff_token(7);

    let response = post_json_auth(
        app.router(),
        "/api/v1/institutes/2/invoices/71/remind",
        &token,
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(app.whatsapp.sent().await.is_empty());
}
