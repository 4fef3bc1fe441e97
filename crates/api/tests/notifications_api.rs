//! Integration tests for `/notifications` and `/invitations`.

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use classpulse_api::auth::jwt::generate_parent_session;
use classpulse_core::delivery::{DeliveryRecord, SubjectKind, SubjectRef};
use classpulse_core::messages::TEST_MESSAGE;
use classpulse_db::models::institute::Institute;
use classpulse_db::models::invitation::TeacherInvitation;
use classpulse_db::store::NotifyStore;
use common::{body_json, post_json, post_json_auth, TestApp};
use serde_json::json;

const INSTITUTE: i64 = 1;
const TEACHER: i64 = 7;

async fn seed(app: &TestApp) {
    app.store
        .insert_institute(Institute {
            id: INSTITUTE,
            name: "Apex Academy".into(),
            notifications_enabled: true,
            notify_for_present: false,
            absent_template: None,
            late_template: None,
            present_template: None,
        })
        .await;
    app.store.insert_teacher(TEACHER, INSTITUTE).await;
    app.store.insert_teacher(8, 2).await;
    app.store
        .insert_invitation(TeacherInvitation {
            id: 20,
            institute_id: INSTITUTE,
            institute_name: "Apex Academy".into(),
            phone: "9876543210".into(),
            role: "teacher".into(),
            invited_by: Some(TEACHER),
            invited_at: Utc::now(),
            expires_at: None,
            is_accepted: false,
        })
        .await;
}

async fn seed_failed_invitation_delivery(app: &TestApp, failures: i32) {
    let mut record = DeliveryRecord::pending(
        SubjectRef::new(SubjectKind::Invitation, 20),
        Some(INSTITUTE),
        "9876543210",
    );
    for _ in 0..failures {
        record.mark_failed(Some("fake-sms"), "gateway down", Utc::now());
    }
    app.store.save_delivery_record(&record).await.unwrap();
}

// ---------------------------------------------------------------------------
// POST /notifications/test
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_notification_requires_auth() {
    let app = common::build_test_app();
    let response = post_json(
        app.router(),
        "/api/v1/notifications/test",
        json!({ "phone_number": "9876543210", "channel": "sms" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_notification_rejects_parent_sessions() {
    let app = common::build_test_app();
    let token = generate_parent_session(11, INSTITUTE, &app.config.jwt).unwrap();
    let response = post_json_auth(
        app.router(),
        "/api/v1/notifications/test",
        &token,
        json!({ "phone_number": "9876543210", "channel": "sms" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_notification_uses_requested_channel_only() {
    let app = common::build_test_app();
    let token = app.staff_token(TEACHER);

    let response = post_json_auth(
        app.router(),
        "/api/v1/notifications/test",
        &token,
        json!({ "phone_number": "98765 43210", "channel": "sms" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["channel"], "sms");
    assert_eq!(json["data"]["provider"], "fake-sms");
    assert_eq!(json["data"]["message_id"], "fake-sms-1");

    let sent = app.sms.sent().await;
    assert_eq!(sent, vec![("+919876543210".to_string(), TEST_MESSAGE.to_string())]);
    assert!(app.whatsapp.sent().await.is_empty());
}

#[tokio::test]
async fn test_notification_does_not_fall_back() {
    let app = common::build_test_app_with(true, false);
    let token = app.staff_token(TEACHER);

    let response = post_json_auth(
        app.router(),
        "/api/v1/notifications/test",
        &token,
        json!({ "phone_number": "9876543210", "channel": "whatsapp" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "PROVIDER_ERROR");
    assert!(app.sms.sent().await.is_empty());
}

#[tokio::test]
async fn test_notification_sixth_call_in_an_hour_is_rate_limited() {
    let app = common::build_test_app();
    let token = app.staff_token(TEACHER);

    // Rejected calls still count against the limit.
    for _ in 0..5 {
        let response = post_json_auth(
            app.router(),
            "/api/v1/notifications/test",
            &token,
            json!({ "phone_number": "12345", "channel": "sms" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = post_json_auth(
        app.router(),
        "/api/v1/notifications/test",
        &token,
        json!({ "phone_number": "9876543210", "channel": "sms" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(app.sms.sent().await.is_empty());

    // Another caller has its own budget.
    let other = app.staff_token(TEACHER + 1);
    let response = post_json_auth(
        app.router(),
        "/api/v1/notifications/test",
        &other,
        json!({ "phone_number": "9876543210", "channel": "sms" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_notification_requires_phone() {
    let app = common::build_test_app();
    let token = app.staff_token(TEACHER);

    let response = post_json_auth(
        app.router(),
        "/api/v1/notifications/test",
        &token,
        json!({ "channel": "sms" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Phone number required");
}

// ---------------------------------------------------------------------------
// POST /notifications/retry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn retry_resends_a_failed_delivery() {
    let app = common::build_test_app();
    seed(&app).await;
    seed_failed_invitation_delivery(&app, 1).await;
    let token = app.staff_token(TEACHER);

    let response = post_json_auth(
        app.router(),
        "/api/v1/notifications/retry",
        &token,
        json!({ "kind": "invitation", "id": 20 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "sent");
    assert_eq!(json["data"]["retry_count"], 1);
    assert!(json["data"]["error"].is_null());

    let sent = app.sms.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "+919876543210");
    assert!(sent[0].1.starts_with("You've been invited to join Apex Academy"));
}

#[tokio::test]
async fn retry_refused_after_three_failures() {
    let app = common::build_test_app();
    seed(&app).await;
    seed_failed_invitation_delivery(&app, 3).await;
    let token = app.staff_token(TEACHER);

    let response = post_json_auth(
        app.router(),
        "/api/v1/notifications/retry",
        &token,
        json!({ "kind": "invitation", "id": 20 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    assert_eq!(body_json(response).await["code"], "RETRY_LIMIT_EXCEEDED");
    assert!(app.sms.sent().await.is_empty());
}

#[tokio::test]
async fn retry_requires_membership_of_the_institute() {
    let app = common::build_test_app();
    seed(&app).await;
    seed_failed_invitation_delivery(&app, 1).await;
    let outsider = app.staff_token(8);

    let response = post_json_auth(
        app.router(),
        "/api/v1/notifications/retry",
        &outsider,
        json!({ "kind": "invitation", "id": 20 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(app.sms.sent().await.is_empty());
}

#[tokio::test]
async fn retry_of_unknown_delivery_is_404() {
    let app = common::build_test_app();
    seed(&app).await;
    let token = app.staff_token(TEACHER);

    let response = post_json_auth(
        app.router(),
        "/api/v1/notifications/retry",
        &token,
        json!({ "kind": "attendance", "id": 999 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// POST /invitations/{id}/resend
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resend_invitation_sends_reminder_wording() {
    let app = common::build_test_app();
    seed(&app).await;
    let token = app.staff_token(TEACHER);

    let response = post_json_auth(app.router(), "/api/v1/invitations/20/resend", &token, json!({})).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "sent");
    assert_eq!(json["data"]["channel"], "sms");

    let sent = app.sms.sent().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0]
        .1
        .starts_with("Reminder: You've been invited to join Apex Academy as a teacher."));
    assert!(sent[0].1.ends_with("https://get.classpulse.test"));
}

#[tokio::test]
async fn resend_of_accepted_invitation_is_refused() {
    let app = common::build_test_app();
    seed(&app).await;
    let mut accepted = app.store.invitation(20).await.unwrap().unwrap();
    accepted.is_accepted = true;
    app.store.insert_invitation(accepted).await;
    let token = app.staff_token(TEACHER);

    let response = post_json_auth(app.router(), "/api/v1/invitations/20/resend", &token, json!({})).await;

    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    assert!(app.sms.sent().await.is_empty());
}

#[tokio::test]
async fn resend_refused_after_three_failures() {
    let app = common::build_test_app();
    seed(&app).await;
    seed_failed_invitation_delivery(&app, 3).await;
    let token = app.staff_token(TEACHER);

    let response = post_json_auth(app.router(), "/api/v1/invitations/20/resend", &token, json!({})).await;

    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    assert_eq!(body_json(response).await["code"], "RETRY_LIMIT_EXCEEDED");
    assert!(app.sms.sent().await.is_empty());
    let stored = app
        .store
        .delivery_record(SubjectRef::new(SubjectKind::Invitation, 20))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.retry_count, 3);
}

#[tokio::test]
async fn resend_surfaces_provider_failure() {
    let app = common::build_test_app_with(false, true);
    seed(&app).await;
    let token = app.staff_token(TEACHER);

    let response = post_json_auth(app.router(), "/api/v1/invitations/20/resend", &token, json!({})).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let stored = app
        .store
        .delivery_record(SubjectRef::new(SubjectKind::Invitation, 20))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.retry_count, 1);
}
