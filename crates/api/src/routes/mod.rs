pub mod health;
pub mod institutes;
pub mod invitations;
pub mod notifications;
pub mod parents;
pub mod triggers;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /notifications/retry                              retry a failed delivery (staff)
/// /notifications/test                               send a test message (staff)
///
/// /invitations/{id}/resend                          resend a teacher invitation (staff)
///
/// /institutes/{id}/invoices/{invoice_id}/remind     manual payment reminder (staff)
///
/// /parents/otp/request                              send a login code (public)
/// /parents/otp/verify                               exchange a code for a session (public)
///
/// /webhooks/twilio                                  Twilio status callback (signed)
/// /webhooks/msg91                                   MSG91 status callback (authkey)
///
/// /triggers/{kind}                                  change-feed ingestion (trigger key)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/notifications", notifications::router())
        .nest("/invitations", invitations::router())
        .nest("/institutes", institutes::router())
        .nest("/parents", parents::router())
        .nest("/webhooks", webhooks::router())
        .nest("/triggers", triggers::router())
}
