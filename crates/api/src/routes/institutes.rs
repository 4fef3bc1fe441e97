use axum::routing::post;
use axum::Router;

use crate::handlers::institutes;
use crate::state::AppState;

/// Routes mounted at `/institutes`.
///
/// ```text
/// POST /{institute_id}/invoices/{invoice_id}/remind -> remind_invoice (staff)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{institute_id}/invoices/{invoice_id}/remind",
        post(institutes::remind_invoice),
    )
}
