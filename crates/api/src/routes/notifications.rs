//! Route definitions for the `/notifications` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::notifications;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// POST /retry    -> retry      (staff)
/// POST /test     -> send_test  (staff, rate limited)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/retry", post(notifications::retry))
        .route("/test", post(notifications::send_test))
}
