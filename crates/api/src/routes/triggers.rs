use axum::routing::post;
use axum::Router;

use crate::handlers::triggers;
use crate::state::AppState;

/// Routes mounted at `/triggers`, authenticated by `x-trigger-key`.
///
/// ```text
/// POST /attendance-submitted
/// POST /invitation-created
/// POST /leave-request-updated
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{kind}", post(triggers::ingest))
}
