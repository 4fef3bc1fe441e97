//! Provider status callbacks. POST only; other methods answer 405.

use axum::routing::post;
use axum::Router;

use crate::handlers::webhooks;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/twilio", post(webhooks::twilio))
        .route("/msg91", post(webhooks::msg91))
}
