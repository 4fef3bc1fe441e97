use axum::routing::post;
use axum::Router;

use crate::handlers::parents;
use crate::state::AppState;

/// Routes mounted at `/parents`. Public: callers have no session yet.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/otp/request", post(parents::request_otp))
        .route("/otp/verify", post(parents::verify_otp))
}
