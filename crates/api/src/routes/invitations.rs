use axum::routing::post;
use axum::Router;

use crate::handlers::invitations;
use crate::state::AppState;

/// Routes mounted at `/invitations`.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/resend", post(invitations::resend))
}
