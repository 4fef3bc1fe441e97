use axum::extract::State;
use axum::{routing::get, Json, Router};
use classpulse_core::delivery::Channel;
use classpulse_events::{Plan, ProviderClient};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the store is down or no primary binding exists.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    pub delivery: DeliveryHealth,
}

/// Delivery bindings as wired at start-up.
#[derive(Serialize)]
pub struct DeliveryHealth {
    pub primary: Channel,
    /// Bindings the primary plan tries, in order.
    pub chain: Vec<&'static str>,
    /// Every configured binding.
    pub configured: Vec<&'static str>,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = state.store.health_check().await.is_ok();

    let orchestrator = &state.orchestrator;
    let delivery = DeliveryHealth {
        primary: orchestrator.primary(),
        chain: orchestrator
            .chain(Plan::Primary)
            .iter()
            .map(|p| p.name())
            .collect(),
        configured: orchestrator.providers().describe(),
    };

    let status = if db_healthy && !delivery.chain.is_empty() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        delivery,
    })
}

/// Root-level route, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
