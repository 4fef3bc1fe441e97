use std::sync::Arc;

use classpulse_db::store::NotifyStore;
use classpulse_events::{Composer, DeliveryOrchestrator, EventBus, ProviderSet, ReminderBatchJob};

use crate::auth::otp::OtpAuthenticator;
use crate::auth::rate_limit::RateLimiter;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn NotifyStore>,
    pub config: Arc<ServerConfig>,
    pub orchestrator: Arc<DeliveryOrchestrator>,
    pub composer: Arc<Composer>,
    pub reminders: Arc<ReminderBatchJob>,
    pub otp: Arc<OtpAuthenticator>,
    pub rate_limiter: RateLimiter,
    /// Trigger snapshots are published here for the trigger dispatcher.
    pub event_bus: Arc<EventBus>,
}

impl AppState {
    /// Wire the engine services over `store` and `providers`.
    pub fn new(
        store: Arc<dyn NotifyStore>,
        config: ServerConfig,
        providers: ProviderSet,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let orchestrator = Arc::new(DeliveryOrchestrator::new(
            Arc::clone(&store),
            providers,
            config.delivery.primary_channel,
        ));
        let composer = Arc::new(Composer::new(
            config.delivery.templates.clone(),
            config.app_download_link.clone(),
        ));
        let reminders = Arc::new(ReminderBatchJob::new(Arc::clone(&orchestrator)));
        let otp = Arc::new(OtpAuthenticator::new(
            Arc::clone(&orchestrator),
            config.jwt.clone(),
        ));

        Self {
            rate_limiter: RateLimiter::new(Arc::clone(&store)),
            store,
            config: Arc::new(config),
            orchestrator,
            composer,
            reminders,
            otp,
            event_bus,
        }
    }
}
