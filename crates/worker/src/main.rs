use std::sync::Arc;
use std::time::Duration;

use classpulse_db::store::postgres::PgStore;
use classpulse_events::{DeliveryOrchestrator, ProviderSet, ReminderBatchJob};
use classpulse_worker::{ReminderScheduler, WorkerConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Outbound provider calls give up after this long.
const PROVIDER_TIMEOUT_SECS: u64 = 15;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "classpulse_worker=debug,classpulse_events=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let config = WorkerConfig::from_env();
    tracing::info!(
        schedule = ?config.schedule,
        budget_secs = config.budget.as_secs(),
        "Loaded worker configuration"
    );

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = classpulse_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    classpulse_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database connection pool created");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(PROVIDER_TIMEOUT_SECS))
        .build()
        .expect("Failed to build HTTP client");
    let providers = ProviderSet::from_config(&config.delivery, http);
    tracing::info!(providers = ?providers.describe(), "Delivery providers configured");

    let orchestrator = Arc::new(DeliveryOrchestrator::new(
        Arc::new(PgStore::new(pool)),
        providers,
        config.delivery.primary_channel,
    ));
    let job = Arc::new(ReminderBatchJob::new(orchestrator).with_budget(config.budget));
    let scheduler = ReminderScheduler::new(job, config.schedule);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.cancel();
    });

    scheduler.run(cancel).await;
    tracing::info!("Worker stopped");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
