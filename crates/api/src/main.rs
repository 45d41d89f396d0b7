//! Service entry point.

use std::sync::Arc;

use api::catalog::InMemoryCatalog;
use api::config::Config;
use api::{AppState, create_app};
use egress::InMemoryEventBus;
use ledger::PostgresLedger;
use saga::OrderEventConsumer;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn serve(app: axum::Router, addr: &str) {
    tracing::info!(%addr, "starting store inventory service");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let config = Config::from_env();

    // The broker client is provisioned outside this service; until one is
    // wired in, outbound events are recorded on the in-memory bus.
    match &config.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("failed to connect to database");
            let ledger = PostgresLedger::new(pool);
            ledger.run_migrations().await.expect("migrations failed");

            let bus = InMemoryEventBus::new();
            let catalog = Arc::new(InMemoryCatalog::new());
            let consumer = OrderEventConsumer::new(
                ledger.clone(),
                ledger.clone(),
                bus.clone(),
                config.merchant_email.clone(),
            );
            let state = Arc::new(AppState {
                ledger,
                consumer,
                catalog,
            });

            let app = create_app(state, metrics_handle);
            serve(app, &config.addr()).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory ledger");
            let (state, _ledger, _bus, _catalog) = api::create_default_state(&config.merchant_email);
            let app = create_app(state, metrics_handle);
            serve(app, &config.addr()).await;
        }
    }
}
