//! HTTP surface for the store inventory service.
//!
//! Exposes the stock admin endpoints, the inbound event delivery seam, and
//! health/metrics, with structured logging (tracing) and Prometheus metrics.

pub mod catalog;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use egress::{EventBus, InMemoryEventBus};
use ledger::{InMemoryLedger, ReservationLedger, StockLedger};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::OrderEventConsumer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use catalog::{InMemoryCatalog, ProductCatalog};

/// Shared application state accessible from all handlers.
pub struct AppState<L, B>
where
    L: StockLedger + ReservationLedger,
    B: EventBus,
{
    pub ledger: L,
    pub consumer: OrderEventConsumer<L, L, B>,
    pub catalog: Arc<dyn ProductCatalog>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<L, B>(state: Arc<AppState<L, B>>, metrics_handle: PrometheusHandle) -> Router
where
    L: StockLedger + ReservationLedger + Clone + 'static,
    B: EventBus + Clone + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/stock", post(routes::stock::create::<L, B>))
        .route(
            "/stock/{store_id}/{product_id}",
            get(routes::stock::get::<L, B>),
        )
        .route(
            "/stock/{store_id}/{product_id}/quantity",
            put(routes::stock::set_quantity::<L, B>),
        )
        .route(
            "/stores/{store_id}/stock",
            get(routes::stock::list_by_store::<L, B>),
        )
        .route(
            "/events/order-created",
            post(routes::events::order_created::<L, B>),
        )
        .route(
            "/events/order-canceled",
            post(routes::events::order_canceled::<L, B>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Builds application state over the in-memory ledger, bus, and catalog.
///
/// Returns the concrete handles alongside the state so tests (and the local
/// binary) can seed stock and inspect published events.
pub fn create_default_state(
    merchant_email: &str,
) -> (
    Arc<AppState<InMemoryLedger, InMemoryEventBus>>,
    InMemoryLedger,
    InMemoryEventBus,
    Arc<InMemoryCatalog>,
) {
    let ledger = InMemoryLedger::new();
    let bus = InMemoryEventBus::new();
    let catalog = Arc::new(InMemoryCatalog::new());

    let consumer = OrderEventConsumer::new(
        ledger.clone(),
        ledger.clone(),
        bus.clone(),
        merchant_email,
    );
    let state = Arc::new(AppState {
        ledger: ledger.clone(),
        consumer,
        catalog: catalog.clone(),
    });

    (state, ledger, bus, catalog)
}
