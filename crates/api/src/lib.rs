//! HTTP API server for the marketplace order/payment core.
//!
//! Provides the REST façade over the checkout coordinator, with
//! structured logging (tracing) and Prometheus metrics. The payment
//! workflow endpoints live under `/pays`; the supporting endpoints exist
//! so the workflow can be driven end-to-end.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::CheckoutCoordinator;
use gateway::PaymentGateway;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{BasketStore, MarketStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, G>(state: Arc<AppState<S, G>>, metrics_handle: PrometheusHandle) -> Router
where
    S: MarketStore + BasketStore + 'static,
    G: PaymentGateway + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/users", post(routes::users::create::<S, G>))
        .route("/basket", post(routes::basket::add::<S, G>))
        .route("/orders", post(routes::orders::create::<S, G>))
        .route("/orders/{id}", get(routes::orders::get::<S, G>))
        .route("/orders/{id}/accept", post(routes::orders::accept::<S, G>))
        .route("/orders/{id}/reject", post(routes::orders::reject::<S, G>))
        .route(
            "/orders/{id}/complete",
            post(routes::orders::complete::<S, G>),
        )
        .route("/pays/ready", post(routes::pays::ready::<S, G>))
        .route("/pays/success", get(routes::pays::success::<S, G>))
        .route("/pays/refund", post(routes::pays::refund::<S, G>))
        .route("/pays", get(routes::pays::list::<S, G>))
        .route("/pays/{id}", get(routes::pays::get::<S, G>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state around a store and a gateway client.
pub fn create_state<S, G>(store: S, gateway: G) -> Arc<AppState<S, G>>
where
    S: MarketStore + BasketStore + 'static,
    G: PaymentGateway + 'static,
{
    Arc::new(AppState {
        coordinator: CheckoutCoordinator::new(store, gateway),
    })
}
