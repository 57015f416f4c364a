//! HTTP API server for the parking reservation engine.
//!
//! Exposes slot catalog, fee policy, reservation, booking and token
//! endpoints, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use reservation::{EngineSettings, ReservationEngine};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EventStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/slots",
            post(routes::slots::create::<S>).get(routes::slots::list::<S>),
        )
        .route("/slots/available", get(routes::slots::list_available::<S>))
        .route(
            "/slots/{id}",
            get(routes::slots::get::<S>)
                .put(routes::slots::update::<S>)
                .delete(routes::slots::delete::<S>),
        )
        .route("/slots/{id}/rate", put(routes::slots::set_rate::<S>))
        .route(
            "/fee-policy",
            get(routes::fee_policy::get::<S>).put(routes::fee_policy::update::<S>),
        )
        .route("/reservations", post(routes::bookings::create::<S>))
        .route("/bookings/{id}", get(routes::bookings::get::<S>))
        .route("/bookings/{id}/token", get(routes::bookings::token::<S>))
        .route("/bookings/{id}/cancel", post(routes::bookings::cancel::<S>))
        .route(
            "/bookings/{id}/complete",
            post(routes::bookings::complete::<S>),
        )
        .route(
            "/users/{id}/bookings",
            get(routes::bookings::list_by_user::<S>),
        )
        .route("/tokens/validate", post(routes::tokens::validate::<S>))
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

/// Wires the engine over `event_store` and wraps it in shared state.
pub fn create_default_state<S: EventStore + Clone + 'static>(
    event_store: S,
    settings: EngineSettings,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        engine: ReservationEngine::new(event_store, settings),
    })
}
