//! HTTP API server with observability for the seat reservation system.
//!
//! Provides REST endpoints for booking, cancelling, and looking up seats,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::ReservationService;
use metrics_exporter_prometheus::PrometheusHandle;
use seat_store::SeatStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: SeatStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/seats/available", get(routes::seats::available::<S>))
        .route(
            "/bookings",
            post(routes::bookings::book::<S>).get(routes::bookings::lookup::<S>),
        )
        .route("/bookings/cancel", post(routes::bookings::cancel::<S>))
        .route("/prices", get(routes::prices::get::<S>))
        .route("/prices/refresh", post(routes::prices::refresh::<S>))
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

/// Creates application state whose price book is loaded from `store`.
pub async fn create_state<S: SeatStore + 'static>(
    store: S,
) -> Result<Arc<AppState<S>>, domain::BookingError> {
    let reservations = ReservationService::load(store).await?;
    Ok(Arc::new(AppState::new(reservations)))
}
