//! Route definitions for the IntegraHub HTTP API.
//!
//! All routes are mounted under `/api` and receive `AppState` through
//! Axum's `State` extractor.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(health_routes())
        .merge(payment_routes())
        .merge(backup_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// Checkout URL lookup and the Razorpay return leg.
fn payment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/payments/checkout-url",
            get(handlers::payment::checkout_url),
        )
        .route(
            "/payments/razorpay/callback",
            get(handlers::payment::razorpay_callback),
        )
}

/// Manual backup trigger and the Dropbox OAuth round trip.
fn backup_routes() -> Router<AppState> {
    Router::new()
        .route("/backups/dropbox", post(handlers::backup::take_backup))
        .route(
            "/backups/dropbox/authorize-url",
            get(handlers::backup::authorize_url),
        )
        .route(
            "/backups/dropbox/callback",
            get(handlers::backup::oauth_callback),
        )
}
