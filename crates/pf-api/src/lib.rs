//! # pf-api: Entitlement Validation Service
//!
//! Axum application exposing the export entitlement gate to the web client.
//! The gate itself lives in `pf-entitlement`; handlers here only parse the
//! request, consult the gate and shape the response.
//!
//! ## Routes
//!
//! - `POST /api/entitlements/validate`: may this plan export this format?
//! - `GET  /api/entitlements/{plan}`: formats a plan may export
//! - `GET  /openapi.json`: generated OpenAPI document
//! - `/health/*`: liveness and readiness probes
//!
//! ## Middleware
//!
//! `TraceLayer` for request spans, plus a permissive CORS layer since the
//! endpoint is called from the browser.

pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use error::AppError;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::entitlements::router())
        .merge(openapi::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. The gate has no dependencies, so ready means running.
async fn readiness() -> &'static str {
    "ready"
}
