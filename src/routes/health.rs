// src/routes/health.rs
//! API health check endpoint for the weather-station backend.
//!
//! This module defines the `/health` route used by uptime checks and the
//! dashboard to verify that the service is running and able to respond to
//! HTTP requests. It exports a subrouter to the gateway (`mod.rs`), which
//! merges it into the top-level API router.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

/// Handle `GET /health`.
///
/// Returns a static JSON object. Does not touch the session store or the
/// weather provider.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "weather-station-api",
    })
}

/// Create a subrouter containing the `/health` route.
///
/// Generic over the application state so it merges cleanly with the gateway
/// router regardless of the state type.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
