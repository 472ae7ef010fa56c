//! Route gateway: every endpoint module exports a subrouter and this module
//! merges them, adds the JSON 404 fallback and the CORS layer.

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{AppState, Config};

mod auth;
mod chart_data;
mod health;
mod ingest;
mod weather;

// ---

pub fn router(state: AppState) -> Router {
    // ---
    let cors = cors_layer(&state.config);

    Router::new()
        .merge(health::router())
        .merge(ingest::router())
        .merge(auth::router())
        .merge(chart_data::router())
        .merge(weather::router())
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" })))
}

/// Method fallback for write-only endpoints.
async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
}

/// Echo `FRONTEND_ORIGIN` when configured, otherwise mirror the caller.
fn cors_layer(config: &Config) -> CorsLayer {
    // ---
    let allow_origin = match config.frontend_origin.as_deref() {
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid FRONTEND_ORIGIN {:?}: {}", origin, e);
                AllowOrigin::mirror_request()
            }
        },
        None => AllowOrigin::mirror_request(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
