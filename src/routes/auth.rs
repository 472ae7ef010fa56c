//! Dashboard login backed by the injected [`SessionStore`](crate::SessionStore).
//!
//! Login is allowlist-only: there is no password step. The session id is
//! returned both in the body (for bearer use) and as the `ws_session` cookie.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::method_not_allowed;
use crate::cookies::{expired_session_cookie, session_cookie, CookieOptions};
use crate::session::session_id_from_headers;
use crate::{AppState, Config};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/auth/login", post(login).fallback(method_not_allowed))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout).fallback(method_not_allowed))
}

fn cookie_options(config: &Config) -> CookieOptions<'_> {
    CookieOptions {
        secure: config.cookie_secure,
        domain: config.cookie_domain.as_deref(),
    }
}

fn invalid_payload(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "invalid_payload", "message": message })),
    )
        .into_response()
}

async fn login(State(state): State<AppState>, body: Bytes) -> Response {
    // ---
    let Ok(payload) = serde_json::from_slice::<Value>(&body) else {
        return invalid_payload("Invalid JSON");
    };

    let email = payload
        .get("email")
        .and_then(Value::as_str)
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    let Some(email) = email else {
        return invalid_payload("email is required");
    };

    let allowlist = &state.config.allowlist;
    if !allowlist.is_empty() && !allowlist.contains(&email) {
        warn!("Login refused for {}", email);
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "forbidden", "message": "User not allowed" })),
        )
            .into_response();
    }

    let session = state.sessions.create(&email);
    info!("Login: {}", email);

    let cookie = session_cookie(&session.id, &cookie_options(&state.config));
    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({
            "status": "ok",
            "user": { "email": email },
            "session_id": session.id,
            "csrf_token": session.csrf_token,
        })),
    )
        .into_response()
}

async fn me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    // ---
    let session = session_id_from_headers(&headers).and_then(|id| state.sessions.get(&id));

    match session {
        Some(session) => Json(json!({
            "status": "ok",
            "user": { "email": session.email },
            "csrf_token": session.csrf_token,
        }))
        .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "status": "unauthenticated" })),
        )
            .into_response(),
    }
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    // ---
    if let Some(id) = session_id_from_headers(&headers) {
        state.sessions.delete(&id);
        info!("Logout");
    }

    let cookie = expired_session_cookie(&cookie_options(&state.config));
    ([(header::SET_COOKIE, cookie)], Json(json!({ "status": "ok" }))).into_response()
}
