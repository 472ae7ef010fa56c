//! Session storage for the dashboard login.
//!
//! Routes depend on the [`SessionStore`] trait and receive the concrete store
//! through router state. [`MemorySessionStore`] is the only implementation:
//! a process-local map whose entries expire after a fixed lifetime.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
    time::{Duration, Instant},
};

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::cookies;

// ---

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "ws_session";

/// Identifiers handed to the client after login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub id: String,
    pub csrf_token: String,
}

/// A logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub email: String,
    pub csrf_token: String,
    pub created_at: DateTime<Utc>,
}

pub trait SessionStore: Send + Sync {
    fn create(&self, email: &str) -> NewSession;

    /// Look up a live session. Expired sessions are reported as absent.
    fn get(&self, id: &str) -> Option<Session>;

    fn delete(&self, id: &str);
}

struct Entry {
    session: Session,
    issued_at: Instant,
}

/// In-memory store with a fixed session lifetime.
pub struct MemorySessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Entry>>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        entry.issued_at.elapsed() >= self.ttl
    }
}

impl SessionStore for MemorySessionStore {
    fn create(&self, email: &str) -> NewSession {
        // ---
        let new = NewSession {
            id: Uuid::new_v4().to_string(),
            csrf_token: Uuid::new_v4().to_string(),
        };
        let entry = Entry {
            session: Session {
                email: email.to_string(),
                csrf_token: new.csrf_token.clone(),
                created_at: Utc::now(),
            },
            issued_at: Instant::now(),
        };

        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, entry| !self.is_expired(entry));
        sessions.insert(new.id.clone(), entry);
        tracing::debug!("Created session for {} ({} live)", email, sessions.len());

        new
    }

    fn get(&self, id: &str) -> Option<Session> {
        // ---
        {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            match sessions.get(id) {
                None => return None,
                Some(entry) if !self.is_expired(entry) => return Some(entry.session.clone()),
                Some(_) => {}
            }
        }

        tracing::debug!("Session expired, removing");
        self.delete(id);
        None
    }

    fn delete(&self, id: &str) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }
}

/// Extract the session id from a bearer token or the session cookie.
///
/// A bearer token wins over a cookie when both are present.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    // ---
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let (scheme, token) = v.split_at_checked(7)?;
            scheme.eq_ignore_ascii_case("bearer ").then(|| token.trim().to_string())
        });
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|cookie| cookies::get_cookie(cookie, SESSION_COOKIE))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn create_then_get_then_delete() {
        // ---
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let new = store.create("alice@example.org");

        let session = store.get(&new.id).unwrap();
        assert_eq!(session.email, "alice@example.org");
        assert_eq!(session.csrf_token, new.csrf_token);
        assert_ne!(new.id, new.csrf_token);

        store.delete(&new.id);
        assert!(store.get(&new.id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_and_empty_ids_are_absent() {
        // ---
        let store = MemorySessionStore::new(Duration::from_secs(60));
        assert!(store.get("").is_none());
        assert!(store.get("not-a-session").is_none());
        store.delete("not-a-session");
    }

    #[test]
    fn expired_sessions_are_dropped() {
        // ---
        let store = MemorySessionStore::new(Duration::ZERO);
        let new = store.create("bob@example.org");
        assert_eq!(store.len(), 1);

        assert!(store.get(&new.id).is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn sessions_are_independent() {
        // ---
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let a = store.create("a@example.org");
        let b = store.create("b@example.org");
        store.delete(&a.id);
        assert_eq!(store.get(&b.id).unwrap().email, "b@example.org");
    }

    #[test]
    fn bearer_token_wins_over_cookie() {
        // ---
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("ws_session=from-cookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer  from-bearer "));
        assert_eq!(session_id_from_headers(&headers).as_deref(), Some("from-bearer"));
    }

    #[test]
    fn falls_back_to_cookie() {
        // ---
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; ws_session=abc%2D123"),
        );
        assert_eq!(session_id_from_headers(&headers).as_deref(), Some("abc-123"));
    }

    #[test]
    fn no_credentials() {
        // ---
        assert!(session_id_from_headers(&HeaderMap::new()).is_none());
    }
}
