//! Time-boxed cache of upstream weather responses, keyed by request URL.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use serde_json::Value;
use tokio::sync::RwLock;

// ---

/// Upper bound on live entries; keys vary with client-chosen coordinates.
pub const DEFAULT_CAPACITY: usize = 1024;

struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

pub struct TtlCache {
    capacity: usize,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return a copy of the cached value if it has not expired.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    /// Store `value` for `ttl`, dropping any entries that have already expired.
    /// When still full, the entry closest to expiry makes room.
    pub async fn insert(&self, key: String, value: Value, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);

        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    #[test]
    fn returns_fresh_entries() {
        // ---
        tokio_test::block_on(async {
            let cache = TtlCache::new();
            cache
                .insert("k".to_string(), json!({"t": 1}), Duration::from_secs(60))
                .await;
            assert_eq!(cache.get("k").await, Some(json!({"t": 1})));
            assert_eq!(cache.get("other").await, None);
        });
    }

    #[test]
    fn expired_entries_are_misses_and_get_purged() {
        // ---
        tokio_test::block_on(async {
            let cache = TtlCache::new();
            cache
                .insert("stale".to_string(), json!(1), Duration::ZERO)
                .await;
            assert_eq!(cache.get("stale").await, None);

            cache
                .insert("fresh".to_string(), json!(2), Duration::from_secs(60))
                .await;
            assert_eq!(cache.len().await, 1);
        });
    }

    #[test]
    fn capacity_evicts_entry_closest_to_expiry() {
        // ---
        tokio_test::block_on(async {
            let cache = TtlCache::with_capacity(2);
            cache
                .insert("short".to_string(), json!(1), Duration::from_secs(30))
                .await;
            cache
                .insert("long".to_string(), json!(2), Duration::from_secs(600))
                .await;
            cache
                .insert("new".to_string(), json!(3), Duration::from_secs(300))
                .await;

            assert_eq!(cache.len().await, 2);
            assert_eq!(cache.get("short").await, None);
            assert_eq!(cache.get("long").await, Some(json!(2)));
            assert_eq!(cache.get("new").await, Some(json!(3)));

            // Refreshing an existing key never evicts.
            cache
                .insert("long".to_string(), json!(4), Duration::from_secs(600))
                .await;
            assert_eq!(cache.get("new").await, Some(json!(3)));
        });
    }
}
