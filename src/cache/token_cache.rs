use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::helpers::time::get_instant;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Keyed store with per-entry expiry.
///
/// Cloning the handle shares the underlying map, so one cache can be handed
/// to several providers to get process-wide reuse.
#[derive(Debug, Clone)]
pub struct TokenCache<V> {
    inner: Arc<RwLock<HashMap<String, Entry<V>>>>,
}

impl<V> Default for TokenCache<V> {
    fn default() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())) }
    }
}

impl<V: Clone> TokenCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get value if it exists and is not expired
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = get_instant();
        {
            let map = self.inner.read().await;
            match map.get(key) {
                Some(entry) if entry.is_live(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // lazy eviction; re-check since a writer may have replaced it meanwhile
        let mut map = self.inner.write().await;
        if map.get(key).is_some_and(|entry| !entry.is_live(now)) {
            debug!("evicting expired cache entry '{}'", key);
            map.remove(key);
        }
        None
    }

    /// Store value for `ttl_ms` milliseconds, replacing any previous entry.
    /// A non-positive ttl stores nothing and drops the previous entry.
    pub async fn put(&self, key: &str, value: V, ttl_ms: i64) {
        let mut map = self.inner.write().await;
        if ttl_ms <= 0 {
            debug!("refusing to cache '{}' with non-positive ttl {}ms", key, ttl_ms);
            map.remove(key);
            return;
        }
        let expires_at = get_instant() + Duration::from_millis(ttl_ms as u64);
        map.insert(key.to_owned(), Entry { value, expires_at });
    }

    pub async fn delete(&self, key: &str) {
        self.inner.write().await.remove(key);
    }

    /// Time left before the entry expires, `None` when absent or expired.
    pub async fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        let now = get_instant();
        self.inner
            .read()
            .await
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.expires_at - now)
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = get_instant();
        self.inner.read().await.values().filter(|entry| entry.is_live(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
