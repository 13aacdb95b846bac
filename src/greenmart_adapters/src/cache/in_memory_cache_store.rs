use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use greenmart_core::{CacheStore, CacheStoreError};

use crate::config::BASE_KEY_PREFIX;

#[derive(Clone)]
struct Entry {
    value: String,
    expires_at: Option<Duration>,
}

/// In-memory stand-in for the Redis store, close enough for lifecycle
/// tests: namespacing, TTL expiry and glob-pattern scans all behave like
/// the real backend. Time is a logical clock advanced explicitly with
/// [`advance`](Self::advance), so TTL-sensitive paths can be fast-forwarded
/// deterministically.
#[derive(Clone, Default)]
pub struct InMemoryCacheStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    elapsed: Arc<RwLock<Duration>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the logical clock forward. Entries whose TTL has passed stop
    /// being visible from that point on.
    pub async fn advance(&self, delta: Duration) {
        let mut elapsed = self.elapsed.write().await;
        *elapsed += delta;
    }

    /// Number of live (unexpired) entries; handy for invalidation asserts.
    pub async fn live_len(&self) -> usize {
        let now = *self.elapsed.read().await;
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.expires_at.is_none_or(|deadline| deadline > now))
            .count()
    }

    fn namespaced(key: &str) -> String {
        format!("{BASE_KEY_PREFIX}{key}")
    }
}

#[async_trait::async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        let key = Self::namespaced(key);
        let now = *self.elapsed.read().await;
        let entries = self.entries.read().await;
        Ok(entries
            .get(&key)
            .filter(|entry| entry.expires_at.is_none_or(|deadline| deadline > now))
            .map(|entry| entry.value.clone()))
    }

    async fn set(
        &self,
        key: &str,
        value: Option<String>,
        ttl_seconds: Option<u64>,
    ) -> Result<(), CacheStoreError> {
        let Some(value) = value else {
            return Ok(());
        };
        let now = *self.elapsed.read().await;
        let entry = Entry {
            value,
            expires_at: ttl_seconds.map(|ttl| now + Duration::from_secs(ttl)),
        };
        self.entries
            .write()
            .await
            .insert(Self::namespaced(key), entry);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheStoreError> {
        self.entries.write().await.remove(&Self::namespaced(key));
        Ok(())
    }

    async fn scan(
        &self,
        _cursor: u64,
        pattern: &str,
        _count: u64,
    ) -> Result<(u64, Vec<String>), CacheStoreError> {
        let pattern = Self::namespaced(pattern);
        let now = *self.elapsed.read().await;
        let entries = self.entries.read().await;
        let matched = entries
            .iter()
            .filter(|(_, entry)| entry.expires_at.is_none_or(|deadline| deadline > now))
            .filter(|(key, _)| glob_matches(&pattern, key))
            .map(|(key, _)| key.clone())
            .collect();
        // The whole key space fits one page here; the cursor always wraps.
        Ok((0, matched))
    }

    async fn del_many(&self, keys: Vec<String>) -> Result<(), CacheStoreError> {
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(&key);
        }
        Ok(())
    }
}

/// Anchored glob match supporting `*` wildcards, the subset Redis MATCH
/// patterns use here.
fn glob_matches(pattern: &str, key: &str) -> bool {
    fn matches(pattern: &[u8], key: &[u8]) -> bool {
        match pattern.split_first() {
            None => key.is_empty(),
            Some((b'*', rest)) => (0..=key.len()).any(|skip| matches(rest, &key[skip..])),
            Some((expected, rest)) => key
                .split_first()
                .is_some_and(|(actual, key_rest)| actual == expected && matches(rest, key_rest)),
        }
    }
    matches(pattern.as_bytes(), key.as_bytes())
}
