use async_trait::async_trait;
use thiserror::Error;

/// Upper bound for one SCAN page. Invalidation pages the cursor; this keeps
/// a single round trip from trying to enumerate the whole key space.
pub const SCAN_PAGE_SIZE: u64 = 10_000;

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Key-value cache with per-key TTL and pattern scan.
///
/// Implementations namespace every key (and scan pattern) with a fixed
/// process-wide prefix so several logical databases can share one backend.
/// `scan` returns backend-absolute keys; `del_many` consumes them as-is.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError>;

    /// Stores `value` under `key` with an optional TTL. A `None` value is a
    /// no-op: absence is never cached.
    async fn set(
        &self,
        key: &str,
        value: Option<String>,
        ttl_seconds: Option<u64>,
    ) -> Result<(), CacheStoreError>;

    async fn del(&self, key: &str) -> Result<(), CacheStoreError>;

    /// One SCAN page. Returns the next cursor (0 = iteration complete) and
    /// the keys matched on this page; a single page may be empty even when
    /// later pages match, so callers must loop the cursor.
    async fn scan(
        &self,
        cursor: u64,
        pattern: &str,
        count: u64,
    ) -> Result<(u64, Vec<String>), CacheStoreError>;

    /// Deletes keys exactly as returned by `scan`.
    async fn del_many(&self, keys: Vec<String>) -> Result<(), CacheStoreError>;
}
