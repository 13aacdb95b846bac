use std::sync::Arc;

use redis::{Commands, Connection};
use tokio::sync::RwLock;

use greenmart_core::{CacheStore, CacheStoreError};

use crate::config::BASE_KEY_PREFIX;

/// Redis-backed cache store.
///
/// Every key and scan pattern is namespaced with the process-wide prefix so
/// several logical databases can share one Redis instance without
/// collision. Keys returned by `scan` are backend-absolute (prefixed) and
/// are deleted as-is by `del_many`.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: Arc<RwLock<Connection>>,
    prefix: &'static str,
}

impl RedisCacheStore {
    pub fn new(conn: Arc<RwLock<Connection>>) -> Self {
        Self {
            conn,
            prefix: BASE_KEY_PREFIX,
        }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        let key = self.namespaced(key);
        let mut conn = self.conn.write().await;
        conn.get(&key)
            .map_err(|e| CacheStoreError::Backend(e.to_string()))
    }

    async fn set(
        &self,
        key: &str,
        value: Option<String>,
        ttl_seconds: Option<u64>,
    ) -> Result<(), CacheStoreError> {
        // Absence is never cached.
        let Some(value) = value else {
            return Ok(());
        };
        let key = self.namespaced(key);
        let mut conn = self.conn.write().await;
        let outcome: redis::RedisResult<()> = match ttl_seconds {
            Some(ttl) => conn.set_ex(&key, value, ttl),
            None => conn.set(&key, value),
        };
        outcome.map_err(|e| CacheStoreError::Backend(e.to_string()))
    }

    async fn del(&self, key: &str) -> Result<(), CacheStoreError> {
        let key = self.namespaced(key);
        let mut conn = self.conn.write().await;
        conn.del(&key)
            .map_err(|e| CacheStoreError::Backend(e.to_string()))
    }

    async fn scan(
        &self,
        cursor: u64,
        pattern: &str,
        count: u64,
    ) -> Result<(u64, Vec<String>), CacheStoreError> {
        let pattern = self.namespaced(pattern);
        let mut conn = self.conn.write().await;
        redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(&pattern)
            .arg("COUNT")
            .arg(count)
            .query(&mut *conn)
            .map_err(|e| CacheStoreError::Backend(e.to_string()))
    }

    async fn del_many(&self, keys: Vec<String>) -> Result<(), CacheStoreError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.write().await;
        conn.del(&keys)
            .map_err(|e| CacheStoreError::Backend(e.to_string()))
    }
}
