use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use greenmart_core::keys;
use greenmart_core::{
    CacheStore, CacheStoreError, EntityKind, ListFilter, Patch, Record, RowPredicate, RowSearch,
    RowSelect, RowStore, RowStoreError, SCAN_PAGE_SIZE,
};

/// Default lifetime of a populated entity cache entry, in seconds.
pub const DEFAULT_CACHE_TTL: u64 = 3600;

/// Upper bound on SCAN pages walked per invalidation.
const MAX_SCAN_ROUNDS: u32 = 64;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Row store error: {0}")]
    RowStore(#[from] RowStoreError),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheStoreError),
}

/// Read-through repository over one entity.
///
/// Reads check the cache first and populate it on miss; writes go to the
/// row store and then purge every key under the entity's (and scope's)
/// pattern before returning, so a subsequent read never observes
/// pre-write data. The cache is never the source of truth: population is
/// best-effort and absent/empty results are never cached.
pub struct CachedRepository<R, C>
where
    R: RowStore,
    C: CacheStore,
{
    entity: &'static EntityKind,
    rows: R,
    cache: C,
    cache_ttl: u64,
}

impl<R, C> CachedRepository<R, C>
where
    R: RowStore,
    C: CacheStore,
{
    pub fn new(entity: &'static EntityKind, rows: R, cache: C) -> Self {
        Self {
            entity,
            rows,
            cache,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn with_cache_ttl(mut self, ttl_seconds: u64) -> Self {
        self.cache_ttl = ttl_seconds;
        self
    }

    pub fn entity(&self) -> &'static EntityKind {
        self.entity
    }

    #[tracing::instrument(name = "CachedRepository::list", skip(self, filter), fields(entity = self.entity.name))]
    pub async fn list(
        &self,
        scope: Option<i64>,
        filter: ListFilter,
    ) -> Result<Vec<Record>, RepositoryError> {
        let key = keys::list_key(self.entity, scope, &filter);
        if let Some(cached) = self.read_cached::<Vec<Record>>(&key).await? {
            return Ok(cached);
        }

        let search = filter
            .search_key
            .as_deref()
            .filter(|needle| !needle.is_empty() && !self.entity.search_columns.is_empty())
            .map(|needle| RowSearch {
                columns: self.entity.search_columns.to_vec(),
                needle: needle.to_string(),
            });

        let rows = self
            .rows
            .select(RowSelect {
                table: self.entity.table,
                columns: self.projection(filter.select.as_deref()),
                id: None,
                scope: self.scope_predicate(scope),
                search,
                include_deleted: false,
                order_by: Some(self.entity.order_column),
                limit: Some(filter.limit_or_default()),
                offset: Some(filter.skip_or_default()),
            })
            .await?;

        if !rows.is_empty() {
            self.populate(&key, &rows).await;
        }
        Ok(rows)
    }

    #[tracing::instrument(name = "CachedRepository::get_by_id", skip(self), fields(entity = self.entity.name))]
    pub async fn get_by_id(
        &self,
        scope: Option<i64>,
        id: i64,
    ) -> Result<Option<Record>, RepositoryError> {
        let key = keys::id_key(self.entity, scope, id);
        if let Some(cached) = self.read_cached::<Record>(&key).await? {
            return Ok(Some(cached));
        }

        let row = self.fetch_by_id(scope, id, false).await?;
        if let Some(row) = &row {
            self.populate(&key, row).await;
        }
        Ok(row)
    }

    #[tracing::instrument(name = "CachedRepository::create", skip(self, values), fields(entity = self.entity.name))]
    pub async fn create(
        &self,
        scope: Option<i64>,
        values: Record,
    ) -> Result<Option<Record>, RepositoryError> {
        let mut values = self.retain_known_columns(values);
        if let Some((column, owner)) = self.scope_predicate(scope) {
            values.insert(column.to_string(), Value::from(owner));
        }

        let id = self
            .rows
            .insert(self.entity.table, self.entity.id_column, values)
            .await?;

        // Re-read for canonical column values (generated id, timestamps).
        let row = self.fetch_by_id(scope, id, true).await?;
        self.purge(scope).await?;
        Ok(row)
    }

    #[tracing::instrument(name = "CachedRepository::update", skip(self, patch), fields(entity = self.entity.name))]
    pub async fn update(
        &self,
        scope: Option<i64>,
        id: i64,
        patch: Patch,
    ) -> Result<Option<Record>, RepositoryError> {
        // Existence and mutation are one conditional statement; zero
        // affected rows means the row is absent, soft-deleted or not owned
        // by the caller.
        let affected = self
            .rows
            .update(
                self.entity.table,
                RowPredicate {
                    id: (self.entity.id_column, id),
                    scope: self.scope_predicate(scope),
                    only_live: true,
                },
                patch.into_record(),
            )
            .await?;
        if affected == 0 {
            return Ok(None);
        }

        let row = self.fetch_by_id(scope, id, true).await?;
        self.purge(scope).await?;
        Ok(row)
    }

    #[tracing::instrument(name = "CachedRepository::delete", skip(self), fields(entity = self.entity.name))]
    pub async fn delete(
        &self,
        scope: Option<i64>,
        id: i64,
    ) -> Result<Option<Record>, RepositoryError> {
        let mut tombstone = Record::new();
        tombstone.insert("is_deleted".to_string(), Value::Bool(true));

        let affected = self
            .rows
            .update(
                self.entity.table,
                RowPredicate {
                    id: (self.entity.id_column, id),
                    scope: self.scope_predicate(scope),
                    only_live: true,
                },
                tombstone,
            )
            .await?;
        if affected == 0 {
            return Ok(None);
        }

        self.purge(scope).await?;

        let mut receipt = Record::new();
        receipt.insert(self.entity.id_column.to_string(), Value::from(id));
        Ok(Some(receipt))
    }

    async fn fetch_by_id(
        &self,
        scope: Option<i64>,
        id: i64,
        include_deleted: bool,
    ) -> Result<Option<Record>, RepositoryError> {
        let rows = self
            .rows
            .select(RowSelect {
                table: self.entity.table,
                columns: self.projection(None),
                id: Some((self.entity.id_column, id)),
                scope: self.scope_predicate(scope),
                search: None,
                include_deleted,
                order_by: None,
                limit: Some(1),
                offset: None,
            })
            .await?;
        Ok(rows.into_iter().next())
    }

    fn scope_predicate(&self, scope: Option<i64>) -> Option<(&'static str, i64)> {
        match (self.entity.scope_column, scope) {
            (Some(column), Some(owner)) => Some((column, owner)),
            _ => None,
        }
    }

    /// Client-supplied projections are intersected with the entity's known
    /// columns; anything else falls back to the full column set.
    fn projection(&self, select: Option<&[String]>) -> Vec<String> {
        let full = || self.entity.columns.iter().map(|c| c.to_string()).collect();
        match select {
            Some(requested) => {
                let filtered: Vec<String> = requested
                    .iter()
                    .filter(|column| self.entity.is_known_column(column))
                    .cloned()
                    .collect();
                if filtered.is_empty() { full() } else { filtered }
            }
            None => full(),
        }
    }

    fn retain_known_columns(&self, values: Record) -> Record {
        values
            .into_iter()
            .filter(|(column, _)| {
                self.entity.is_known_column(column)
                    && column != self.entity.id_column
                    && column != "created_at"
                    && column != "updated_at"
            })
            .collect()
    }

    async fn read_cached<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, CacheStoreError> {
        match self.cache.get(key).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => Ok(Some(value)),
                Err(error) => {
                    // Undecodable entries are treated as misses; the next
                    // populate overwrites them.
                    tracing::warn!(%key, %error, "discarding undecodable cache entry");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn populate<T: Serialize>(&self, key: &str, value: &T) {
        let payload = serde_json::to_string(value).ok();
        if let Err(error) = self.cache.set(key, payload, Some(self.cache_ttl)).await {
            tracing::warn!(%key, %error, "cache population failed");
        }
    }

    async fn purge(&self, scope: Option<i64>) -> Result<(), CacheStoreError> {
        let pattern = keys::invalidation_pattern(self.entity, scope);
        purge_pattern(&self.cache, &pattern).await
    }
}

/// Deletes every cached key matching `pattern`, paging the backend cursor
/// until it wraps to zero (or the round bound is hit).
pub async fn purge_pattern<C: CacheStore>(
    cache: &C,
    pattern: &str,
) -> Result<(), CacheStoreError> {
    let mut cursor = 0;
    for _ in 0..MAX_SCAN_ROUNDS {
        let (next, matched) = cache.scan(cursor, pattern, SCAN_PAGE_SIZE).await?;
        if !matched.is_empty() {
            cache.del_many(matched).await?;
        }
        if next == 0 {
            break;
        }
        cursor = next;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use tokio::sync::RwLock;

    use super::*;

    /// Cache mock that serves canned SCAN pages and records deletions.
    #[derive(Clone, Default)]
    struct PagingCache {
        pages: Arc<RwLock<HashMap<u64, (u64, Vec<String>)>>>,
        deleted: Arc<RwLock<Vec<String>>>,
        scan_calls: Arc<AtomicU64>,
    }

    #[async_trait::async_trait]
    impl CacheStore for PagingCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheStoreError> {
            Ok(None)
        }

        async fn set(
            &self,
            _key: &str,
            _value: Option<String>,
            _ttl_seconds: Option<u64>,
        ) -> Result<(), CacheStoreError> {
            Ok(())
        }

        async fn del(&self, _key: &str) -> Result<(), CacheStoreError> {
            Ok(())
        }

        async fn scan(
            &self,
            cursor: u64,
            _pattern: &str,
            _count: u64,
        ) -> Result<(u64, Vec<String>), CacheStoreError> {
            self.scan_calls.fetch_add(1, Ordering::SeqCst);
            let pages = self.pages.read().await;
            Ok(pages.get(&cursor).cloned().unwrap_or((0, Vec::new())))
        }

        async fn del_many(&self, keys: Vec<String>) -> Result<(), CacheStoreError> {
            self.deleted.write().await.extend(keys);
            Ok(())
        }
    }

    #[tokio::test]
    async fn purge_pattern_pages_through_the_cursor() {
        let cache = PagingCache::default();
        {
            let mut pages = cache.pages.write().await;
            pages.insert(0, (17, vec!["a".to_string()]));
            pages.insert(17, (42, Vec::new()));
            pages.insert(42, (0, vec!["b".to_string(), "c".to_string()]));
        }

        purge_pattern(&cache, "category.*").await.unwrap();

        assert_eq!(cache.scan_calls.load(Ordering::SeqCst), 3);
        let deleted = cache.deleted.read().await;
        assert_eq!(*deleted, vec!["a", "b", "c"]);
    }
}
