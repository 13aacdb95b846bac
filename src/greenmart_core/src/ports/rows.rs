use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entity::Record;

#[derive(Debug, Error)]
pub enum RowStoreError {
    #[error("Row store error: {0}")]
    Backend(String),
}

/// Substring search over a fixed set of columns, each matched independently
/// (case-insensitive) and OR-combined.
#[derive(Debug, Clone)]
pub struct RowSearch {
    pub columns: Vec<&'static str>,
    pub needle: String,
}

/// A single select over one table. Only the shapes the repository needs:
/// soft-delete filtering, owner scoping, id lookup, substring search,
/// ordering and pagination.
#[derive(Debug, Clone)]
pub struct RowSelect {
    pub table: &'static str,
    pub columns: Vec<String>,
    pub id: Option<(&'static str, i64)>,
    pub scope: Option<(&'static str, i64)>,
    pub search: Option<RowSearch>,
    pub include_deleted: bool,
    pub order_by: Option<&'static str>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Row predicate for conditional writes: identity, optional owner scope and
/// (by default) liveness, so existence and mutation are one atomic
/// statement.
#[derive(Debug, Clone)]
pub struct RowPredicate {
    pub id: (&'static str, i64),
    pub scope: Option<(&'static str, i64)>,
    pub only_live: bool,
}

/// The relational accessor, seen as opaque row-sets.
///
/// The store owns the bookkeeping timestamps: `insert` stamps `created_at`
/// and `update` stamps `updated_at`, so a patch plus its stamp is always a
/// single write.
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn select(&self, query: RowSelect) -> Result<Vec<Record>, RowStoreError>;

    /// Inserts one row and returns the generated identity.
    async fn insert(
        &self,
        table: &'static str,
        id_column: &'static str,
        values: Record,
    ) -> Result<i64, RowStoreError>;

    /// Applies `values` to every row matching the predicate and returns the
    /// affected-row count.
    async fn update(
        &self,
        table: &'static str,
        predicate: RowPredicate,
        values: Record,
    ) -> Result<u64, RowStoreError>;
}
