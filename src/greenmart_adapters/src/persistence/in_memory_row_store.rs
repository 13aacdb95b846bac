use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use greenmart_core::{Record, RowPredicate, RowSelect, RowStore, RowStoreError};

#[derive(Default)]
struct TableState {
    next_id: i64,
    rows: Vec<Record>,
}

/// In-memory relational accessor for tests.
///
/// Mirrors the Postgres adapter's observable behavior: generated ids,
/// soft-delete filtering, owner scoping, case-insensitive substring search,
/// ordering, pagination and bookkeeping timestamps. `raw_rows` exposes the
/// underlying rows so tests can look beneath the repository (e.g. to check
/// a soft-deleted row is still present), and `select_count` counts how
/// often the store was actually queried, which is how cache hits are
/// asserted.
#[derive(Clone, Default)]
pub struct InMemoryRowStore {
    tables: Arc<RwLock<HashMap<&'static str, TableState>>>,
    select_calls: Arc<AtomicU64>,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn raw_rows(&self, table: &str) -> Vec<Record> {
        self.tables
            .read()
            .await
            .get(table)
            .map(|state| state.rows.clone())
            .unwrap_or_default()
    }

    pub fn select_count(&self) -> u64 {
        self.select_calls.load(Ordering::SeqCst)
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn is_live(row: &Record) -> bool {
    row.get("is_deleted") != Some(&Value::Bool(true))
}

fn column_equals(row: &Record, column: &str, expected: i64) -> bool {
    row.get(column)
        .and_then(Value::as_i64)
        .is_some_and(|actual| actual == expected)
}

#[async_trait::async_trait]
impl RowStore for InMemoryRowStore {
    async fn select(&self, query: RowSelect) -> Result<Vec<Record>, RowStoreError> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);

        let tables = self.tables.read().await;
        let Some(state) = tables.get(query.table) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<&Record> = state
            .rows
            .iter()
            .filter(|row| query.include_deleted || is_live(row))
            .filter(|row| {
                query
                    .scope
                    .is_none_or(|(column, owner)| column_equals(row, column, owner))
            })
            .filter(|row| {
                query
                    .id
                    .is_none_or(|(column, id)| column_equals(row, column, id))
            })
            .filter(|row| match &query.search {
                Some(search) => {
                    let needle = search.needle.to_lowercase();
                    search.columns.iter().any(|column| {
                        row.get(*column)
                            .is_some_and(|value| text_of(value).to_lowercase().contains(&needle))
                    })
                }
                None => true,
            })
            .collect();

        if let Some(order) = query.order_by {
            rows.sort_by_key(|row| row.get(order).map(text_of).unwrap_or_default());
        }

        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);

        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| {
                query
                    .columns
                    .iter()
                    .filter_map(|column| {
                        row.get(column.as_str())
                            .map(|value| (column.clone(), value.clone()))
                    })
                    .collect()
            })
            .collect())
    }

    async fn insert(
        &self,
        table: &'static str,
        id_column: &'static str,
        values: Record,
    ) -> Result<i64, RowStoreError> {
        let mut tables = self.tables.write().await;
        let state = tables.entry(table).or_default();
        state.next_id += 1;
        let id = state.next_id;

        let now = Utc::now().to_rfc3339();
        let mut row = values;
        row.insert(id_column.to_string(), Value::from(id));
        row.insert("is_deleted".to_string(), Value::Bool(false));
        row.insert("created_at".to_string(), Value::String(now.clone()));
        row.insert("updated_at".to_string(), Value::String(now));
        state.rows.push(row);

        Ok(id)
    }

    async fn update(
        &self,
        table: &'static str,
        predicate: RowPredicate,
        values: Record,
    ) -> Result<u64, RowStoreError> {
        let mut tables = self.tables.write().await;
        let Some(state) = tables.get_mut(table) else {
            return Ok(0);
        };

        let now = Utc::now().to_rfc3339();
        let mut affected = 0;
        for row in &mut state.rows {
            let matches = column_equals(row, predicate.id.0, predicate.id.1)
                && (!predicate.only_live || is_live(row))
                && predicate
                    .scope
                    .is_none_or(|(column, owner)| column_equals(row, column, owner));
            if !matches {
                continue;
            }

            for (column, value) in &values {
                row.insert(column.clone(), value.clone());
            }
            row.insert("updated_at".to_string(), Value::String(now.clone()));
            affected += 1;
        }

        Ok(affected)
    }
}
