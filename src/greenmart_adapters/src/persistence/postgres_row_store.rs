use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder, Row as _};

use greenmart_core::{Record, RowPredicate, RowSelect, RowStore, RowStoreError};

/// Relational accessor over Postgres.
///
/// Statements are assembled per entity with `QueryBuilder`; the selected
/// row is wrapped with `to_jsonb` so results stay opaque row-sets. Column
/// and table names come from static entity descriptors upstream, but every
/// identifier is re-checked here before it is spliced into SQL.
pub struct PostgresRowStore {
    pool: PgPool,
}

impl PostgresRowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend_error(error: impl ToString) -> RowStoreError {
    RowStoreError::Backend(error.to_string())
}

fn checked_identifier(identifier: &str) -> Result<&str, RowStoreError> {
    let valid = !identifier.is_empty()
        && identifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if valid {
        Ok(identifier)
    } else {
        Err(RowStoreError::Backend(format!(
            "invalid identifier: {identifier:?}"
        )))
    }
}

fn push_bound_value(
    builder: &mut QueryBuilder<'_, Postgres>,
    value: &Value,
) -> Result<(), RowStoreError> {
    match value {
        Value::Null => {
            builder.push("NULL");
        }
        Value::Bool(flag) => {
            builder.push_bind(*flag);
        }
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                builder.push_bind(integer);
            } else if let Some(float) = number.as_f64() {
                builder.push_bind(float);
            } else {
                return Err(RowStoreError::Backend(format!(
                    "unsupported numeric value: {number}"
                )));
            }
        }
        Value::String(text) => {
            builder.push_bind(text.clone());
        }
        other => {
            return Err(RowStoreError::Backend(format!(
                "unsupported column value: {other}"
            )));
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl RowStore for PostgresRowStore {
    #[tracing::instrument(name = "PostgresRowStore::select", skip_all, fields(table = query.table))]
    async fn select(&self, query: RowSelect) -> Result<Vec<Record>, RowStoreError> {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT to_jsonb(sub) AS data FROM (SELECT ");

        for (index, column) in query.columns.iter().enumerate() {
            if index > 0 {
                builder.push(", ");
            }
            builder.push(checked_identifier(column)?);
        }

        builder.push(" FROM ");
        builder.push(checked_identifier(query.table)?);
        builder.push(" WHERE 1 = 1");

        if !query.include_deleted {
            builder.push(" AND is_deleted = FALSE");
        }
        if let Some((column, owner)) = query.scope {
            builder.push(" AND ");
            builder.push(checked_identifier(column)?);
            builder.push(" = ");
            builder.push_bind(owner);
        }
        if let Some((column, id)) = query.id {
            builder.push(" AND ");
            builder.push(checked_identifier(column)?);
            builder.push(" = ");
            builder.push_bind(id);
        }
        if let Some(search) = &query.search {
            if !search.columns.is_empty() {
                let needle = format!("%{}%", search.needle);
                builder.push(" AND (");
                for (index, column) in search.columns.iter().enumerate() {
                    if index > 0 {
                        builder.push(" OR ");
                    }
                    builder.push(checked_identifier(column)?);
                    builder.push("::text ILIKE ");
                    builder.push_bind(needle.clone());
                }
                builder.push(")");
            }
        }
        if let Some(order) = query.order_by {
            builder.push(" ORDER BY ");
            builder.push(checked_identifier(order)?);
        }
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            builder.push(" OFFSET ");
            builder.push_bind(offset as i64);
        }
        builder.push(") sub");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(backend_error)?;

        rows.into_iter()
            .map(|row| {
                let value: Value = row.try_get("data").map_err(backend_error)?;
                match value {
                    Value::Object(record) => Ok(record),
                    other => Err(RowStoreError::Backend(format!(
                        "expected a row object, got {other}"
                    ))),
                }
            })
            .collect()
    }

    #[tracing::instrument(name = "PostgresRowStore::insert", skip_all, fields(table))]
    async fn insert(
        &self,
        table: &'static str,
        id_column: &'static str,
        values: Record,
    ) -> Result<i64, RowStoreError> {
        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO ");
        builder.push(checked_identifier(table)?);

        if values.is_empty() {
            builder.push(" DEFAULT VALUES");
        } else {
            builder.push(" (");
            for (index, column) in values.keys().enumerate() {
                if index > 0 {
                    builder.push(", ");
                }
                builder.push(checked_identifier(column)?);
            }
            builder.push(") VALUES (");
            for (index, value) in values.values().enumerate() {
                if index > 0 {
                    builder.push(", ");
                }
                push_bound_value(&mut builder, value)?;
            }
            builder.push(")");
        }

        // created_at/updated_at come from the table defaults.
        builder.push(" RETURNING ");
        builder.push(checked_identifier(id_column)?);

        let row = builder
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(backend_error)?;
        row.try_get::<i64, _>(0).map_err(backend_error)
    }

    #[tracing::instrument(name = "PostgresRowStore::update", skip_all, fields(table))]
    async fn update(
        &self,
        table: &'static str,
        predicate: RowPredicate,
        values: Record,
    ) -> Result<u64, RowStoreError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE ");
        builder.push(checked_identifier(table)?);
        builder.push(" SET updated_at = now()");

        for (column, value) in &values {
            builder.push(", ");
            builder.push(checked_identifier(column)?);
            builder.push(" = ");
            push_bound_value(&mut builder, value)?;
        }

        builder.push(" WHERE ");
        builder.push(checked_identifier(predicate.id.0)?);
        builder.push(" = ");
        builder.push_bind(predicate.id.1);
        if predicate.only_live {
            builder.push(" AND is_deleted = FALSE");
        }
        if let Some((column, owner)) = predicate.scope {
            builder.push(" AND ");
            builder.push(checked_identifier(column)?);
            builder.push(" = ");
            builder.push_bind(owner);
        }

        let outcome = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;
        Ok(outcome.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_check_rejects_sql_metacharacters() {
        assert!(checked_identifier("category_id").is_ok());
        assert!(checked_identifier("users").is_ok());
        assert!(checked_identifier("").is_err());
        assert!(checked_identifier("name; DROP TABLE users").is_err());
        assert!(checked_identifier("name\"").is_err());
    }
}
