//! PostgreSQL pool setup and introspection.
//!
//! Names are read as `text` so they decode as strings regardless of the
//! catalog's `name` type.

use super::ExistingSchema;
use crate::Result;
use crate::config::ConnectionSettings;
use crate::error::SchemaToolError;
use sqlx::PgPool;

const CURRENT_SCHEMA_QUERY: &str = "SELECT current_schema()::text";

const COLUMNS_QUERY: &str = "
    SELECT table_schema::text, table_name::text, column_name::text
    FROM information_schema.columns
    WHERE table_schema NOT IN ('pg_catalog', 'information_schema')
    ORDER BY table_schema, table_name, ordinal_position";

const INDEXES_QUERY: &str = "
    SELECT schemaname::text, tablename::text, indexname::text
    FROM pg_indexes
    WHERE schemaname NOT IN ('pg_catalog', 'information_schema')";

const FOREIGN_KEYS_QUERY: &str = "
    SELECT table_schema::text, table_name::text, constraint_name::text
    FROM information_schema.table_constraints
    WHERE constraint_type = 'FOREIGN KEY'
      AND table_schema NOT IN ('pg_catalog', 'information_schema')";

pub(super) async fn connect(url: &str, settings: &ConnectionSettings) -> Result<PgPool> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.connect_timeout)
        .connect(url)
        .await
        .map_err(|e| {
            SchemaToolError::connection_failed(
                format!("Failed to connect to {}", settings.redacted_url()),
                e,
            )
        })
}

pub(super) async fn introspect(pool: &PgPool) -> Result<ExistingSchema> {
    let current: Option<String> = sqlx::query_scalar(CURRENT_SCHEMA_QUERY)
        .fetch_one(pool)
        .await
        .map_err(|e| SchemaToolError::statement_failed(CURRENT_SCHEMA_QUERY, e))?;
    let mut schema = ExistingSchema::new(current);

    for (table_schema, table, column) in names(pool, COLUMNS_QUERY).await? {
        schema.entry(Some(&table_schema), &table).add_column(&column);
    }
    for (table_schema, table, index) in names(pool, INDEXES_QUERY).await? {
        schema.entry(Some(&table_schema), &table).add_index(&index);
    }
    for (table_schema, table, constraint) in names(pool, FOREIGN_KEYS_QUERY).await? {
        schema
            .entry(Some(&table_schema), &table)
            .add_foreign_key(&constraint);
    }

    Ok(schema)
}

async fn names(pool: &PgPool, query: &'static str) -> Result<Vec<(String, String, String)>> {
    sqlx::query_as(query)
        .fetch_all(pool)
        .await
        .map_err(|e| SchemaToolError::statement_failed(query, e))
}
