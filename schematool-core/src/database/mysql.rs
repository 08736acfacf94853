//! MySQL pool setup and introspection, scoped to the connected database.

use super::ExistingSchema;
use crate::Result;
use crate::config::ConnectionSettings;
use crate::error::SchemaToolError;
use sqlx::MySqlPool;

const DATABASE_QUERY: &str = "SELECT CAST(DATABASE() AS CHAR)";

const COLUMNS_QUERY: &str = "
    SELECT CAST(table_schema AS CHAR), CAST(table_name AS CHAR), CAST(column_name AS CHAR)
    FROM information_schema.columns
    WHERE table_schema = DATABASE()
    ORDER BY table_name, ordinal_position";

const INDEXES_QUERY: &str = "
    SELECT DISTINCT CAST(table_schema AS CHAR), CAST(table_name AS CHAR), CAST(index_name AS CHAR)
    FROM information_schema.statistics
    WHERE table_schema = DATABASE()";

const FOREIGN_KEYS_QUERY: &str = "
    SELECT CAST(table_schema AS CHAR), CAST(table_name AS CHAR), CAST(constraint_name AS CHAR)
    FROM information_schema.table_constraints
    WHERE constraint_type = 'FOREIGN KEY' AND table_schema = DATABASE()";

pub(super) async fn connect(url: &str, settings: &ConnectionSettings) -> Result<MySqlPool> {
    sqlx::mysql::MySqlPoolOptions::new()
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

pub(super) async fn introspect(pool: &MySqlPool) -> Result<ExistingSchema> {
    let database: Option<String> = sqlx::query_scalar(DATABASE_QUERY)
        .fetch_one(pool)
        .await
        .map_err(|e| SchemaToolError::statement_failed(DATABASE_QUERY, e))?;
    let mut schema = ExistingSchema::new(database);

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

async fn names(pool: &MySqlPool, query: &'static str) -> Result<Vec<(String, String, String)>> {
    sqlx::query_as(query)
        .fetch_all(pool)
        .await
        .map_err(|e| SchemaToolError::statement_failed(query, e))
}
