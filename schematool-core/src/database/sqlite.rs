//! SQLite pool setup and introspection.
//!
//! # SQLite System Tables
//! - `sqlite_master`: tables and indexes
//! - `PRAGMA table_info()`: columns of one table
//!
//! Foreign keys are not introspected; SQLite cannot add them to an
//! existing table anyway.

use super::ExistingSchema;
use crate::Result;
use crate::config::ConnectionSettings;
use crate::dialect::Dialect;
use crate::error::SchemaToolError;
use sqlx::Row;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

const TABLES_QUERY: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

const INDEXES_QUERY: &str =
    "SELECT name, tbl_name FROM sqlite_master WHERE type = 'index' AND name NOT LIKE 'sqlite_%'";

/// Opens the database file; `create_if_missing` decides whether a missing
/// file is created or reported as a connection failure.
pub(super) async fn connect(
    url: &str,
    settings: &ConnectionSettings,
    create_if_missing: bool,
) -> Result<SqlitePool> {
    let options = connect_options(url, settings)?.create_if_missing(create_if_missing);

    SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.connect_timeout)
        .connect_with(options)
        .await
        .map_err(|e| SchemaToolError::connection_failed("Failed to open SQLite database", e))
}

/// Whether the database already exists. In-memory databases never do.
pub(super) async fn database_exists(url: &str, settings: &ConnectionSettings) -> Result<bool> {
    let options = connect_options(url, settings)?;
    let path = options.get_filename();
    tokio::fs::try_exists(path).await.map_err(|e| {
        SchemaToolError::io(format!("Failed to check {}", path.display()), e)
    })
}

fn connect_options(url: &str, settings: &ConnectionSettings) -> Result<SqliteConnectOptions> {
    let normalized = normalize_connection_string(url);
    SqliteConnectOptions::from_str(&normalized).map_err(|e| {
        SchemaToolError::config_invalid(format!(
            "Invalid SQLite connection string {}: {}",
            settings.redacted_url(),
            e
        ))
    })
}

pub(super) async fn introspect(pool: &SqlitePool) -> Result<ExistingSchema> {
    let mut schema = ExistingSchema::default();

    let tables: Vec<String> = sqlx::query_scalar(TABLES_QUERY)
        .fetch_all(pool)
        .await
        .map_err(|e| SchemaToolError::statement_failed(TABLES_QUERY, e))?;

    for table in tables {
        let pragma = format!("PRAGMA table_info({})", Dialect::SQLite.quote(&table));
        let rows = sqlx::query(&pragma)
            .fetch_all(pool)
            .await
            .map_err(|e| SchemaToolError::statement_failed(pragma.as_str(), e))?;

        let entry = schema.entry(None, &table);
        for row in rows {
            let column: String = row
                .try_get("name")
                .map_err(|e| SchemaToolError::statement_failed(pragma.as_str(), e))?;
            entry.add_column(&column);
        }
    }

    let indexes: Vec<(String, String)> = sqlx::query_as(INDEXES_QUERY)
        .fetch_all(pool)
        .await
        .map_err(|e| SchemaToolError::statement_failed(INDEXES_QUERY, e))?;
    for (index, table) in indexes {
        schema.entry(None, &table).add_index(&index);
    }

    Ok(schema)
}

fn normalize_connection_string(url: &str) -> String {
    if url == ":memory:" {
        "sqlite::memory:".to_string()
    } else if url.starts_with("sqlite:") {
        url.to_string()
    } else {
        format!("sqlite://{}", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_connection_string() {
        assert_eq!(normalize_connection_string(":memory:"), "sqlite::memory:");
        assert_eq!(normalize_connection_string("sqlite:app.db"), "sqlite:app.db");
        assert_eq!(
            normalize_connection_string("/var/lib/app.db"),
            "sqlite:///var/lib/app.db"
        );
    }

    #[tokio::test]
    async fn test_introspect_in_memory() {
        let settings = ConnectionSettings::default().with_url("sqlite::memory:");
        let pool = connect("sqlite::memory:", &settings, true).await.unwrap();
        sqlx::raw_sql(
            "create table customer (id integer primary key, email text); \
             create unique index uk_customer_email on customer (email)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let schema = introspect(&pool).await.unwrap();
        let customer = schema.table(None, "CUSTOMER").unwrap();
        assert!(customer.has_column("email"));
        assert!(customer.has_index("uk_customer_email"));
        assert_eq!(customer.columns().count(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("app.db").display());
        let settings = ConnectionSettings::default().with_url(url.as_str());

        assert!(!database_exists(&url, &settings).await.unwrap());
        assert!(connect(&url, &settings, false).await.is_err());
        assert!(!dir.path().join("app.db").exists());

        connect(&url, &settings, true).await.unwrap().close().await;
        assert!(database_exists(&url, &settings).await.unwrap());
    }
}
