//! SQLite schema export and update integration tests.
//!
//! This test suite covers:
//! - create, create-only and drop against a live database file
//! - Additive update preserving existing rows
//! - Script and stdout targets without a database
//! - Failure wrapping from the built-in engines
//!
//! Note: databases live in temporary directories, so no containers are needed.

#![cfg(feature = "sqlite")]

use schematool_core::{
    ColumnDescriptor, ColumnType, EntityDescriptor, EntityRegistry, ExportAction, RunOutcome,
    SchemaToolError, SchemaToolRunner,
};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};

fn registry() -> EntityRegistry {
    EntityRegistry::new()
        .with(
            EntityDescriptor::new("com.example.model.Customer")
                .column(ColumnDescriptor::id("id", ColumnType::BigInt).generated())
                .column(
                    ColumnDescriptor::new("email", ColumnType::Varchar)
                        .length(120)
                        .not_null()
                        .unique(),
                )
                .column(ColumnDescriptor::new("active", ColumnType::Boolean).default_value("1")),
        )
        .with(
            EntityDescriptor::new("com.example.model.PurchaseOrder")
                .column(ColumnDescriptor::id("id", ColumnType::BigInt).generated())
                .column(
                    ColumnDescriptor::new("customer_id", ColumnType::BigInt)
                        .references("com.example.model.Customer"),
                )
                .column(ColumnDescriptor::new("total", ColumnType::Decimal).precision(12, 2))
                .index("idx_purchase_order_customer", &["customer_id"], false),
        )
}

fn write_properties(dir: &Path, selector: &str, url: &str, extra: &str) -> PathBuf {
    let path = dir.join("schema.properties");
    std::fs::write(
        &path,
        format!(
            "package.name=com.example.model\n\
             hibernate.hbm2ddl.auto={}\n\
             hibernate.connection.url={}\n\
             {}\n",
            selector, url, extra
        ),
    )
    .unwrap();
    path
}

fn sqlite_url(dir: &Path) -> String {
    format!("jdbc:sqlite:{}", dir.join("app.db").display())
}

async fn open(dir: &Path) -> SqlitePool {
    SqlitePool::connect(&format!("sqlite:{}", dir.join("app.db").display()))
        .await
        .unwrap()
}

async fn table_names(pool: &SqlitePool) -> Vec<String> {
    sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

async fn run(dir: &Path, selector: &str, extra: &str) -> schematool_core::Result<RunOutcome> {
    let path = write_properties(dir, selector, &sqlite_url(dir), extra);
    SchemaToolRunner::with_default_engines(registry())
        .run(Some(&path))
        .await
}

/// create builds every mapped table and index
#[tokio::test]
async fn test_sqlite_create_and_drop() {
    let dir = tempfile::tempdir().unwrap();

    let outcome = run(dir.path(), "create", "").await.unwrap();
    assert_eq!(outcome, RunOutcome::Exported(ExportAction::Both));

    let pool = open(dir.path()).await;
    assert_eq!(table_names(&pool).await, vec!["customer", "purchase_order"]);
    let indexes: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'index' AND name = 'idx_purchase_order_customer'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(indexes.len(), 1);
    pool.close().await;

    // create drops first, so it can run again
    run(dir.path(), "create", "").await.unwrap();

    let outcome = run(dir.path(), "drop", "").await.unwrap();
    assert_eq!(outcome, RunOutcome::Exported(ExportAction::Drop));
    let pool = open(dir.path()).await;
    assert!(table_names(&pool).await.is_empty());
    pool.close().await;
}

/// create-only fails when the tables already exist
#[tokio::test]
async fn test_sqlite_create_only_twice_fails() {
    let dir = tempfile::tempdir().unwrap();
    run(dir.path(), "create-only", "").await.unwrap();

    let error = run(dir.path(), "create-only", "").await.unwrap_err();

    assert_eq!(error.to_string(), "Schema export failed");
    let source = std::error::Error::source(&error).unwrap();
    assert!(source.to_string().starts_with("Statement failed: create table customer"));
}

/// update adds what is missing and keeps data
#[tokio::test]
async fn test_sqlite_update_adds_missing_column() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("app.db");
    std::fs::File::create(&db_path).unwrap();
    let pool = open(dir.path()).await;
    sqlx::raw_sql(
        "create table customer (id integer primary key autoincrement, email varchar(120) not null unique); \
         insert into customer (email) values ('ada@example.com')",
    )
    .execute(&pool)
    .await
    .unwrap();
    pool.close().await;

    let outcome = run(dir.path(), "update", "").await.unwrap();
    assert_eq!(outcome, RunOutcome::Updated);

    let pool = open(dir.path()).await;
    assert_eq!(table_names(&pool).await, vec!["customer", "purchase_order"]);
    let rows: Vec<(String, i64)> = sqlx::query_as("SELECT email, CAST(active AS INTEGER) FROM customer")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(rows, vec![("ada@example.com".to_string(), 1)]);
    pool.close().await;

    // nothing left to do
    let script = dir.path().join("update.sql");
    run(
        dir.path(),
        "update",
        &format!("schematool.target=database,script\nschematool.script.output={}", script.display()),
    )
    .await
    .unwrap();
    assert!(!script.exists());
}

/// Script and stdout targets need no database for export
#[tokio::test]
async fn test_script_target_without_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_properties(
        dir.path(),
        "create",
        "jdbc:postgresql://localhost:1/unreachable",
        "hibernate.default_schema=sales\n\
         hibernate.hbm2ddl.create_namespaces=true\n\
         schematool.target=script,stdout\n\
         schematool.script.output=schema.sql",
    );

    let outcome = SchemaToolRunner::with_default_engines(registry())
        .run(Some(&path))
        .await
        .unwrap();
    assert_eq!(outcome, RunOutcome::Exported(ExportAction::Both));

    let script = std::fs::read_to_string(dir.path().join("schema.sql")).unwrap();
    let lines: Vec<&str> = script.lines().collect();
    assert_eq!(lines[0], "drop table if exists sales.purchase_order cascade;");
    assert_eq!(lines[2], "create schema if not exists sales;");
    assert!(lines[3].starts_with("create table sales.customer (id bigint generated by default as identity"));
    assert!(lines.last().unwrap().starts_with("alter table sales.purchase_order add constraint"));
}

/// Forcing stdout leaves the database untouched
#[tokio::test]
async fn test_sqlite_dry_run_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_properties(dir.path(), "create", &sqlite_url(dir.path()), "");

    SchemaToolRunner::with_default_engines(registry())
        .with_setting("schematool.target", "stdout")
        .run(Some(&path))
        .await
        .unwrap();

    assert!(!dir.path().join("app.db").exists());
}

/// An update printed to stdout plans against an empty schema and leaves no file behind
#[tokio::test]
async fn test_sqlite_update_to_stdout_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("update.sql");
    let outcome = run(
        dir.path(),
        "update",
        &format!("schematool.target=stdout,script\nschematool.script.output={}", script.display()),
    )
    .await
    .unwrap();

    assert_eq!(outcome, RunOutcome::Updated);
    assert!(!dir.path().join("app.db").exists());
    let script = std::fs::read_to_string(&script).unwrap();
    assert!(script.starts_with("create table customer (id integer primary key autoincrement"));
    assert!(script.contains("create table purchase_order"));
}

/// An update printed to stdout reads an existing database without changing it
#[tokio::test]
async fn test_sqlite_update_to_script_leaves_database_alone() {
    let dir = tempfile::tempdir().unwrap();
    run(dir.path(), "create-only", "").await.unwrap();
    let pool = open(dir.path()).await;
    sqlx::raw_sql("drop table purchase_order")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let script = dir.path().join("update.sql");
    run(
        dir.path(),
        "update",
        &format!("schematool.target=script\nschematool.script.output={}", script.display()),
    )
    .await
    .unwrap();

    let script = std::fs::read_to_string(&script).unwrap();
    assert!(script.starts_with("create table purchase_order"));
    assert!(!script.contains("create table customer"));
    let pool = open(dir.path()).await;
    assert_eq!(table_names(&pool).await, vec!["customer"]);
    pool.close().await;
}

/// H2 has no driver, but its DDL can still be printed
#[tokio::test]
async fn test_h2_create_drop_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("h2.sql");
    let path = dir.path().join("schema.properties");
    std::fs::write(
        &path,
        format!(
            "package.name=com.example.model\n\
             hibernate.hbm2ddl.auto=CREATE-DROP\n\
             hibernate.connection.url=jdbc:h2:mem:test\n\
             schematool.target=stdout,script\n\
             schematool.script.output={}\n",
            script.display()
        ),
    )
    .unwrap();

    let outcome = SchemaToolRunner::with_default_engines(registry())
        .run(Some(&path))
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Exported(ExportAction::Both));
    let script = std::fs::read_to_string(&script).unwrap();
    let lines: Vec<&str> = script.lines().collect();
    assert_eq!(lines[0], "drop table if exists purchase_order cascade;");
    assert_eq!(lines[1], "drop table if exists customer cascade;");
    assert!(lines[2].starts_with("create table customer (id bigint generated by default as identity"));
    assert!(lines.last().unwrap().starts_with("alter table purchase_order add constraint"));
}

/// H2 cannot be reached through the database target; the failure is wrapped
#[tokio::test]
async fn test_h2_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_properties(dir.path(), "create-drop", "jdbc:h2:mem:test", "");

    let error = SchemaToolRunner::with_default_engines(registry())
        .run(Some(&path))
        .await
        .unwrap_err();

    let SchemaToolError::DatabaseOperationFailed { operation, source } = &error else {
        panic!("unexpected error {:?}", error);
    };
    assert_eq!(operation, "export");
    assert!(source.to_string().contains("not supported for h2"));
}

/// Update needs introspection, which H2 cannot offer even for stdout
#[tokio::test]
async fn test_h2_update_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_properties(
        dir.path(),
        "update",
        "jdbc:h2:mem:test",
        "schematool.target=stdout",
    );

    let error = SchemaToolRunner::with_default_engines(registry())
        .run(Some(&path))
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "Schema update failed");
    let source = std::error::Error::source(&error).unwrap();
    assert!(source.to_string().contains("Schema update not supported for h2"));
}

/// Unreachable database fails the update with a connection error
#[tokio::test]
async fn test_sqlite_update_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!(
        "jdbc:sqlite:{}",
        dir.path().join("missing").join("app.db").display()
    );
    let path = write_properties(dir.path(), "update", &url, "");

    let error = SchemaToolRunner::with_default_engines(registry())
        .run(Some(&path))
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "Schema update failed");
    let source = std::error::Error::source(&error).unwrap();
    assert!(source.to_string().starts_with("Database connection failed"));
}
