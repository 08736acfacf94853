//! Core library for the schematool launcher.
//!
//! Exports or updates a relational schema from explicitly registered entity
//! descriptors, driven by a Java-properties file. The runner dispatches on
//! `hibernate.hbm2ddl.auto` to a schema exporter or updater; the built-in
//! engines generate DDL for PostgreSQL, MySQL and SQLite.
//!
//! # Security Guarantees
//! - Passwords are held in zeroizing buffers
//! - Connection URLs are redacted in logs and error messages
//! - Nothing is dropped by `update`
//!
//! # Architecture
//! - `config`: properties loading and typed settings
//! - `mapping`: entity descriptors and the registry replacing classpath scanning
//! - `metadata`: validated tables and their creation order
//! - `ddl` and `dialect`: statement generation
//! - `database`: sqlx pools and introspection (feature-gated)
//! - `tool`: exporter/updater traits and built-in engines
//! - `runner`: the dispatching entry point

pub mod config;
pub mod database;
pub mod ddl;
pub mod dialect;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod metadata;
pub mod runner;
pub mod tool;

// Re-export commonly used types
pub use config::{Configuration, ConnectionSettings, ExportOptions, TargetType};
pub use dialect::Dialect;
pub use error::{Result, SchemaToolError};
pub use mapping::{ColumnDescriptor, ColumnType, Entity, EntityDescriptor, EntityRegistry};
pub use metadata::{Metadata, MetadataSources};
pub use runner::{Action, RunOutcome, SchemaToolRunner};
pub use tool::{
    DdlSchemaExporter, DdlSchemaUpdater, ExportAction, SchemaExporter, SchemaUpdater,
};
