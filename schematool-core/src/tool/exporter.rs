//! Drop/create schema export.

use super::{ExportAction, SchemaExporter, output};
use crate::Result;
use crate::config::{ConnectionSettings, ExportOptions, TargetType};
use crate::ddl::DdlGenerator;
use crate::dialect::Dialect;
use crate::error::SchemaToolError;
use crate::metadata::Metadata;
use async_trait::async_trait;

/// Built-in exporter generating DDL for the configured dialect.
///
/// Only the `database` target opens a connection, so script and stdout
/// exports work without a reachable database, and for engines that only
/// have generic DDL. Drop statements that fail are logged and skipped;
/// the first failing create statement ends the export.
#[derive(Debug, Clone, Copy, Default)]
pub struct DdlSchemaExporter;

impl DdlSchemaExporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SchemaExporter for DdlSchemaExporter {
    async fn export(&self, metadata: &Metadata, action: ExportAction) -> Result<()> {
        let options = ExportOptions::from_configuration(metadata.configuration())?;
        let dialect = metadata.connection().resolve_dialect()?;
        let to_database = options.includes(TargetType::Database);
        if to_database && !dialect.has_driver() {
            return Err(SchemaToolError::unsupported_feature(
                "Schema export to the database",
                metadata.connection().engine_name(),
            ));
        }

        let generator = DdlGenerator::new(dialect, &options);
        let drops = if action.drops() {
            generator.drop_statements(metadata)
        } else {
            Vec::new()
        };
        let creates = if action.creates() {
            generator.create_statements(metadata)
        } else {
            Vec::new()
        };
        let statements: Vec<String> = drops.iter().chain(&creates).cloned().collect();

        tracing::info!(
            "Schema export ({}) for {} tables: {} statements on {}",
            action,
            metadata.tables().len(),
            statements.len(),
            dialect
        );

        output::write_targets(&options, &statements).await?;
        if to_database {
            execute(metadata.connection(), dialect, &drops, &creates, options.show_sql).await?;
        }

        tracing::info!("Schema export ({}) complete", action);
        Ok(())
    }
}

#[cfg(any(feature = "postgresql", feature = "mysql", feature = "sqlite"))]
async fn execute(
    settings: &ConnectionSettings,
    dialect: Dialect,
    drops: &[String],
    creates: &[String],
    show_sql: bool,
) -> Result<()> {
    let connection = crate::database::DatabaseConnection::connect(settings, dialect).await?;
    let failed = output::execute_ignoring_failures(&connection, drops, show_sql).await;
    if failed > 0 {
        tracing::debug!("{} drop statements were unsuccessful", failed);
    }
    let result = output::execute_all(&connection, creates, show_sql).await;
    connection.close().await;
    result
}

#[cfg(not(any(feature = "postgresql", feature = "mysql", feature = "sqlite")))]
async fn execute(
    _settings: &ConnectionSettings,
    dialect: Dialect,
    _drops: &[String],
    _creates: &[String],
    _show_sql: bool,
) -> Result<()> {
    Err(SchemaToolError::unsupported_feature(
        "Database target (no driver compiled in)",
        dialect.to_string(),
    ))
}
