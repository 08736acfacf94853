//! Additive schema update against the live database.

use super::{SchemaUpdater, output};
use crate::Result;
use crate::config::ExportOptions;
use crate::ddl::DdlGenerator;
use crate::error::SchemaToolError;
use crate::metadata::Metadata;
use async_trait::async_trait;

/// Built-in updater.
///
/// Always connects, since the current schema has to be introspected. The
/// missing statements go to every selected target; the `database` target
/// executes them on the same connection. Without the `database` target a
/// missing SQLite file is left alone and treated as an empty schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct DdlSchemaUpdater;

impl DdlSchemaUpdater {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SchemaUpdater for DdlSchemaUpdater {
    async fn update(&self, metadata: &Metadata) -> Result<()> {
        let options = ExportOptions::from_configuration(metadata.configuration())?;
        let dialect = metadata.connection().resolve_dialect()?;
        if !dialect.has_driver() {
            return Err(SchemaToolError::unsupported_feature(
                "Schema update",
                metadata.connection().engine_name(),
            ));
        }
        let generator = DdlGenerator::new(dialect, &options);
        update_schema(metadata, &generator, &options).await
    }
}

#[cfg(any(feature = "postgresql", feature = "mysql", feature = "sqlite"))]
async fn update_schema(
    metadata: &Metadata,
    generator: &DdlGenerator,
    options: &ExportOptions,
) -> Result<()> {
    use crate::database::{DatabaseConnection, ExistingSchema};

    let settings = metadata.connection();
    if options.includes(crate::config::TargetType::Database) {
        let connection = DatabaseConnection::connect(settings, generator.dialect()).await?;
        let result = match connection.introspect().await {
            Ok(existing) => {
                apply_update(Some(&connection), metadata, generator, options, &existing).await
            }
            Err(e) => Err(e),
        };
        connection.close().await;
        return result;
    }

    match DatabaseConnection::connect_existing(settings, generator.dialect()).await? {
        Some(connection) => {
            let existing = connection.introspect().await;
            connection.close().await;
            apply_update(None, metadata, generator, options, &existing?).await
        }
        None => {
            let existing = ExistingSchema::new(settings.default_schema.clone());
            apply_update(None, metadata, generator, options, &existing).await
        }
    }
}

#[cfg(any(feature = "postgresql", feature = "mysql", feature = "sqlite"))]
async fn apply_update(
    connection: Option<&crate::database::DatabaseConnection>,
    metadata: &Metadata,
    generator: &DdlGenerator,
    options: &ExportOptions,
    existing: &crate::database::ExistingSchema,
) -> Result<()> {
    let statements = generator.update_statements(metadata, existing);
    if statements.is_empty() {
        tracing::info!("Schema is up to date");
        return Ok(());
    }

    tracing::info!(
        "Schema update for {} tables: {} statements on {}",
        metadata.tables().len(),
        statements.len(),
        generator.dialect()
    );
    output::write_targets(options, &statements).await?;
    if let Some(connection) = connection {
        output::execute_all(connection, &statements, options.show_sql).await?;
    }
    Ok(())
}

#[cfg(not(any(feature = "postgresql", feature = "mysql", feature = "sqlite")))]
async fn update_schema(
    _metadata: &Metadata,
    generator: &DdlGenerator,
    _options: &ExportOptions,
) -> Result<()> {
    Err(SchemaToolError::unsupported_feature(
        "Schema update (no driver compiled in)",
        generator.dialect().to_string(),
    ))
}
