//! Schema export and update collaborators.
//!
//! The runner only sees the [`SchemaExporter`] and [`SchemaUpdater`] traits.
//! [`DdlSchemaExporter`] and [`DdlSchemaUpdater`] are the built-in engines:
//! they generate DDL for the resolved dialect and send it to the targets
//! selected in the configuration.
//!
//! # Module Structure
//! - `exporter`: drop/create export
//! - `updater`: additive update against the live schema
//! - `output`: database, script and stdout targets

mod exporter;
mod output;
mod updater;

pub use crate::ddl::ExportAction;
pub use exporter::DdlSchemaExporter;
pub use updater::DdlSchemaUpdater;

use crate::Result;
use crate::metadata::Metadata;
use async_trait::async_trait;

/// Exports the schema described by the metadata.
#[async_trait]
pub trait SchemaExporter: Send + Sync {
    /// Runs one export action.
    ///
    /// # Errors
    /// Returns the engine's failure unchanged; the runner wraps it.
    async fn export(&self, metadata: &Metadata, action: ExportAction) -> Result<()>;
}

/// Brings an existing schema up to the metadata without dropping anything.
#[async_trait]
pub trait SchemaUpdater: Send + Sync {
    /// Runs the update.
    ///
    /// # Errors
    /// Returns the engine's failure unchanged; the runner wraps it.
    async fn update(&self, metadata: &Metadata) -> Result<()>;
}
