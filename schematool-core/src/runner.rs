//! Properties-driven schema tool runner.
//!
//! One invocation loads a properties file, discovers the entity descriptors
//! of the configured package, and dispatches on `hibernate.hbm2ddl.auto`:
//!
//! | Selector | Action |
//! |---|---|
//! | `drop` | export [`ExportAction::Drop`] |
//! | `create-only` | export [`ExportAction::Create`] |
//! | `create` | export [`ExportAction::Both`] |
//! | `create-drop` | warn, then export [`ExportAction::Both`] |
//! | `update` | schema update |
//! | anything else | log and do nothing |
//!
//! The selector is trimmed and compared case-insensitively.

use crate::Result;
use crate::config::{Configuration, config_path_from_env, keys};
use crate::error::SchemaToolError;
use crate::mapping::EntityRegistry;
use crate::metadata::MetadataSources;
use crate::tool::{
    DdlSchemaExporter, DdlSchemaUpdater, ExportAction, SchemaExporter, SchemaUpdater,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::Dispatch;
use tracing::instrument::WithSubscriber;

/// Schema action selected by `hibernate.hbm2ddl.auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Drop,
    CreateOnly,
    Create,
    CreateDrop,
    Update,
    None,
}

impl Action {
    /// Maps a selector value to an action; unknown values map to `None`.
    pub fn from_selector(selector: &str) -> Self {
        match selector.trim().to_lowercase().as_str() {
            "drop" => Self::Drop,
            "create-only" => Self::CreateOnly,
            "create" => Self::Create,
            "create-drop" => Self::CreateDrop,
            "update" => Self::Update,
            _ => Self::None,
        }
    }

    /// Export action this action runs, if it is an export.
    pub fn export_action(self) -> Option<ExportAction> {
        match self {
            Self::Drop => Some(ExportAction::Drop),
            Self::CreateOnly => Some(ExportAction::Create),
            Self::Create | Self::CreateDrop => Some(ExportAction::Both),
            Self::Update | Self::None => None,
        }
    }
}

/// What an invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No properties file was given; nothing ran
    NotConfigured,
    /// The selector matched no action
    NoAction,
    /// The exporter ran with this action
    Exported(ExportAction),
    /// The updater ran
    Updated,
}

/// Runs one schema export or update from a properties file.
///
/// # Example
/// ```rust,no_run
/// use schematool_core::mapping::EntityRegistry;
/// use schematool_core::runner::SchemaToolRunner;
///
/// # async fn example() -> schematool_core::Result<()> {
/// let runner = SchemaToolRunner::with_default_engines(EntityRegistry::new());
/// runner.run_from_env().await?;
/// # Ok(())
/// # }
/// ```
pub struct SchemaToolRunner {
    registry: EntityRegistry,
    exporter: Arc<dyn SchemaExporter>,
    updater: Arc<dyn SchemaUpdater>,
    logger: Option<Dispatch>,
    overrides: BTreeMap<String, String>,
}

impl std::fmt::Debug for SchemaToolRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaToolRunner")
            .field("registry", &self.registry.len())
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

impl SchemaToolRunner {
    /// Creates a runner with explicit collaborators.
    pub fn new(
        registry: EntityRegistry,
        exporter: Arc<dyn SchemaExporter>,
        updater: Arc<dyn SchemaUpdater>,
    ) -> Self {
        Self {
            registry,
            exporter,
            updater,
            logger: None,
            overrides: BTreeMap::new(),
        }
    }

    /// Creates a runner using the built-in DDL engines.
    pub fn with_default_engines(registry: EntityRegistry) -> Self {
        Self::new(
            registry,
            Arc::new(DdlSchemaExporter::new()),
            Arc::new(DdlSchemaUpdater::new()),
        )
    }

    /// Sends every event of a run, collaborators included, to `dispatch`.
    ///
    /// Without a logger, events go to the current default subscriber.
    #[must_use]
    pub fn with_logger(mut self, dispatch: Dispatch) -> Self {
        self.logger = Some(dispatch);
        self
    }

    /// Overrides a key of every loaded configuration.
    #[must_use]
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// Runs with the properties file named by `PROP_FILE`.
    pub async fn run_from_env(&self) -> Result<RunOutcome> {
        let path = config_path_from_env();
        self.run(path.as_deref()).await
    }

    /// Runs with the given properties file.
    ///
    /// A missing path is logged and returns [`RunOutcome::NotConfigured`]
    /// without calling any collaborator.
    ///
    /// # Errors
    /// Returns `ConfigMissing` when the file does not exist, `ConfigInvalid`
    /// for missing or malformed keys, `Mapping` for unusable descriptors,
    /// and `DatabaseOperationFailed` wrapping any collaborator failure.
    pub async fn run(&self, config_path: Option<&Path>) -> Result<RunOutcome> {
        let run = self.load_and_run(config_path);
        match &self.logger {
            Some(dispatch) => run.with_subscriber(dispatch.clone()).await,
            None => run.await,
        }
    }

    /// Runs with an already loaded configuration.
    pub async fn run_with_configuration(&self, configuration: Configuration) -> Result<RunOutcome> {
        let run = self.dispatch(configuration);
        match &self.logger {
            Some(dispatch) => run.with_subscriber(dispatch.clone()).await,
            None => run.await,
        }
    }

    async fn load_and_run(&self, config_path: Option<&Path>) -> Result<RunOutcome> {
        let Some(path) = config_path else {
            tracing::error!(
                "No properties file specified; set {} to the path of the schema tool properties",
                keys::PROP_FILE
            );
            return Ok(RunOutcome::NotConfigured);
        };

        tracing::info!("Loading schema tool properties from {}", path.display());
        let configuration = Configuration::load(path)?;
        self.dispatch(configuration).await
    }

    async fn dispatch(&self, configuration: Configuration) -> Result<RunOutcome> {
        let configuration = configuration.with_overrides(&self.overrides);
        let package = configuration.require(keys::PACKAGE_NAME)?.trim().to_string();
        let selector = configuration.require(keys::HBM2DDL_AUTO)?.to_string();

        let registry = self.registry_with_catalogs(&configuration)?;
        let discovered = registry.discover(&package);
        tracing::info!(
            "Discovered {} entities in package '{}'",
            discovered.len(),
            package
        );

        let mut sources = MetadataSources::new(configuration);
        for descriptor in discovered {
            tracing::debug!("Registering entity {}", descriptor.qualified_name());
            sources.add_entity(descriptor);
        }

        let action = Action::from_selector(&selector);
        if action == Action::CreateDrop {
            tracing::warn!(
                "'create-drop' cannot drop the schema on session close outside a managed session; running 'create' instead"
            );
        }

        if let Some(export_action) = action.export_action() {
            let metadata = sources.build_metadata()?;
            tracing::info!("Running schema export ({})", export_action);
            self.exporter
                .export(&metadata, export_action)
                .await
                .map_err(|e| SchemaToolError::operation_failed("export", e))?;
            return Ok(RunOutcome::Exported(export_action));
        }

        if action == Action::Update {
            let metadata = sources.build_metadata()?;
            tracing::info!("Running schema update");
            self.updater
                .update(&metadata)
                .await
                .map_err(|e| SchemaToolError::operation_failed("update", e))?;
            return Ok(RunOutcome::Updated);
        }

        tracing::info!(
            "No schema action for {}='{}'; nothing to do",
            keys::HBM2DDL_AUTO,
            selector
        );
        Ok(RunOutcome::NoAction)
    }

    fn registry_with_catalogs(&self, configuration: &Configuration) -> Result<EntityRegistry> {
        let mut registry = self.registry.clone();
        for catalog in configuration.get_list(keys::ENTITY_CATALOG) {
            registry.load_catalog(&configuration.base_dir().join(catalog))?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_table() {
        let cases = [
            ("drop", Action::Drop),
            ("create-only", Action::CreateOnly),
            ("create", Action::Create),
            ("CREATE-DROP", Action::CreateDrop),
            (" Update ", Action::Update),
            ("validate", Action::None),
            ("", Action::None),
            ("bogus", Action::None),
        ];
        for (selector, expected) in cases {
            assert_eq!(Action::from_selector(selector), expected, "'{}'", selector);
        }
    }

    #[test]
    fn test_export_actions() {
        assert_eq!(Action::Drop.export_action(), Some(ExportAction::Drop));
        assert_eq!(Action::CreateOnly.export_action(), Some(ExportAction::Create));
        assert_eq!(Action::Create.export_action(), Some(ExportAction::Both));
        assert_eq!(Action::CreateDrop.export_action(), Some(ExportAction::Both));
        assert_eq!(Action::Update.export_action(), None);
        assert_eq!(Action::None.export_action(), None);
    }

    #[tokio::test]
    async fn test_missing_path_is_not_an_error() {
        let runner = SchemaToolRunner::with_default_engines(EntityRegistry::new());
        assert_eq!(runner.run(None).await.unwrap(), RunOutcome::NotConfigured);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let runner = SchemaToolRunner::with_default_engines(EntityRegistry::new());
        let error = runner
            .run(Some(&dir.path().join("absent.properties")))
            .await
            .unwrap_err();
        assert!(matches!(error, SchemaToolError::ConfigMissing { .. }));
    }

    #[tokio::test]
    async fn test_missing_required_keys() {
        let runner = SchemaToolRunner::with_default_engines(EntityRegistry::new());

        let error = runner
            .run_with_configuration(Configuration::from_pairs([("hibernate.hbm2ddl.auto", "create")]))
            .await
            .unwrap_err();
        assert!(error.to_string().contains("package.name"));

        let error = runner
            .run_with_configuration(Configuration::from_pairs([("package.name", "com.example")]))
            .await
            .unwrap_err();
        assert!(error.to_string().contains("hibernate.hbm2ddl.auto"));
    }
}
