//! Output target settings for generated DDL.

use super::{Configuration, keys};
use crate::error::SchemaToolError;
use std::path::PathBuf;

/// Where generated statements go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TargetType {
    /// Execute against the configured database
    Database,
    /// Append to a script file
    Script,
    /// Print to standard output
    Stdout,
}

impl std::str::FromStr for TargetType {
    type Err = SchemaToolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "database" => Ok(Self::Database),
            "script" => Ok(Self::Script),
            "stdout" => Ok(Self::Stdout),
            other => Err(SchemaToolError::config_invalid(format!(
                "unknown target '{}' in '{}' (expected database, script or stdout)",
                other,
                keys::TARGET
            ))),
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Database => write!(f, "database"),
            Self::Script => write!(f, "script"),
            Self::Stdout => write!(f, "stdout"),
        }
    }
}

/// How export and update emit their statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Selected targets, deduplicated and sorted
    pub targets: Vec<TargetType>,
    /// Script file for [`TargetType::Script`]
    pub script_output: Option<PathBuf>,
    /// Append instead of truncating the script file
    pub append: bool,
    /// Delimiter written after each statement in script and stdout output
    pub delimiter: String,
    /// Log each statement at INFO instead of DEBUG
    pub show_sql: bool,
    /// Quote every identifier
    pub quote_identifiers: bool,
    /// Create referenced schemas before their tables
    pub create_namespaces: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            targets: vec![TargetType::Database],
            script_output: None,
            append: false,
            delimiter: ";".to_string(),
            show_sql: false,
            quote_identifiers: false,
            create_namespaces: false,
        }
    }
}

impl ExportOptions {
    /// Reads the target keys from a configuration.
    ///
    /// Relative script paths are resolved against the properties file's
    /// directory.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` for unknown targets, malformed booleans, or a
    /// script target without an output path.
    pub fn from_configuration(config: &Configuration) -> crate::Result<Self> {
        let mut targets = config
            .get_list(keys::TARGET)
            .into_iter()
            .map(str::parse::<TargetType>)
            .collect::<crate::Result<Vec<_>>>()?;
        if targets.is_empty() {
            targets.push(TargetType::Database);
        }
        targets.sort();
        targets.dedup();

        let script_output = config
            .get(keys::SCRIPT_OUTPUT)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| config.base_dir().join(p));

        let options = Self {
            targets,
            script_output,
            append: config.get_bool(keys::SCRIPT_APPEND, false)?,
            delimiter: config
                .get(keys::DELIMITER)
                .map_or_else(|| ";".to_string(), |d| d.trim().to_string()),
            show_sql: config.get_bool(keys::SHOW_SQL, false)?,
            quote_identifiers: config.get_bool(keys::GLOBALLY_QUOTED_IDENTIFIERS, false)?,
            create_namespaces: config.get_bool(keys::CREATE_NAMESPACES, false)?,
        };

        options.validate()?;
        Ok(options)
    }

    /// Validates target combinations.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` if the script target has no output file.
    pub fn validate(&self) -> crate::Result<()> {
        if self.includes(TargetType::Script) && self.script_output.is_none() {
            return Err(SchemaToolError::config_invalid(format!(
                "target 'script' requires property '{}'",
                keys::SCRIPT_OUTPUT
            )));
        }
        Ok(())
    }

    /// Whether a target is selected.
    pub fn includes(&self, target: TargetType) -> bool {
        self.targets.contains(&target)
    }
}
