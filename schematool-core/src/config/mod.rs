//! Configuration loaded from a Java-properties file.
//!
//! This module contains:
//! - `properties`: the properties text format
//! - `Configuration`: the immutable key/value settings of one invocation
//! - `ConnectionSettings`: typed view of the connection keys
//! - `ExportOptions`: typed view of the output target keys
//!
//! # Security
//! `Configuration` keeps every key verbatim, passwords included, because all
//! keys are passed through to the metadata source. Its `Debug` output masks
//! any key that looks like a credential.

mod connection;
mod export;
pub mod properties;

pub use connection::{ConnectionSettings, translate_jdbc_url};
pub use export::{ExportOptions, TargetType};

use crate::{Result, error::SchemaToolError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Well-known configuration keys.
pub mod keys {
    /// Environment variable naming the properties file
    pub const PROP_FILE: &str = "PROP_FILE";

    /// Package prefix used for entity discovery
    pub const PACKAGE_NAME: &str = "package.name";
    /// Action selector
    pub const HBM2DDL_AUTO: &str = "hibernate.hbm2ddl.auto";

    /// Database URL, with its JPA aliases
    pub const CONNECTION_URL: [&str; 3] = [
        "hibernate.connection.url",
        "javax.persistence.jdbc.url",
        "jakarta.persistence.jdbc.url",
    ];
    /// Database user, with its JPA aliases
    pub const CONNECTION_USERNAME: [&str; 3] = [
        "hibernate.connection.username",
        "javax.persistence.jdbc.user",
        "jakarta.persistence.jdbc.user",
    ];
    /// Database password, with its JPA aliases
    pub const CONNECTION_PASSWORD: [&str; 3] = [
        "hibernate.connection.password",
        "javax.persistence.jdbc.password",
        "jakarta.persistence.jdbc.password",
    ];
    /// Driver class, used only as a dialect hint
    pub const CONNECTION_DRIVER: [&str; 3] = [
        "hibernate.connection.driver_class",
        "javax.persistence.jdbc.driver",
        "jakarta.persistence.jdbc.driver",
    ];
    /// Maximum pooled connections
    pub const POOL_SIZE: &str = "hibernate.connection.pool_size";
    /// Explicit SQL dialect
    pub const DIALECT: &str = "hibernate.dialect";
    /// Schema applied to entities that do not name one
    pub const DEFAULT_SCHEMA: &str = "hibernate.default_schema";
    /// Quote every identifier
    pub const GLOBALLY_QUOTED_IDENTIFIERS: &str = "hibernate.globally_quoted_identifiers";
    /// Log statements at INFO
    pub const SHOW_SQL: &str = "hibernate.show_sql";
    /// Create referenced schemas before tables
    pub const CREATE_NAMESPACES: &str = "hibernate.hbm2ddl.create_namespaces";
    /// Statement delimiter for script output
    pub const DELIMITER: &str = "hibernate.hbm2ddl.delimiter";

    /// Output targets (`database`, `script`, `stdout`)
    pub const TARGET: &str = "schematool.target";
    /// Script file for the `script` target
    pub const SCRIPT_OUTPUT: &str = "schematool.script.output";
    /// Append to the script file instead of truncating it
    pub const SCRIPT_APPEND: &str = "schematool.script.append";
    /// Connect timeout in seconds
    pub const CONNECT_TIMEOUT: &str = "schematool.connection.timeout";
    /// Entity catalog files
    pub const ENTITY_CATALOG: &str = "schematool.entity.catalog";
}

/// Immutable flat settings of one invocation.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    entries: BTreeMap<String, String>,
    source: Option<PathBuf>,
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let masked: BTreeMap<&str, &str> = self
            .entries
            .iter()
            .map(|(k, v)| {
                if is_sensitive_key(k) {
                    (k.as_str(), "****")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("Configuration")
            .field("entries", &masked)
            .field("source", &self.source)
            .finish()
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    lower.contains("password") || lower.contains("secret")
}

impl Configuration {
    /// Loads a properties file.
    ///
    /// # Errors
    /// Returns `ConfigMissing` if the file does not exist and `Io` if it
    /// cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SchemaToolError::ConfigMissing {
                    path: path.to_path_buf(),
                }
            } else {
                SchemaToolError::io(format!("Failed to read {}", path.display()), e)
            }
        })?;

        let text = properties::decode_properties(&bytes);
        let entries = properties::parse_properties(&text);
        tracing::debug!(
            "Loaded {} properties from {}",
            entries.len(),
            path.display()
        );

        Ok(Self {
            entries,
            source: Some(path.to_path_buf()),
        })
    }

    /// Builds a configuration from key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            source: None,
        }
    }

    /// Returns a copy with the given keys replaced.
    ///
    /// Used once, right after loading, for command-line overrides.
    #[must_use]
    pub fn with_overrides<'a, I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (key, value) in overrides {
            self.entries.insert(key.clone(), value.clone());
        }
        self
    }

    /// File this configuration was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Directory relative paths in the configuration are resolved against.
    pub fn base_dir(&self) -> PathBuf {
        self.source
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }

    /// Raw value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// First present value among a key and its aliases.
    pub fn get_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }

    /// Value for a key that must be present.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` naming the key when it is absent.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| {
            SchemaToolError::config_invalid(format!("missing required property '{}'", key))
        })
    }

    /// Boolean value, accepting `true`/`false` in any case.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` for any other value.
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key).map(str::trim) {
            None | Some("") => Ok(default),
            Some(value) if value.eq_ignore_ascii_case("true") => Ok(true),
            Some(value) if value.eq_ignore_ascii_case("false") => Ok(false),
            Some(value) => Err(SchemaToolError::config_invalid(format!(
                "property '{}' must be true or false, got '{}'",
                key, value
            ))),
        }
    }

    /// Parsed value for a key.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` if the value does not parse.
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key).map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => value.parse::<T>().map(Some).map_err(|e| {
                SchemaToolError::config_invalid(format!(
                    "property '{}' has invalid value '{}': {}",
                    key, value, e
                ))
            }),
        }
    }

    /// Comma-separated list value, trimmed and without empty items.
    pub fn get_list(&self, key: &str) -> Vec<&str> {
        self.get(key)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All settings, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of settings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no settings at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads the properties file path from the process environment.
pub fn config_path_from_env() -> Option<PathBuf> {
    std::env::var_os(keys::PROP_FILE)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "package.name=com.example.model").unwrap();
        writeln!(file, "hibernate.hbm2ddl.auto=create").unwrap();

        let config = Configuration::load(file.path()).unwrap();
        assert_eq!(config.get(keys::PACKAGE_NAME), Some("com.example.model"));
        assert_eq!(config.get(keys::HBM2DDL_AUTO), Some("create"));
        assert_eq!(config.source(), Some(file.path()));
        assert_eq!(config.base_dir(), file.path().parent().unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.properties");

        let error = Configuration::load(&path).unwrap_err();
        assert!(matches!(error, SchemaToolError::ConfigMissing { .. }));
    }

    #[test]
    fn test_require_reports_key() {
        let config = Configuration::from_pairs([("a", "1")]);
        assert_eq!(config.require("a").unwrap(), "1");

        let error = config.require(keys::PACKAGE_NAME).unwrap_err();
        assert!(error.to_string().contains("package.name"));
    }

    #[test]
    fn test_aliases_prefer_first_key() {
        let config = Configuration::from_pairs([
            ("javax.persistence.jdbc.url", "jdbc:sqlite:b.db"),
            ("hibernate.connection.url", "jdbc:sqlite:a.db"),
        ]);
        assert_eq!(
            config.get_any(&keys::CONNECTION_URL),
            Some("jdbc:sqlite:a.db")
        );
    }

    #[test]
    fn test_typed_getters() {
        let config = Configuration::from_pairs([
            ("flag", "TRUE"),
            ("bad.flag", "yes"),
            ("size", " 4 "),
            ("list", "a, ,b ,c"),
        ]);

        assert!(config.get_bool("flag", false).unwrap());
        assert!(!config.get_bool("absent", false).unwrap());
        assert!(config.get_bool("bad.flag", false).is_err());
        assert_eq!(config.get_parsed::<u32>("size").unwrap(), Some(4));
        assert_eq!(config.get_parsed::<u32>("absent").unwrap(), None);
        assert!(config.get_parsed::<u32>("flag").is_err());
        assert_eq!(config.get_list("list"), vec!["a", "b", "c"]);
        assert!(config.get_list("absent").is_empty());
    }

    #[test]
    fn test_overrides_replace_values() {
        let overrides: BTreeMap<String, String> =
            [("schematool.target".to_string(), "stdout".to_string())].into();
        let config = Configuration::from_pairs([("schematool.target", "database")])
            .with_overrides(&overrides);
        assert_eq!(config.get(keys::TARGET), Some("stdout"));
    }

    #[test]
    fn test_debug_masks_passwords() {
        let config = Configuration::from_pairs([
            ("hibernate.connection.password", "hunter2"),
            ("hibernate.connection.username", "app"),
        ]);
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("app"));
    }

    #[test]
    fn test_config_path_from_env() {
        temp_env::with_var(keys::PROP_FILE, Some("/etc/app/schema.properties"), || {
            assert_eq!(
                config_path_from_env(),
                Some(PathBuf::from("/etc/app/schema.properties"))
            );
        });
        temp_env::with_var(keys::PROP_FILE, None::<&str>, || {
            assert_eq!(config_path_from_env(), None);
        });
        temp_env::with_var(keys::PROP_FILE, Some(""), || {
            assert_eq!(config_path_from_env(), None);
        });
    }
}
