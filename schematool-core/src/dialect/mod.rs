//! SQL dialects supported by the DDL generator.
//!
//! # Module Structure
//! - `type_mapping`: column type to dialect type name conversion
//!
//! A dialect is resolved from, in order, the explicit `hibernate.dialect`
//! value, the connection URL scheme, and the driver class name. Engines
//! without a dedicated dialect (H2 among them) get [`Dialect::Generic`],
//! which renders ANSI DDL for script and stdout targets but has no driver.

pub mod type_mapping;

pub use type_mapping::column_type_sql;

use crate::error::SchemaToolError;

/// Database engines DDL can be generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    PostgreSQL,
    MySQL,
    SQLite,
    /// ANSI SQL for engines without a compiled-in driver
    Generic,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::PostgreSQL => write!(f, "PostgreSQL"),
            Dialect::MySQL => write!(f, "MySQL"),
            Dialect::SQLite => write!(f, "SQLite"),
            Dialect::Generic => write!(f, "generic SQL"),
        }
    }
}

impl Dialect {
    /// Resolves a dialect from the configured hints.
    ///
    /// Hints that name no known engine resolve to [`Dialect::Generic`].
    ///
    /// # Errors
    /// Returns `ConfigInvalid` when no hint was given at all.
    pub fn resolve(
        dialect: Option<&str>,
        url: Option<&str>,
        driver_class: Option<&str>,
    ) -> crate::Result<Self> {
        if let Some(found) = dialect.and_then(Self::from_name) {
            return Ok(found);
        }
        if let Some(found) = url.and_then(Self::from_url) {
            return Ok(found);
        }
        if let Some(found) = driver_class.and_then(Self::from_name) {
            return Ok(found);
        }

        match dialect.or(url).or(driver_class) {
            Some(hint) => {
                tracing::debug!(
                    "No dedicated dialect for '{}', using generic SQL",
                    describe_hint(hint)
                );
                Ok(Self::Generic)
            }
            None => Err(SchemaToolError::config_invalid(
                "cannot determine the SQL dialect: set hibernate.dialect or hibernate.connection.url",
            )),
        }
    }

    /// Matches dialect or driver class names such as
    /// `org.hibernate.dialect.PostgreSQLDialect` or `com.mysql.cj.jdbc.Driver`.
    fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.contains("postgres") {
            Some(Self::PostgreSQL)
        } else if lower.contains("mysql") || lower.contains("mariadb") {
            Some(Self::MySQL)
        } else if lower.contains("sqlite") {
            Some(Self::SQLite)
        } else {
            None
        }
    }

    /// Detects the dialect from a native or JDBC URL.
    fn from_url(url: &str) -> Option<Self> {
        let url = url.strip_prefix("jdbc:").unwrap_or(url);
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(Self::PostgreSQL)
        } else if url.starts_with("mysql://") || url.starts_with("mariadb://") {
            Some(Self::MySQL)
        } else if url.starts_with("sqlite:")
            || url == ":memory:"
            || url.ends_with(".db")
            || url.ends_with(".sqlite")
            || url.ends_with(".sqlite3")
        {
            Some(Self::SQLite)
        } else {
            None
        }
    }

    /// Quotes an identifier.
    pub fn quote(self, identifier: &str) -> String {
        match self {
            Self::MySQL => format!("`{}`", identifier.replace('`', "``")),
            Self::PostgreSQL | Self::SQLite | Self::Generic => {
                format!("\"{}\"", identifier.replace('"', "\"\""))
            }
        }
    }

    /// Whether foreign keys can be added to an existing table.
    pub fn supports_alter_foreign_keys(self) -> bool {
        !matches!(self, Self::SQLite)
    }

    /// Whether statements can be executed through a compiled-in driver.
    pub fn has_driver(self) -> bool {
        !matches!(self, Self::Generic)
    }

    /// Whether `create schema` is meaningful.
    pub fn supports_schemas(self) -> bool {
        !matches!(self, Self::SQLite)
    }

    /// Suffix appended to `create table` statements.
    pub fn table_type_suffix(self) -> &'static str {
        match self {
            Self::MySQL => " engine=InnoDB",
            Self::PostgreSQL | Self::SQLite | Self::Generic => "",
        }
    }
}

/// Keeps only the engine part of a hint so URLs never reach error messages.
pub(crate) fn describe_hint(hint: &str) -> String {
    let hint = hint.strip_prefix("jdbc:").unwrap_or(hint);
    match hint.split_once(':') {
        Some((scheme, _)) if !scheme.is_empty() => scheme.to_string(),
        _ => hint.rsplit('.').next().unwrap_or(hint).to_string(),
    }
}
