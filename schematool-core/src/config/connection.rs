//! Database connection settings.
//!
//! Typed view over the pass-through connection keys. JDBC-style URLs are
//! translated to the native URLs sqlx understands, and separate
//! username/password keys are merged into the URL at connect time.

use super::{Configuration, keys};
use crate::dialect::Dialect;
use crate::error::{SchemaToolError, redact_database_url};
use std::time::Duration;
use zeroize::Zeroizing;

/// Settings for the one connection an invocation opens.
///
/// # Security
/// The password is held in a zeroizing buffer and never appears in
/// `Debug` or `Display` output.
#[derive(Clone)]
pub struct ConnectionSettings {
    /// Native database URL (may still carry credentials)
    pub url: Option<String>,
    /// Username from a separate key
    pub username: Option<String>,
    /// Password from a separate key
    password: Option<Zeroizing<String>>,
    /// Driver class name, used only as a dialect hint
    pub driver_class: Option<String>,
    /// Explicit dialect name
    pub dialect: Option<String>,
    /// Schema for entities that do not name one
    pub default_schema: Option<String>,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            driver_class: None,
            dialect: None,
            default_schema: None,
            max_connections: 1,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("url", &self.url.as_deref().map(redact_database_url))
            .field("driver_class", &self.driver_class)
            .field("dialect", &self.dialect)
            .field("default_schema", &self.default_schema)
            .field("max_connections", &self.max_connections)
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.url {
            Some(url) => write!(f, "ConnectionSettings({})", redact_database_url(url)),
            None => write!(f, "ConnectionSettings(<no url>)"),
        }
        // Intentionally omit username and never include credentials
    }
}

impl ConnectionSettings {
    /// Reads the connection keys from a configuration.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` if pool size or timeout are malformed.
    pub fn from_configuration(config: &Configuration) -> crate::Result<Self> {
        let non_empty = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let mut settings = Self {
            url: non_empty(config.get_any(&keys::CONNECTION_URL)).map(|u| translate_jdbc_url(&u)),
            username: non_empty(config.get_any(&keys::CONNECTION_USERNAME)),
            password: config
                .get_any(&keys::CONNECTION_PASSWORD)
                .filter(|p| !p.is_empty())
                .map(|p| Zeroizing::new(p.to_string())),
            driver_class: non_empty(config.get_any(&keys::CONNECTION_DRIVER)),
            dialect: non_empty(config.get(keys::DIALECT)),
            default_schema: non_empty(config.get(keys::DEFAULT_SCHEMA)),
            ..Self::default()
        };

        if let Some(pool_size) = config.get_parsed::<u32>(keys::POOL_SIZE)? {
            settings.max_connections = pool_size;
        }
        if let Some(timeout) = config.get_parsed::<u64>(keys::CONNECT_TIMEOUT)? {
            settings.connect_timeout = Duration::from_secs(timeout);
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Builder method to set the URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(translate_jdbc_url(&url.into()));
        self
    }

    /// Builder method to set credentials kept outside the URL.
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: &str) -> Self {
        self.username = Some(username.into());
        self.password = Some(Zeroizing::new(password.to_string()));
        self
    }

    /// Validates connection settings.
    ///
    /// # Errors
    /// Returns error if values are out of range
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_connections == 0 {
            return Err(SchemaToolError::config_invalid(
                "connection pool size must be greater than 0",
            ));
        }

        if self.max_connections > 100 {
            return Err(SchemaToolError::config_invalid(
                "connection pool size should not exceed 100",
            ));
        }

        if self.connect_timeout.as_secs() == 0 {
            return Err(SchemaToolError::config_invalid(
                "connect timeout must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Resolves the SQL dialect from the explicit dialect, URL and driver class.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` when neither a dialect, a URL nor a driver
    /// class is configured.
    pub fn resolve_dialect(&self) -> crate::Result<Dialect> {
        Dialect::resolve(
            self.dialect.as_deref(),
            self.url.as_deref(),
            self.driver_class.as_deref(),
        )
    }

    /// Short engine name for messages, never the full URL.
    pub fn engine_name(&self) -> String {
        self.dialect
            .as_deref()
            .or(self.url.as_deref())
            .or(self.driver_class.as_deref())
            .map_or_else(|| "unknown".to_string(), crate::dialect::describe_hint)
    }

    /// URL with separately configured credentials merged in.
    ///
    /// Credentials already present in the URL win. The returned string
    /// may contain a password and must not be logged.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` when no URL is configured.
    pub fn connection_url(&self) -> crate::Result<Zeroizing<String>> {
        let url = self.url.as_deref().ok_or_else(|| {
            SchemaToolError::config_invalid(format!(
                "missing required property '{}'",
                keys::CONNECTION_URL[0]
            ))
        })?;

        let Ok(mut parsed) = url::Url::parse(url) else {
            return Ok(Zeroizing::new(url.to_string()));
        };

        // Only network URLs carry credentials; sqlite paths are left alone
        if parsed.cannot_be_a_base() || parsed.host_str().is_none() {
            return Ok(Zeroizing::new(url.to_string()));
        }

        if parsed.username().is_empty()
            && let Some(username) = &self.username
        {
            let _ = parsed.set_username(username);
        }
        if parsed.password().is_none()
            && let Some(password) = &self.password
        {
            let _ = parsed.set_password(Some(password.as_str()));
        }

        Ok(Zeroizing::new(parsed.to_string()))
    }

    /// URL safe for logs.
    pub fn redacted_url(&self) -> String {
        self.url
            .as_deref()
            .map_or_else(|| "<no url>".to_string(), redact_database_url)
    }
}

/// Translates a JDBC URL into the native form used by sqlx.
///
/// Non-JDBC URLs are returned unchanged.
///
/// # Example
/// ```rust
/// use schematool_core::config::translate_jdbc_url;
///
/// assert_eq!(
///     translate_jdbc_url("jdbc:postgresql://db:5432/app"),
///     "postgres://db:5432/app"
/// );
/// assert_eq!(translate_jdbc_url("jdbc:sqlite:/var/app.db"), "sqlite:/var/app.db");
/// ```
pub fn translate_jdbc_url(url: &str) -> String {
    let Some(rest) = url.strip_prefix("jdbc:") else {
        return url.to_string();
    };

    if let Some(tail) = rest.strip_prefix("postgresql:") {
        format!("postgres:{}", tail)
    } else if let Some(tail) = rest.strip_prefix("mariadb:") {
        format!("mysql:{}", tail)
    } else {
        rest.to_string()
    }
}
