//! Connection to the target database.

use super::ExistingSchema;
use crate::Result;
use crate::config::ConnectionSettings;
use crate::dialect::Dialect;
use crate::error::SchemaToolError;

/// Pooled connection to one of the compiled-in engines.
#[derive(Debug, Clone)]
pub enum DatabaseConnection {
    #[cfg(feature = "postgresql")]
    Postgres(sqlx::PgPool),
    #[cfg(feature = "mysql")]
    MySql(sqlx::MySqlPool),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlx::SqlitePool),
}

impl DatabaseConnection {
    /// Opens a pool sized and timed by the connection settings.
    ///
    /// A missing SQLite database file is created.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` without a URL, `UnsupportedFeature` when the
    /// engine's driver is not compiled in, and `Connection` when the
    /// database cannot be reached.
    pub async fn connect(settings: &ConnectionSettings, dialect: Dialect) -> Result<Self> {
        let url = settings.connection_url()?;
        tracing::debug!(
            "Connecting to {} database at {}",
            dialect,
            settings.redacted_url()
        );

        match dialect {
            #[cfg(feature = "postgresql")]
            Dialect::PostgreSQL => super::postgres::connect(&url, settings)
                .await
                .map(Self::Postgres),
            #[cfg(feature = "mysql")]
            Dialect::MySQL => super::mysql::connect(&url, settings)
                .await
                .map(Self::MySql),
            #[cfg(feature = "sqlite")]
            Dialect::SQLite => super::sqlite::connect(&url, settings, true)
                .await
                .map(Self::Sqlite),
            Dialect::Generic => Err(SchemaToolError::unsupported_feature(
                "Database connection",
                settings.engine_name(),
            )),
            #[allow(unreachable_patterns)]
            other => Err(SchemaToolError::unsupported_feature(
                "Database connection (driver not compiled in)",
                other.to_string(),
            )),
        }
    }

    /// Like [`connect`](Self::connect), but never creates a database.
    ///
    /// Returns `None` when the SQLite database file does not exist yet;
    /// server databases are always connected to.
    ///
    /// # Errors
    /// As [`connect`](Self::connect).
    pub async fn connect_existing(
        settings: &ConnectionSettings,
        dialect: Dialect,
    ) -> Result<Option<Self>> {
        #[cfg(feature = "sqlite")]
        if dialect == Dialect::SQLite {
            let url = settings.connection_url()?;
            if !super::sqlite::database_exists(&url, settings).await? {
                tracing::debug!(
                    "SQLite database {} does not exist yet",
                    settings.redacted_url()
                );
                return Ok(None);
            }
            return super::sqlite::connect(&url, settings, false)
                .await
                .map(|pool| Some(Self::Sqlite(pool)));
        }

        Self::connect(settings, dialect).await.map(Some)
    }

    /// Engine behind this connection.
    pub fn dialect(&self) -> Dialect {
        match self {
            #[cfg(feature = "postgresql")]
            Self::Postgres(_) => Dialect::PostgreSQL,
            #[cfg(feature = "mysql")]
            Self::MySql(_) => Dialect::MySQL,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => Dialect::SQLite,
        }
    }

    /// Executes one statement.
    ///
    /// # Errors
    /// Returns `Statement` carrying the rejected statement and driver error.
    pub async fn execute(&self, sql: &str) -> Result<()> {
        let result = match self {
            #[cfg(feature = "postgresql")]
            Self::Postgres(pool) => sqlx::raw_sql(sql).execute(pool).await.map(|_| ()),
            #[cfg(feature = "mysql")]
            Self::MySql(pool) => sqlx::raw_sql(sql).execute(pool).await.map(|_| ()),
            #[cfg(feature = "sqlite")]
            Self::Sqlite(pool) => sqlx::raw_sql(sql).execute(pool).await.map(|_| ()),
        };
        result.map_err(|e| SchemaToolError::statement_failed(sql, e))
    }

    /// Reads tables, columns, indexes and foreign key names.
    pub async fn introspect(&self) -> Result<ExistingSchema> {
        let schema = match self {
            #[cfg(feature = "postgresql")]
            Self::Postgres(pool) => super::postgres::introspect(pool).await?,
            #[cfg(feature = "mysql")]
            Self::MySql(pool) => super::mysql::introspect(pool).await?,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(pool) => super::sqlite::introspect(pool).await?,
        };
        tracing::debug!("Found {} existing tables", schema.tables().len());
        Ok(schema)
    }

    /// Closes the pool gracefully.
    pub async fn close(self) {
        match self {
            #[cfg(feature = "postgresql")]
            Self::Postgres(pool) => pool.close().await,
            #[cfg(feature = "mysql")]
            Self::MySql(pool) => pool.close().await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(pool) => pool.close().await,
        }
    }
}
