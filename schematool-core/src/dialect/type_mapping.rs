//! Column type to dialect type name conversion.
//!
//! | Column type | PostgreSQL | MySQL | SQLite | Generic |
//! |---|---|---|---|---|
//! | `boolean` | boolean | bit | boolean | boolean |
//! | `varchar` | varchar(n) | varchar(n) | varchar(n) | varchar(n) |
//! | `text` | text | longtext | text | clob |
//! | `binary` | bytea | longblob | blob | blob |
//! | `timestamp_tz` | timestamp(6) with time zone | datetime(6) | timestamp | timestamp(6) with time zone |
//! | `uuid` | uuid | char(36) | varchar(36) | char(36) |
//! | `json` | jsonb | json | text | clob |
//!
//! Unset lengths default to 255 and unset decimal precision/scale to 19/2.

use super::Dialect;
use crate::mapping::ColumnType;

/// Default `varchar` length.
pub const DEFAULT_LENGTH: u32 = 255;
/// Default `decimal` precision.
pub const DEFAULT_PRECISION: u32 = 19;
/// Default `decimal` scale.
pub const DEFAULT_SCALE: u32 = 2;

/// Renders the SQL type of a column for a dialect.
///
/// # Example
/// ```rust
/// use schematool_core::dialect::{Dialect, column_type_sql};
/// use schematool_core::mapping::ColumnType;
///
/// assert_eq!(column_type_sql(Dialect::PostgreSQL, ColumnType::Varchar, Some(80), None, None), "varchar(80)");
/// assert_eq!(column_type_sql(Dialect::MySQL, ColumnType::Text, None, None, None), "longtext");
/// ```
pub fn column_type_sql(
    dialect: Dialect,
    column_type: ColumnType,
    length: Option<u32>,
    precision: Option<u32>,
    scale: Option<u32>,
) -> String {
    let length = length.unwrap_or(DEFAULT_LENGTH);
    let precision = precision.unwrap_or(DEFAULT_PRECISION);
    let scale = scale.unwrap_or(DEFAULT_SCALE);

    match (dialect, column_type) {
        (Dialect::MySQL, ColumnType::Boolean) => "bit".to_string(),
        (_, ColumnType::Boolean) => "boolean".to_string(),
        (_, ColumnType::SmallInt) => "smallint".to_string(),
        (_, ColumnType::Integer) => "integer".to_string(),
        (_, ColumnType::BigInt) => "bigint".to_string(),
        (Dialect::MySQL, ColumnType::Float) => "float".to_string(),
        (_, ColumnType::Float) => "real".to_string(),
        (Dialect::SQLite, ColumnType::Double) => "double".to_string(),
        (_, ColumnType::Double) => "double precision".to_string(),
        (Dialect::MySQL, ColumnType::Decimal) => format!("decimal({},{})", precision, scale),
        (_, ColumnType::Decimal) => format!("numeric({},{})", precision, scale),
        (_, ColumnType::Varchar) => format!("varchar({})", length),
        (Dialect::MySQL, ColumnType::Text) => "longtext".to_string(),
        (Dialect::Generic, ColumnType::Text | ColumnType::Json) => "clob".to_string(),
        (_, ColumnType::Text) => "text".to_string(),
        (Dialect::PostgreSQL, ColumnType::Binary) => "bytea".to_string(),
        (Dialect::MySQL, ColumnType::Binary) => "longblob".to_string(),
        (Dialect::SQLite | Dialect::Generic, ColumnType::Binary) => "blob".to_string(),
        (_, ColumnType::Date) => "date".to_string(),
        (_, ColumnType::Time) => "time".to_string(),
        (Dialect::MySQL, ColumnType::Timestamp | ColumnType::TimestampTz) => {
            "datetime(6)".to_string()
        }
        (Dialect::SQLite, ColumnType::Timestamp | ColumnType::TimestampTz) => {
            "timestamp".to_string()
        }
        (Dialect::PostgreSQL | Dialect::Generic, ColumnType::Timestamp) => {
            "timestamp(6)".to_string()
        }
        (Dialect::PostgreSQL | Dialect::Generic, ColumnType::TimestampTz) => {
            "timestamp(6) with time zone".to_string()
        }
        (Dialect::PostgreSQL, ColumnType::Uuid) => "uuid".to_string(),
        (Dialect::MySQL | Dialect::Generic, ColumnType::Uuid) => "char(36)".to_string(),
        (Dialect::SQLite, ColumnType::Uuid) => "varchar(36)".to_string(),
        (Dialect::PostgreSQL, ColumnType::Json) => "jsonb".to_string(),
        (Dialect::MySQL, ColumnType::Json) => "json".to_string(),
        (Dialect::SQLite, ColumnType::Json) => "text".to_string(),
    }
}

/// Renders an identity column's type and generation clause.
///
/// SQLite identities are handled by the caller: they only exist as
/// `integer primary key autoincrement`.
pub fn identity_column_sql(dialect: Dialect, column_type: ColumnType) -> String {
    let base = column_type_sql(dialect, column_type, None, None, None);
    match dialect {
        Dialect::PostgreSQL | Dialect::Generic => {
            format!("{} generated by default as identity", base)
        }
        Dialect::MySQL => format!("{} not null auto_increment", base),
        Dialect::SQLite => "integer".to_string(),
    }
}
