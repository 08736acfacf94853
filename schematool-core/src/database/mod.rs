//! Live database access for export and update.
//!
//! # Module Structure
//! - `connection`: [`DatabaseConnection`] over the compiled-in sqlx pools
//! - `postgres`, `mysql`, `sqlite`: per-engine pool setup and introspection
//!
//! [`ExistingSchema`] is always available so update planning can be
//! exercised without a database.

#[cfg(any(feature = "postgresql", feature = "mysql", feature = "sqlite"))]
mod connection;
#[cfg(feature = "mysql")]
mod mysql;
#[cfg(feature = "postgresql")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "postgresql", feature = "mysql", feature = "sqlite"))]
pub use connection::DatabaseConnection;

use std::collections::BTreeSet;

/// A table as it currently exists in the database.
///
/// Names are compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingTable {
    /// Schema the table lives in, if the engine has schemas
    pub schema: Option<String>,
    /// Table name as reported by the database
    pub name: String,
    columns: BTreeSet<String>,
    indexes: BTreeSet<String>,
    foreign_keys: BTreeSet<String>,
}

impl ExistingTable {
    pub fn new(schema: Option<String>, name: impl Into<String>) -> Self {
        Self {
            schema,
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_column(&mut self, name: &str) {
        self.columns.insert(name.to_lowercase());
    }

    pub fn add_index(&mut self, name: &str) {
        self.indexes.insert(name.to_lowercase());
    }

    pub fn add_foreign_key(&mut self, name: &str) {
        self.foreign_keys.insert(name.to_lowercase());
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(&name.to_lowercase())
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.contains(&name.to_lowercase())
    }

    pub fn has_foreign_key(&self, name: &str) -> bool {
        self.foreign_keys.contains(&name.to_lowercase())
    }

    /// Column names, lower-cased.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }
}

/// Introspected tables of the connected database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingSchema {
    default_schema: Option<String>,
    tables: Vec<ExistingTable>,
}

impl ExistingSchema {
    /// Creates an empty schema; unqualified names resolve to `default_schema`.
    pub fn new(default_schema: Option<String>) -> Self {
        Self {
            default_schema,
            tables: Vec::new(),
        }
    }

    pub fn add_table(&mut self, table: ExistingTable) {
        self.tables.push(table);
    }

    /// Finds a table; `None` as schema means the default schema.
    pub fn table(&self, schema: Option<&str>, name: &str) -> Option<&ExistingTable> {
        self.tables.iter().find(|table| {
            table.name.eq_ignore_ascii_case(name) && self.schema_matches(schema, table)
        })
    }

    /// Table entry for introspection, created on first use.
    #[cfg_attr(
        not(any(feature = "postgresql", feature = "mysql", feature = "sqlite")),
        allow(dead_code)
    )]
    pub(crate) fn entry(&mut self, schema: Option<&str>, name: &str) -> &mut ExistingTable {
        let position = self.tables.iter().position(|table| {
            table.name == name && table.schema.as_deref() == schema
        });
        let index = match position {
            Some(index) => index,
            None => {
                let index = self.tables.len();
                self.tables
                    .push(ExistingTable::new(schema.map(str::to_string), name));
                index
            }
        };
        &mut self.tables[index]
    }

    pub fn tables(&self) -> &[ExistingTable] {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn schema_matches(&self, wanted: Option<&str>, table: &ExistingTable) -> bool {
        let default = self.default_schema.as_deref();
        let same = |a: &str, b: Option<&str>| b.is_some_and(|b| a.eq_ignore_ascii_case(b));
        match (wanted, table.schema.as_deref()) {
            (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual),
            (Some(wanted), None) => same(wanted, default),
            (None, Some(actual)) => same(actual, default),
            (None, None) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_uses_default_schema() {
        let mut schema = ExistingSchema::new(Some("public".to_string()));
        schema.entry(Some("public"), "customer").add_column("ID");
        schema.entry(Some("audit"), "customer").add_column("id");

        let customer = schema.table(None, "Customer").unwrap();
        assert_eq!(customer.schema.as_deref(), Some("public"));
        assert!(customer.has_column("id"));

        assert!(schema.table(Some("AUDIT"), "customer").is_some());
        assert!(schema.table(Some("sales"), "customer").is_none());
        assert_eq!(schema.tables().len(), 2);
    }

    #[test]
    fn test_entry_creates_once() {
        let mut schema = ExistingSchema::default();
        assert!(schema.is_empty());

        schema.entry(None, "customer").add_column("id");
        schema.entry(None, "purchase_order").add_column("id");
        schema.entry(None, "customer").add_index("uk_customer_email");

        assert_eq!(schema.tables().len(), 2);
        let customer = schema.table(None, "customer").unwrap();
        assert!(customer.has_column("id"));
        assert!(customer.has_index("uk_customer_email"));
        assert!(!schema.table(None, "purchase_order").unwrap().has_index("uk_customer_email"));
    }

    #[test]
    fn test_schemaless_engine() {
        let mut schema = ExistingSchema::default();
        schema.add_table(ExistingTable::new(None, "customer"));

        assert!(schema.table(None, "customer").is_some());
        assert!(schema.table(Some("sales"), "customer").is_none());
    }
}
