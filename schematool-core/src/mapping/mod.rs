//! Entity descriptors and their registry.
//!
//! Entity types are described explicitly instead of being discovered by
//! runtime reflection. A descriptor names its fully-qualified type, carries
//! the entity marker, and lists its columns and indexes. Descriptors are
//! registered with an [`EntityRegistry`] in code (through the [`Entity`]
//! trait or builders) or loaded from JSON catalogs.
//!
//! # Module Structure
//! - `registry`: registration, catalog loading and package discovery

mod registry;

pub use registry::{EntityCatalog, EntityRegistry};

use serde::{Deserialize, Serialize};

/// Logical column types, mapped to SQL per dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Double,
    Decimal,
    Varchar,
    Text,
    Binary,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Uuid,
    Json,
}

impl ColumnType {
    /// Whether the type can back an identity column.
    pub fn is_integer(self) -> bool {
        matches!(self, Self::SmallInt | Self::Integer | Self::BigInt)
    }
}

fn default_true() -> bool {
    true
}

/// One mapped column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,
    /// Logical type
    pub column_type: ColumnType,
    /// Length for `varchar`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Precision for `decimal`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    /// Scale for `decimal`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    /// Whether the column accepts NULL; ignored for id columns
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Part of the primary key
    #[serde(default)]
    pub id: bool,
    /// Database-generated identity value
    #[serde(default)]
    pub generated: bool,
    /// Single-column unique constraint
    #[serde(default)]
    pub unique: bool,
    /// SQL default expression, emitted verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Type name of the entity this column references (many-to-one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
}

impl ColumnDescriptor {
    /// Creates a nullable column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            length: None,
            precision: None,
            scale: None,
            nullable: true,
            id: false,
            generated: false,
            unique: false,
            default: None,
            references: None,
        }
    }

    /// Creates a primary key column.
    pub fn id(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            id: true,
            nullable: false,
            ..Self::new(name, column_type)
        }
    }

    /// Marks the column as database-generated.
    #[must_use]
    pub fn generated(mut self) -> Self {
        self.generated = true;
        self
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the `varchar` length.
    #[must_use]
    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Sets `decimal` precision and scale.
    #[must_use]
    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Sets a default expression.
    #[must_use]
    pub fn default_value(mut self, expression: impl Into<String>) -> Self {
        self.default = Some(expression.into());
        self
    }

    /// Makes the column a foreign key to another entity's primary key.
    #[must_use]
    pub fn references(mut self, entity_type: impl Into<String>) -> Self {
        self.references = Some(entity_type.into());
        self
    }
}

/// Index declared on an entity's table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Index name
    pub name: String,
    /// Indexed columns, in order
    pub columns: Vec<String>,
    /// Unique index
    #[serde(default)]
    pub unique: bool,
}

/// Mapping of one entity type to one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Fully-qualified type name, `.` or `::` separated
    pub type_name: String,
    /// Entity marker; unmarked descriptors are never discovered
    #[serde(default = "default_true")]
    pub entity: bool,
    /// Table name; defaults to the snake_case simple type name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Schema; defaults to the configured default schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Columns, in table order
    pub columns: Vec<ColumnDescriptor>,
    /// Secondary indexes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexDescriptor>,
}

impl EntityDescriptor {
    /// Creates an entity-marked descriptor without columns.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            entity: true,
            table: None,
            schema: None,
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Sets the table name.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Sets the schema.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    /// Appends an index.
    #[must_use]
    pub fn index(mut self, name: impl Into<String>, columns: &[&str], unique: bool) -> Self {
        self.indexes.push(IndexDescriptor {
            name: name.into(),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            unique,
        });
        self
    }

    /// Clears the entity marker.
    #[must_use]
    pub fn unmarked(mut self) -> Self {
        self.entity = false;
        self
    }

    /// Type name with `::` separators normalized to `.`.
    pub fn qualified_name(&self) -> String {
        normalize_path(&self.type_name)
    }

    /// Package part of the type name.
    pub fn package(&self) -> String {
        let qualified = self.qualified_name();
        qualified
            .rsplit_once('.')
            .map(|(package, _)| package.to_string())
            .unwrap_or_default()
    }

    /// Type name without its package.
    pub fn simple_name(&self) -> String {
        let qualified = self.qualified_name();
        qualified
            .rsplit_once('.')
            .map_or(qualified.clone(), |(_, simple)| simple.to_string())
    }

    /// Table name, explicit or derived from the simple type name.
    pub fn table_name(&self) -> String {
        self.table
            .clone()
            .unwrap_or_else(|| to_snake_case(&self.simple_name()))
    }

    /// Whether the type lives in the package or one of its sub-packages.
    ///
    /// An empty prefix matches every package.
    pub fn in_package(&self, prefix: &str) -> bool {
        let prefix = normalize_path(prefix.trim());
        let prefix = prefix.trim_matches('.');
        if prefix.is_empty() {
            return true;
        }
        let package = self.package();
        package == prefix
            || package
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('.'))
    }
}

/// Statically described entity type.
///
/// Implemented by application types so they can be registered with
/// [`EntityRegistry::register_entity`].
pub trait Entity {
    /// Describes the table this type maps to.
    fn descriptor() -> EntityDescriptor;
}

fn normalize_path(path: &str) -> String {
    path.replace("::", ".")
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len().saturating_add(4));
    let mut previous_lower = false;
    for c in name.chars() {
        if c.is_uppercase() {
            if previous_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            previous_lower = false;
        } else {
            out.push(c);
            previous_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        let descriptor = EntityDescriptor::new("com.example.model.OrderLine");
        assert_eq!(descriptor.package(), "com.example.model");
        assert_eq!(descriptor.simple_name(), "OrderLine");
        assert_eq!(descriptor.table_name(), "order_line");

        let descriptor = EntityDescriptor::new("app::model::Customer").table("customers");
        assert_eq!(descriptor.package(), "app.model");
        assert_eq!(descriptor.table_name(), "customers");
    }

    #[test]
    fn test_top_level_type() {
        let descriptor = EntityDescriptor::new("Customer");
        assert_eq!(descriptor.package(), "");
        assert_eq!(descriptor.simple_name(), "Customer");
        assert!(descriptor.in_package(""));
        assert!(!descriptor.in_package("com"));
    }

    #[test]
    fn test_in_package() {
        let descriptor = EntityDescriptor::new("com.example.model.billing.Invoice");
        assert!(descriptor.in_package("com.example.model"));
        assert!(descriptor.in_package("com.example.model.billing"));
        assert!(descriptor.in_package("com::example"));
        assert!(descriptor.in_package(""));
        assert!(!descriptor.in_package("com.example.mod"));
        assert!(!descriptor.in_package("com.example.model.billing.Invoice"));
        assert!(!descriptor.in_package("org.example"));
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("Customer"), "customer");
        assert_eq!(to_snake_case("HTTPLog"), "httplog");
        assert_eq!(to_snake_case("Order2Line"), "order2_line");
    }

    #[test]
    fn test_column_builders() {
        let id = ColumnDescriptor::id("id", ColumnType::BigInt).generated();
        assert!(id.id && id.generated && !id.nullable);

        let name = ColumnDescriptor::new("name", ColumnType::Varchar)
            .length(80)
            .not_null()
            .unique();
        assert_eq!(name.length, Some(80));
        assert!(!name.nullable && name.unique);
    }

    #[test]
    fn test_descriptor_json_defaults() {
        let json = r#"{
            "type_name": "com.example.model.Customer",
            "columns": [
                {"name": "id", "column_type": "big_int", "id": true, "generated": true},
                {"name": "email", "column_type": "varchar", "length": 120, "unique": true}
            ]
        }"#;

        let descriptor: EntityDescriptor = serde_json::from_str(json).unwrap();
        assert!(descriptor.entity);
        assert_eq!(descriptor.table_name(), "customer");
        assert_eq!(descriptor.columns[1].column_type, ColumnType::Varchar);
        assert!(descriptor.columns[1].nullable);
        assert!(descriptor.indexes.is_empty());
    }
}
