//! Metadata sources and resolved table metadata.
//!
//! [`MetadataSources`] collects the pass-through settings and the registered
//! entity descriptors. [`MetadataSources::build_metadata`] validates the
//! descriptors and resolves them into dialect-independent [`Table`]s, with
//! foreign keys pointing at the referenced entity's primary key and a
//! creation order in which referenced tables come first.

use crate::config::{Configuration, ConnectionSettings};
use crate::error::SchemaToolError;
use crate::mapping::{ColumnType, EntityDescriptor};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Longest generated constraint name; fits every supported dialect.
const MAX_GENERATED_NAME: usize = 63;

/// Settings plus the entity descriptors registered for one invocation.
#[derive(Debug, Clone, Default)]
pub struct MetadataSources {
    configuration: Configuration,
    entities: Vec<EntityDescriptor>,
}

impl MetadataSources {
    /// Creates sources carrying every configuration key as a setting.
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            entities: Vec::new(),
        }
    }

    /// Registers an entity descriptor.
    pub fn add_entity(&mut self, descriptor: EntityDescriptor) -> &mut Self {
        self.entities.push(descriptor);
        self
    }

    /// Registered descriptors, in registration order.
    pub fn entities(&self) -> &[EntityDescriptor] {
        &self.entities
    }

    /// Pass-through settings.
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Validates the descriptors and resolves them into tables.
    ///
    /// # Errors
    /// Returns `Mapping` for descriptors that cannot become tables and
    /// `ConfigInvalid` for malformed connection settings.
    pub fn build_metadata(&self) -> crate::Result<Metadata> {
        let connection = ConnectionSettings::from_configuration(&self.configuration)?;
        let default_schema = connection.default_schema.clone();

        let mut tables = Vec::with_capacity(self.entities.len());
        let mut seen_tables = HashSet::new();
        for descriptor in &self.entities {
            let table = resolve_table(descriptor, default_schema.as_deref())?;
            if !seen_tables.insert(table.key()) {
                return Err(SchemaToolError::mapping(
                    descriptor.qualified_name(),
                    format!("table '{}' is mapped more than once", table.qualified_name()),
                ));
            }
            tables.push(table);
        }

        resolve_foreign_keys(&self.entities, &mut tables)?;
        let creation_order = creation_order(&tables);

        tracing::debug!(
            "Built metadata for {} tables ({})",
            tables.len(),
            connection
        );

        Ok(Metadata {
            configuration: self.configuration.clone(),
            connection,
            tables,
            creation_order,
        })
    }
}

/// Validated tables plus the settings they were built with.
#[derive(Debug, Clone)]
pub struct Metadata {
    configuration: Configuration,
    connection: ConnectionSettings,
    tables: Vec<Table>,
    creation_order: Vec<usize>,
}

impl Metadata {
    /// Pass-through settings.
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Connection settings.
    pub fn connection(&self) -> &ConnectionSettings {
        &self.connection
    }

    /// Tables in registration order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Tables with referenced tables before the tables referencing them.
    pub fn tables_in_creation_order(&self) -> Vec<&Table> {
        self.creation_order
            .iter()
            .filter_map(|&index| self.tables.get(index))
            .collect()
    }

    /// Distinct explicit schemas used by the tables.
    pub fn schemas(&self) -> BTreeSet<&str> {
        self.tables
            .iter()
            .filter_map(|table| table.schema.as_deref())
            .collect()
    }
}

/// One mapped table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Type name of the entity
    pub entity: String,
    /// Schema, if any
    pub schema: Option<String>,
    /// Table name
    pub name: String,
    /// Columns, in declaration order
    pub columns: Vec<Column>,
    /// Primary key column names
    pub primary_key: Vec<String>,
    /// Foreign keys declared by this table
    pub foreign_keys: Vec<ForeignKey>,
    /// Secondary indexes
    pub indexes: Vec<Index>,
}

impl Table {
    /// `schema.name`, or just the name.
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }

    /// Case-insensitive identity of the table.
    pub fn key(&self) -> String {
        self.qualified_name().to_lowercase()
    }

    /// Column by name, case-insensitively.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }

    /// The identity column, if the primary key is database-generated.
    pub fn identity_column(&self) -> Option<&Column> {
        self.columns.iter().find(|column| column.identity)
    }
}

/// One mapped column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub nullable: bool,
    pub identity: bool,
    pub unique: bool,
    pub default: Option<String>,
}

/// Foreign key from one column to the referenced table's primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Constraint name
    pub name: String,
    /// Referencing column
    pub column: String,
    /// Referenced table's schema
    pub referenced_schema: Option<String>,
    /// Referenced table
    pub referenced_table: String,
    /// Referenced primary key column
    pub referenced_column: String,
}

impl ForeignKey {
    /// `schema.table` of the referenced table.
    pub fn referenced_qualified_name(&self) -> String {
        match &self.referenced_schema {
            Some(schema) => format!("{}.{}", schema, self.referenced_table),
            None => self.referenced_table.clone(),
        }
    }
}

/// Secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

fn resolve_table(
    descriptor: &EntityDescriptor,
    default_schema: Option<&str>,
) -> crate::Result<Table> {
    let entity = descriptor.qualified_name();
    let fail = |message: String| SchemaToolError::mapping(entity.clone(), message);

    if descriptor.columns.is_empty() {
        return Err(fail("no columns are mapped".to_string()));
    }

    let mut names = HashSet::new();
    let mut columns = Vec::with_capacity(descriptor.columns.len());
    let mut primary_key = Vec::new();

    for column in &descriptor.columns {
        if column.name.trim().is_empty() {
            return Err(fail("a column has an empty name".to_string()));
        }
        if !names.insert(column.name.to_lowercase()) {
            return Err(fail(format!("column '{}' is mapped twice", column.name)));
        }
        if column.generated && !column.id {
            return Err(fail(format!(
                "column '{}' is generated but not part of the id",
                column.name
            )));
        }
        if column.generated && !column.column_type.is_integer() {
            return Err(fail(format!(
                "identity column '{}' must have an integer type",
                column.name
            )));
        }
        if column.id {
            primary_key.push(column.name.clone());
        }

        columns.push(Column {
            name: column.name.clone(),
            column_type: column.column_type,
            length: column.length,
            precision: column.precision,
            scale: column.scale,
            nullable: column.nullable && !column.id,
            identity: column.generated,
            unique: column.unique && !column.id,
            default: column.default.clone(),
        });
    }

    if primary_key.is_empty() {
        return Err(fail("no id column is mapped".to_string()));
    }
    if primary_key.len() > 1 && columns.iter().any(|c| c.identity) {
        return Err(fail(
            "an identity column cannot be part of a composite id".to_string(),
        ));
    }

    let mut indexes = Vec::with_capacity(descriptor.indexes.len());
    for index in &descriptor.indexes {
        if index.columns.is_empty() {
            return Err(fail(format!("index '{}' has no columns", index.name)));
        }
        if let Some(unknown) = index
            .columns
            .iter()
            .find(|name| !names.contains(&name.to_lowercase()))
        {
            return Err(fail(format!(
                "index '{}' references unknown column '{}'",
                index.name, unknown
            )));
        }
        indexes.push(Index {
            name: index.name.clone(),
            columns: index.columns.clone(),
            unique: index.unique,
        });
    }

    Ok(Table {
        entity: entity.clone(),
        schema: descriptor
            .schema
            .clone()
            .or_else(|| default_schema.map(str::to_string)),
        name: descriptor.table_name(),
        columns,
        primary_key,
        foreign_keys: Vec::new(),
        indexes,
    })
}

fn resolve_foreign_keys(entities: &[EntityDescriptor], tables: &mut [Table]) -> crate::Result<()> {
    let by_entity: HashMap<String, usize> = tables
        .iter()
        .enumerate()
        .map(|(index, table)| (table.entity.clone(), index))
        .collect();

    let mut resolved = Vec::new();
    for (index, descriptor) in entities.iter().enumerate() {
        for column in &descriptor.columns {
            let Some(target_type) = &column.references else {
                continue;
            };
            let target_name = target_type.replace("::", ".");
            let Some(&target_index) = by_entity.get(&target_name) else {
                return Err(SchemaToolError::mapping(
                    descriptor.qualified_name(),
                    format!(
                        "column '{}' references '{}', which is not a discovered entity",
                        column.name, target_type
                    ),
                ));
            };
            let target = &tables[target_index];
            let [referenced_column] = target.primary_key.as_slice() else {
                return Err(SchemaToolError::mapping(
                    descriptor.qualified_name(),
                    format!(
                        "column '{}' references '{}', which has a composite id",
                        column.name, target_type
                    ),
                ));
            };

            let table_name = &tables[index].name;
            resolved.push((
                index,
                ForeignKey {
                    name: constraint_name("fk", table_name, &column.name),
                    column: column.name.clone(),
                    referenced_schema: target.schema.clone(),
                    referenced_table: target.name.clone(),
                    referenced_column: referenced_column.clone(),
                },
            ));
        }
    }

    for (index, foreign_key) in resolved {
        tables[index].foreign_keys.push(foreign_key);
    }
    Ok(())
}

/// `<prefix>_<table>_<column>`, cut to the shortest identifier limit.
pub(crate) fn constraint_name(prefix: &str, table: &str, column: &str) -> String {
    let name = format!("{}_{}_{}", prefix, table, column).to_lowercase();
    name.chars().take(MAX_GENERATED_NAME).collect()
}

/// Orders tables so referenced tables come first.
///
/// Self references are ignored. Tables caught in a reference cycle keep
/// their registration order after every orderable table.
fn creation_order(tables: &[Table]) -> Vec<usize> {
    let index_by_key: HashMap<String, usize> = tables
        .iter()
        .enumerate()
        .map(|(index, table)| (table.key(), index))
        .collect();

    let dependencies: Vec<HashSet<usize>> = tables
        .iter()
        .enumerate()
        .map(|(index, table)| {
            table
                .foreign_keys
                .iter()
                .filter_map(|fk| {
                    index_by_key.get(&fk.referenced_qualified_name().to_lowercase())
                })
                .copied()
                .filter(|&dependency| dependency != index)
                .collect()
        })
        .collect();

    let mut placed = vec![false; tables.len()];
    let mut order = Vec::with_capacity(tables.len());

    loop {
        let next = (0..tables.len()).find(|&index| {
            !placed[index] && dependencies[index].iter().all(|&dep| placed[dep])
        });
        match next {
            Some(index) => {
                placed[index] = true;
                order.push(index);
            }
            None => break,
        }
    }

    if order.len() < tables.len() {
        let cyclic: Vec<&str> = (0..tables.len())
            .filter(|&index| !placed[index])
            .map(|index| tables[index].name.as_str())
            .collect();
        tracing::warn!(
            "Foreign key cycle between tables {:?}; using registration order for them",
            cyclic
        );
        order.extend((0..tables.len()).filter(|&index| !placed[index]));
    }

    order
}
