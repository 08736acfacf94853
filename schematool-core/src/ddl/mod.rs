//! DDL statement generation.
//!
//! Turns [`Metadata`] into dialect-specific statements. Generation is pure:
//! nothing here touches a database, so the same statements can be executed,
//! written to a script, or printed.
//!
//! # Module Structure
//! - `update`: additive statements against an introspected schema

mod update;

use crate::config::ExportOptions;
use crate::dialect::Dialect;
use crate::dialect::type_mapping::{column_type_sql, identity_column_sql};
use crate::metadata::{Column, ForeignKey, Index, Metadata, Table};

/// Which part of a schema export to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportAction {
    /// Drop every mapped table
    Drop,
    /// Create every mapped table
    Create,
    /// Drop, then create
    Both,
}

impl ExportAction {
    /// Whether the action drops the mapped tables.
    pub fn drops(self) -> bool {
        matches!(self, Self::Drop | Self::Both)
    }

    /// Whether the action creates the mapped tables.
    pub fn creates(self) -> bool {
        matches!(self, Self::Create | Self::Both)
    }
}

impl std::fmt::Display for ExportAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Drop => write!(f, "DROP"),
            Self::Create => write!(f, "CREATE"),
            Self::Both => write!(f, "BOTH"),
        }
    }
}

/// Generates DDL for one dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdlGenerator {
    dialect: Dialect,
    quote_identifiers: bool,
    create_namespaces: bool,
}

impl DdlGenerator {
    /// Creates a generator honoring the quoting and namespace options.
    pub fn new(dialect: Dialect, options: &ExportOptions) -> Self {
        Self {
            dialect,
            quote_identifiers: options.quote_identifiers,
            create_namespaces: options.create_namespaces,
        }
    }

    /// Dialect statements are generated for.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Drops every mapped table, referencing tables first.
    ///
    /// MySQL has no `cascade`, so its foreign keys are dropped before any
    /// table. Those statements fail on a fresh database and are expected to
    /// be run without halting.
    pub fn drop_statements(&self, metadata: &Metadata) -> Vec<String> {
        let tables = metadata.tables_in_creation_order();
        let cascade = match self.dialect {
            Dialect::PostgreSQL | Dialect::Generic => " cascade",
            Dialect::MySQL | Dialect::SQLite => "",
        };

        let mut statements = Vec::new();
        if self.dialect == Dialect::MySQL {
            for table in tables.iter().rev() {
                statements.extend(
                    table
                        .foreign_keys
                        .iter()
                        .map(|fk| self.drop_foreign_key(table, fk)),
                );
            }
        }
        statements.extend(
            tables
                .iter()
                .rev()
                .map(|table| format!("drop table if exists {}{}", self.table_name(table), cascade)),
        );
        statements
    }

    /// Creates every mapped table with its indexes and foreign keys.
    pub fn create_statements(&self, metadata: &Metadata) -> Vec<String> {
        let tables = metadata.tables_in_creation_order();
        let mut statements = self.namespace_statements(tables.iter().copied());
        let mut foreign_keys = Vec::new();

        for table in tables {
            statements.push(self.create_table(table));
            statements.extend(table.indexes.iter().map(|index| self.create_index(table, index)));
            if self.dialect.supports_alter_foreign_keys() {
                foreign_keys.extend(
                    table
                        .foreign_keys
                        .iter()
                        .map(|fk| self.add_foreign_key(table, fk)),
                );
            }
        }

        statements.extend(foreign_keys);
        statements
    }

    fn namespace_statements<'a>(&self, tables: impl Iterator<Item = &'a Table>) -> Vec<String> {
        if !self.create_namespaces || !self.dialect.supports_schemas() {
            return Vec::new();
        }

        let mut schemas: Vec<&str> = Vec::new();
        for schema in tables.filter_map(|table| table.schema.as_deref()) {
            if !schemas.contains(&schema) {
                schemas.push(schema);
            }
        }
        schemas
            .into_iter()
            .map(|schema| format!("create schema if not exists {}", self.ident(schema)))
            .collect()
    }

    pub(crate) fn create_table(&self, table: &Table) -> String {
        let sqlite_identity = self.dialect == Dialect::SQLite
            && table.primary_key.len() == 1
            && table.identity_column().is_some();

        let mut parts: Vec<String> = table
            .columns
            .iter()
            .map(|column| {
                if sqlite_identity && column.identity {
                    format!("{} integer primary key autoincrement", self.ident(&column.name))
                } else {
                    self.column_definition(column, true)
                }
            })
            .collect();

        if !sqlite_identity {
            parts.push(format!("primary key ({})", self.ident_list(&table.primary_key)));
        }

        if !self.dialect.supports_alter_foreign_keys() {
            parts.extend(table.foreign_keys.iter().map(|fk| {
                format!(
                    "constraint {} foreign key ({}) references {} ({})",
                    self.ident(&fk.name),
                    self.ident(&fk.column),
                    self.referenced_table_name(fk),
                    self.ident(&fk.referenced_column)
                )
            }));
        }

        format!(
            "create table {} ({}){}",
            self.table_name(table),
            parts.join(", "),
            self.dialect.table_type_suffix()
        )
    }

    /// Column definition; `with_unique` controls the inline unique clause.
    pub(crate) fn column_definition(&self, column: &Column, with_unique: bool) -> String {
        let mut definition = self.ident(&column.name);
        definition.push(' ');

        if column.identity {
            definition.push_str(&identity_column_sql(self.dialect, column.column_type));
        } else {
            definition.push_str(&column_type_sql(
                self.dialect,
                column.column_type,
                column.length,
                column.precision,
                column.scale,
            ));
        }

        if let Some(default) = &column.default {
            definition.push_str(" default ");
            definition.push_str(default);
        }
        // identity clauses already imply not null
        if !column.nullable && !column.identity {
            definition.push_str(" not null");
        }
        if column.unique && with_unique {
            definition.push_str(" unique");
        }
        definition
    }

    pub(crate) fn create_index(&self, table: &Table, index: &Index) -> String {
        format!(
            "create {}index {} on {} ({})",
            if index.unique { "unique " } else { "" },
            self.ident(&index.name),
            self.table_name(table),
            self.ident_list(&index.columns)
        )
    }

    fn drop_foreign_key(&self, table: &Table, fk: &ForeignKey) -> String {
        format!(
            "alter table {} drop foreign key {}",
            self.table_name(table),
            self.ident(&fk.name)
        )
    }

    pub(crate) fn add_foreign_key(&self, table: &Table, fk: &ForeignKey) -> String {
        format!(
            "alter table {} add constraint {} foreign key ({}) references {} ({})",
            self.table_name(table),
            self.ident(&fk.name),
            self.ident(&fk.column),
            self.referenced_table_name(fk),
            self.ident(&fk.referenced_column)
        )
    }

    /// Schema-qualified table name; SQLite ignores schemas.
    pub(crate) fn table_name(&self, table: &Table) -> String {
        self.qualify(table.schema.as_deref(), &table.name)
    }

    fn referenced_table_name(&self, fk: &ForeignKey) -> String {
        self.qualify(fk.referenced_schema.as_deref(), &fk.referenced_table)
    }

    fn qualify(&self, schema: Option<&str>, name: &str) -> String {
        match schema {
            Some(schema) if self.dialect.supports_schemas() => {
                format!("{}.{}", self.ident(schema), self.ident(name))
            }
            _ => self.ident(name),
        }
    }

    pub(crate) fn ident(&self, name: &str) -> String {
        if self.quote_identifiers || !is_plain_identifier(name) {
            self.dialect.quote(name)
        } else {
            name.to_string()
        }
    }

    fn ident_list(&self, names: &[String]) -> String {
        names
            .iter()
            .map(|name| self.ident(name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
