//! Additive schema update.
//!
//! Compares the mapped tables with an introspected [`ExistingSchema`] and
//! emits only what is missing. Nothing is ever dropped or altered in place.

use super::DdlGenerator;
use crate::database::{ExistingSchema, ExistingTable};
use crate::dialect::Dialect;
use crate::metadata::{Column, Metadata, Table, constraint_name};

impl DdlGenerator {
    /// Statements bringing an existing schema up to the mapped tables.
    ///
    /// Missing tables are created with their indexes and foreign keys,
    /// missing columns are added, missing indexes are created, and missing
    /// foreign keys are added where the dialect can alter them in.
    pub fn update_statements(&self, metadata: &Metadata, existing: &ExistingSchema) -> Vec<String> {
        let tables = metadata.tables_in_creation_order();
        let missing = tables
            .iter()
            .copied()
            .filter(|table| self.existing_table(existing, table).is_none());

        let mut statements = self.namespace_statements(missing);
        let mut foreign_keys = Vec::new();

        for table in tables {
            match self.existing_table(existing, table) {
                None => {
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
                Some(current) => {
                    statements.extend(self.alter_statements(table, current));
                    if self.dialect.supports_alter_foreign_keys() {
                        foreign_keys.extend(
                            table
                                .foreign_keys
                                .iter()
                                .filter(|fk| !current.has_foreign_key(&fk.name))
                                .map(|fk| self.add_foreign_key(table, fk)),
                        );
                    }
                }
            }
        }

        statements.extend(foreign_keys);
        statements
    }

    fn existing_table<'a>(&self, existing: &'a ExistingSchema, table: &Table) -> Option<&'a ExistingTable> {
        let schema = if self.dialect.supports_schemas() {
            table.schema.as_deref()
        } else {
            None
        };
        existing.table(schema, &table.name)
    }

    fn alter_statements(&self, table: &Table, current: &ExistingTable) -> Vec<String> {
        let mut statements = Vec::new();

        for column in table.columns.iter().filter(|c| !current.has_column(&c.name)) {
            statements.push(self.add_column(table, column));

            // SQLite cannot add a column with an inline unique constraint
            if column.unique && self.dialect == Dialect::SQLite {
                let name = constraint_name("uk", &table.name, &column.name);
                if !current.has_index(&name) {
                    statements.push(format!(
                        "create unique index {} on {} ({})",
                        self.ident(&name),
                        self.table_name(table),
                        self.ident(&column.name)
                    ));
                }
            }
        }

        statements.extend(
            table
                .indexes
                .iter()
                .filter(|index| !current.has_index(&index.name))
                .map(|index| self.create_index(table, index)),
        );
        statements
    }

    fn add_column(&self, table: &Table, column: &Column) -> String {
        let sqlite = self.dialect == Dialect::SQLite;
        let mut statement = format!(
            "alter table {} add column {}",
            self.table_name(table),
            self.column_definition(column, !sqlite)
        );

        if sqlite
            && let Some(fk) = table.foreign_keys.iter().find(|fk| fk.column == column.name)
        {
            statement.push_str(&format!(
                " references {} ({})",
                self.ident(&fk.referenced_table),
                self.ident(&fk.referenced_column)
            ));
        }
        statement
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::sample_metadata;
    use super::*;
    use crate::config::ExportOptions;

    fn generator(dialect: Dialect) -> DdlGenerator {
        DdlGenerator::new(dialect, &ExportOptions::default())
    }

    fn customer_table(columns: &[&str]) -> ExistingTable {
        let mut table = ExistingTable::new(None, "customer");
        for column in columns {
            table.add_column(column);
        }
        table
    }

    #[test]
    fn test_empty_database_gets_full_create() {
        let metadata = sample_metadata(&[]);
        let generator = generator(Dialect::PostgreSQL);
        assert_eq!(
            generator.update_statements(&metadata, &ExistingSchema::default()),
            generator.create_statements(&metadata)
        );
    }

    #[test]
    fn test_up_to_date_schema_needs_nothing() {
        let metadata = sample_metadata(&[]);
        let mut existing = ExistingSchema::new(Some("public".to_string()));
        existing.add_table(customer_table(&["id", "email", "active"]));
        let mut orders = ExistingTable::new(Some("public".to_string()), "purchase_order");
        orders.add_column("ID");
        orders.add_column("customer_id");
        orders.add_column("total");
        orders.add_index("idx_purchase_order_customer");
        orders.add_foreign_key("FK_PURCHASE_ORDER_CUSTOMER_ID");
        existing.add_table(orders);

        assert!(
            generator(Dialect::PostgreSQL)
                .update_statements(&metadata, &existing)
                .is_empty()
        );
    }

    #[test]
    fn test_missing_column_and_table() {
        let metadata = sample_metadata(&[]);
        let mut existing = ExistingSchema::default();
        existing.add_table(customer_table(&["id", "email"]));

        let statements = generator(Dialect::PostgreSQL).update_statements(&metadata, &existing);
        assert_eq!(
            statements,
            vec![
                "alter table customer add column active boolean default true",
                "create table purchase_order (id bigint generated by default as identity, \
                 customer_id bigint not null, total numeric(12,2), primary key (id))",
                "create index idx_purchase_order_customer on purchase_order (customer_id)",
                "alter table purchase_order add constraint fk_purchase_order_customer_id \
                 foreign key (customer_id) references customer (id)",
            ]
        );
    }

    #[test]
    fn test_sqlite_unique_column_gets_index() {
        let metadata = sample_metadata(&[]);
        let mut existing = ExistingSchema::default();
        existing.add_table(customer_table(&["id", "active"]));
        let mut orders = ExistingTable::new(None, "purchase_order");
        orders.add_column("id");
        orders.add_column("total");
        existing.add_table(orders);

        let statements = generator(Dialect::SQLite).update_statements(&metadata, &existing);
        assert_eq!(
            statements,
            vec![
                "alter table customer add column email varchar(120) not null",
                "create unique index uk_customer_email on customer (email)",
                "alter table purchase_order add column customer_id bigint not null \
                 references customer (id)",
                "create index idx_purchase_order_customer on purchase_order (customer_id)",
            ]
        );
    }

    #[test]
    fn test_sqlite_ignores_default_schema() {
        let metadata = sample_metadata(&[("hibernate.default_schema", "sales")]);
        let mut existing = ExistingSchema::default();
        existing.add_table(customer_table(&["id", "email", "active"]));

        let statements = generator(Dialect::SQLite).update_statements(&metadata, &existing);
        assert!(statements[0].starts_with("create table purchase_order"));
        assert!(!statements.iter().any(|s| s.contains("table customer")));
    }
}
