//! Database dialect implementations.
//!
//! Each dialect knows how to render the widening DDL operations for its
//! database system.

mod mysql;

pub use mysql::MysqlDialect;

use crate::operations::DdlOperation;
use crate::schema::{ForeignKeyConstraint, TableName, WidenAttributes};

/// Trait for database-specific SQL generation.
pub trait WidenDialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Generates SQL for a DDL operation.
    fn generate_sql(&self, operation: &DdlOperation) -> String {
        match operation {
            DdlOperation::DropForeignKey {
                table,
                constraint_name,
            } => self.drop_foreign_key(table, constraint_name),
            DdlOperation::WidenColumn {
                table,
                column_name,
                attributes,
            } => self.widen_column(table, column_name, attributes),
            DdlOperation::AddForeignKey { foreign_key } => self.add_foreign_key(foreign_key),
        }
    }

    /// Generates SQL for dropping a foreign key.
    fn drop_foreign_key(&self, table: &TableName, constraint_name: &str) -> String;

    /// Generates SQL for widening a column to the 64-bit unsigned type.
    fn widen_column(
        &self,
        table: &TableName,
        column_name: &str,
        attributes: &WidenAttributes,
    ) -> String;

    /// Generates SQL for adding a foreign key.
    fn add_foreign_key(&self, foreign_key: &ForeignKeyConstraint) -> String;

    /// Quote an identifier (table name, column name, etc.).
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Quote a table name, qualifying it with its schema when known.
    fn quote_table(&self, table: &TableName) -> String {
        match &table.schema {
            Some(schema) => format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(&table.name)
            ),
            None => self.quote_identifier(&table.name),
        }
    }
}
