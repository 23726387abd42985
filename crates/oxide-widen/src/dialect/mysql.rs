//! MySQL / MariaDB dialect.
//!
//! Widening uses `MODIFY`, which restates the full column definition, so
//! every attribute captured during introspection is written back.

use crate::schema::{ForeignKeyConstraint, TableName, WidenAttributes};

use super::WidenDialect;

/// MySQL widening dialect.
#[derive(Debug, Clone, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl WidenDialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn drop_foreign_key(&self, table: &TableName, constraint_name: &str) -> String {
        format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            self.quote_table(table),
            self.quote_identifier(constraint_name)
        )
    }

    fn widen_column(
        &self,
        table: &TableName,
        column_name: &str,
        attributes: &WidenAttributes,
    ) -> String {
        let mut parts = vec![
            format!("ALTER TABLE {} MODIFY", self.quote_table(table)),
            self.quote_identifier(column_name),
            "BIGINT UNSIGNED".to_string(),
        ];

        parts.push(if attributes.nullable { "NULL" } else { "NOT NULL" }.to_string());

        if let Some(default_sql) = attributes.default.to_sql() {
            parts.push(format!("DEFAULT {}", default_sql));
        }

        if attributes.auto_increment {
            parts.push("AUTO_INCREMENT".to_string());
        }

        parts.join(" ")
    }

    fn add_foreign_key(&self, foreign_key: &ForeignKeyConstraint) -> String {
        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quote_table(&foreign_key.table),
            self.quote_identifier(&foreign_key.name),
            self.quote_identifier(&foreign_key.column),
            self.quote_table(&foreign_key.referenced_table),
            self.quote_identifier(&foreign_key.referenced_column)
        );

        if let Some(action) = foreign_key.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.to_sql());
        }
        if let Some(action) = foreign_key.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.to_sql());
        }

        sql
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }
}
