//! DDL operations.
//!
//! The widening protocol only ever issues three kinds of schema changes.
//! Each is described here independently of any SQL dialect; a
//! [`WidenDialect`](crate::dialect::WidenDialect) turns them into statements.

use serde::{Deserialize, Serialize};

use crate::schema::{ForeignKeyConstraint, TableName, WidenAttributes};

/// A single DDL operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DdlOperation {
    /// Drop a foreign key constraint.
    DropForeignKey {
        /// Table name.
        table: TableName,
        /// Constraint name.
        constraint_name: String,
    },

    /// Change an integer column to the 64-bit unsigned type.
    WidenColumn {
        /// Table name.
        table: TableName,
        /// Column name.
        column_name: String,
        /// Attributes to keep as they were.
        attributes: WidenAttributes,
    },

    /// Add a foreign key constraint.
    AddForeignKey {
        /// Foreign key definition.
        foreign_key: ForeignKeyConstraint,
    },
}

impl DdlOperation {
    /// Creates a DropForeignKey operation.
    #[must_use]
    pub fn drop_foreign_key(table: TableName, constraint_name: impl Into<String>) -> Self {
        Self::DropForeignKey {
            table,
            constraint_name: constraint_name.into(),
        }
    }

    /// Creates a WidenColumn operation.
    #[must_use]
    pub fn widen_column(
        table: TableName,
        column_name: impl Into<String>,
        attributes: WidenAttributes,
    ) -> Self {
        Self::WidenColumn {
            table,
            column_name: column_name.into(),
            attributes,
        }
    }

    /// Creates an AddForeignKey operation.
    #[must_use]
    pub fn add_foreign_key(foreign_key: ForeignKeyConstraint) -> Self {
        Self::AddForeignKey { foreign_key }
    }

    /// Returns the table this operation alters.
    #[must_use]
    pub fn table(&self) -> &TableName {
        match self {
            Self::DropForeignKey { table, .. } | Self::WidenColumn { table, .. } => table,
            Self::AddForeignKey { foreign_key } => &foreign_key.table,
        }
    }

    /// Returns a human-readable description of this operation.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::DropForeignKey {
                table,
                constraint_name,
            } => format!(
                "Drop foreign key '{}' from table '{}'",
                constraint_name, table
            ),
            Self::WidenColumn {
                table, column_name, ..
            } => format!("Widen column '{}' in table '{}'", column_name, table),
            Self::AddForeignKey { foreign_key } => format!(
                "Add foreign key '{}' to table '{}' ({} -> {}.{})",
                foreign_key.name,
                foreign_key.table,
                foreign_key.column,
                foreign_key.referenced_table,
                foreign_key.referenced_column
            ),
        }
    }
}
