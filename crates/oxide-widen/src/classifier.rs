//! Key column classification.
//!
//! Reduces a schema snapshot to the work set: the integer columns that are
//! part of a primary key or are the local side of a foreign key, plus the
//! foreign keys hanging off those columns. Classification looks at each
//! table on its own; it does not chase chains of foreign keys across tables.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::schema::{ForeignKeyConstraint, IntegerColumn, SchemaSnapshot, TableSnapshot};

/// Columns to widen and constraints to drop and restore around them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSet {
    /// Key columns, in table listing order then declaration order.
    pub columns: Vec<IntegerColumn>,
    /// Foreign keys whose local column is in `columns`.
    pub constraints: Vec<ForeignKeyConstraint>,
}

impl WorkSet {
    /// Classifies every table of `snapshot`, keeping listing order.
    #[must_use]
    pub fn from_snapshot(snapshot: &SchemaSnapshot) -> Self {
        let mut work = Self::default();
        for table in &snapshot.tables {
            work.extend(classify_table(table));
        }
        work
    }

    /// Appends another work set.
    pub fn extend(&mut self, other: WorkSet) {
        self.columns.extend(other.columns);
        self.constraints.extend(other.constraints);
    }

    /// Returns true if there is nothing to do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.constraints.is_empty()
    }
}

/// Classifies a single table.
#[must_use]
pub fn classify_table(table: &TableSnapshot) -> WorkSet {
    let key_column_names: HashSet<&str> = table
        .primary_key
        .iter()
        .map(String::as_str)
        .chain(table.foreign_keys.iter().map(|fk| fk.column.as_str()))
        .collect();

    let columns: Vec<IntegerColumn> = table
        .integer_columns
        .iter()
        .filter(|c| key_column_names.contains(c.name.as_str()))
        .cloned()
        .collect();

    let column_names: HashSet<&str> = columns.iter().map(|c| c.name.as_str()).collect();

    let constraints = table
        .foreign_keys
        .iter()
        .filter(|fk| column_names.contains(fk.column.as_str()))
        .cloned()
        .collect();

    WorkSet {
        columns,
        constraints,
    }
}
