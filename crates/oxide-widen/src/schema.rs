//! Schema representation types.
//!
//! These types describe the read-only snapshot that a catalog produces for
//! one run: tables, their primary keys, their foreign key constraints, and
//! their integer-family columns. Nothing here is mutated once captured; the
//! widening engine only derives work sets from it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A table identifier, optionally qualified by its schema (database).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableName {
    /// Schema the table lives in, `None` for the connection default.
    pub schema: Option<String>,
    /// Table name.
    pub name: String,
}

impl TableName {
    /// Creates an unqualified table name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    /// Creates a table name qualified by `schema`.
    #[must_use]
    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Returns a table in the same schema as `self`.
    ///
    /// Used to resolve the referenced side of a foreign key.
    #[must_use]
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self {
            schema: self.schema.clone(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The integer family, independent of any engine spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegerType {
    /// 8-bit integer.
    TinyInt,
    /// 16-bit integer.
    SmallInt,
    /// 24-bit integer.
    MediumInt,
    /// 32-bit integer (`INT` / `INTEGER`).
    Int,
    /// 64-bit integer.
    BigInt,
}

impl IntegerType {
    /// Parses an engine column type such as `int(10) unsigned` or `INTEGER`.
    ///
    /// Display widths and trailing attributes are ignored. Returns `None`
    /// for anything outside the integer family.
    #[must_use]
    pub fn parse(column_type: &str) -> Option<Self> {
        let lowered = column_type.trim().to_ascii_lowercase();
        let base = lowered
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default();

        match base {
            "tinyint" => Some(Self::TinyInt),
            "smallint" => Some(Self::SmallInt),
            "mediumint" => Some(Self::MediumInt),
            "int" | "integer" => Some(Self::Int),
            "bigint" => Some(Self::BigInt),
            _ => None,
        }
    }

    /// Returns the SQL type name.
    #[must_use]
    pub fn sql_name(&self) -> &'static str {
        match self {
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::MediumInt => "MEDIUMINT",
            Self::Int => "INT",
            Self::BigInt => "BIGINT",
        }
    }
}

/// Default value of a column, as captured from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DefaultValue {
    /// No default clause.
    #[default]
    None,
    /// `DEFAULT NULL`.
    Null,
    /// Quoted literal, stored unquoted (e.g. `'0'` is stored as `0`).
    Literal(String),
    /// SQL expression emitted verbatim.
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation of this default value.
    #[must_use]
    pub fn to_sql(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Null => Some("NULL".to_string()),
            Self::Literal(s) => Some(format!("'{}'", s.replace('\'', "''"))),
            Self::Expression(expr) => Some(expr.clone()),
        }
    }
}

/// Foreign key action (ON DELETE, ON UPDATE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForeignKeyAction {
    /// No action (error if referenced row is deleted/updated).
    NoAction,
    /// Restrict (same as NoAction but checked immediately).
    Restrict,
    /// Cascade the delete/update to referencing rows.
    Cascade,
    /// Set the foreign key column to NULL.
    SetNull,
    /// Set the foreign key column to its default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of this action.
    #[must_use]
    pub fn to_sql(&self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }

    /// Parses an action keyword, case-insensitive, tolerating extra spaces.
    #[must_use]
    pub fn parse(action: &str) -> Option<Self> {
        let normalized = action
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();

        match normalized.as_str() {
            "NO ACTION" => Some(Self::NoAction),
            "RESTRICT" => Some(Self::Restrict),
            "CASCADE" => Some(Self::Cascade),
            "SET NULL" => Some(Self::SetNull),
            "SET DEFAULT" => Some(Self::SetDefault),
            _ => None,
        }
    }
}

/// Attributes that must survive the widening untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidenAttributes {
    /// Whether the column allows NULL values.
    pub nullable: bool,
    /// Default value.
    pub default: DefaultValue,
    /// Whether this column auto-increments.
    pub auto_increment: bool,
}

/// An integer-family column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegerColumn {
    /// Owning table.
    pub table: TableName,
    /// Column name.
    pub name: String,
    /// Integer family member.
    pub integer_type: IntegerType,
    /// Whether the column is declared UNSIGNED.
    pub unsigned: bool,
    /// Whether the column allows NULL values.
    pub nullable: bool,
    /// Default value.
    pub default: DefaultValue,
    /// Whether this column auto-increments.
    pub auto_increment: bool,
}

impl IntegerColumn {
    /// Creates a new nullable, signed column without default.
    #[must_use]
    pub fn new(table: TableName, name: impl Into<String>, integer_type: IntegerType) -> Self {
        Self {
            table,
            name: name.into(),
            integer_type,
            unsigned: false,
            nullable: true,
            default: DefaultValue::None,
            auto_increment: false,
        }
    }

    /// Marks the column as UNSIGNED.
    #[must_use]
    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default = value;
        self
    }

    /// Sets the column to auto-increment.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Returns the attributes to carry over when widening.
    #[must_use]
    pub fn attributes(&self) -> WidenAttributes {
        WidenAttributes {
            nullable: self.nullable,
            default: self.default.clone(),
            auto_increment: self.auto_increment,
        }
    }
}

/// A single-column foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyConstraint {
    /// Constraint name, unique within the schema.
    pub name: String,
    /// Referencing table.
    pub table: TableName,
    /// Referencing (local) column.
    pub column: String,
    /// Referenced table.
    pub referenced_table: TableName,
    /// Referenced column.
    pub referenced_column: String,
    /// ON DELETE action, `None` when left to the engine default.
    pub on_delete: Option<ForeignKeyAction>,
    /// ON UPDATE action, `None` when left to the engine default.
    pub on_update: Option<ForeignKeyAction>,
}

impl ForeignKeyConstraint {
    /// Creates a constraint with unspecified actions.
    ///
    /// The referenced table lives in the same schema as `table`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        table: TableName,
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        let referenced_table = table.sibling(referenced_table);
        Self {
            name: name.into(),
            table,
            column: column.into(),
            referenced_table,
            referenced_column: referenced_column.into(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }
}

/// Snapshot of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Table name.
    pub name: TableName,
    /// Primary key column(s), in key order.
    pub primary_key: Vec<String>,
    /// Foreign keys declared on this table.
    pub foreign_keys: Vec<ForeignKeyConstraint>,
    /// Integer-family columns, in declaration order.
    pub integer_columns: Vec<IntegerColumn>,
}

impl TableSnapshot {
    /// Creates an empty table snapshot.
    #[must_use]
    pub fn new(name: TableName) -> Self {
        Self {
            name,
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            integer_columns: Vec::new(),
        }
    }

    /// Sets the primary key columns.
    #[must_use]
    pub fn primary_key(mut self, columns: Vec<String>) -> Self {
        self.primary_key = columns;
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKeyConstraint) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Adds an integer column.
    #[must_use]
    pub fn integer_column(mut self, column: IntegerColumn) -> Self {
        self.integer_columns.push(column);
        self
    }

    /// Gets an integer column by name.
    #[must_use]
    pub fn get_integer_column(&self, name: &str) -> Option<&IntegerColumn> {
        self.integer_columns.iter().find(|c| c.name == name)
    }
}

/// Every table of one schema, in catalog listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    /// All tables in the schema.
    pub tables: Vec<TableSnapshot>,
}

impl SchemaSnapshot {
    /// Creates a new empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table to the snapshot.
    #[must_use]
    pub fn table(mut self, table: TableSnapshot) -> Self {
        self.tables.push(table);
        self
    }

    /// Gets a table by name.
    #[must_use]
    pub fn get_table(&self, name: &str) -> Option<&TableSnapshot> {
        self.tables.iter().find(|t| t.name.name == name)
    }

    /// Returns table names.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_type_parse() {
        assert_eq!(IntegerType::parse("int(10) unsigned"), Some(IntegerType::Int));
        assert_eq!(IntegerType::parse("INTEGER"), Some(IntegerType::Int));
        assert_eq!(IntegerType::parse("tinyint(1)"), Some(IntegerType::TinyInt));
        assert_eq!(IntegerType::parse("smallint"), Some(IntegerType::SmallInt));
        assert_eq!(
            IntegerType::parse("mediumint(8) unsigned zerofill"),
            Some(IntegerType::MediumInt)
        );
        assert_eq!(IntegerType::parse("bigint(20)"), Some(IntegerType::BigInt));
        assert_eq!(IntegerType::parse("varchar(255)"), None);
        assert_eq!(IntegerType::parse("interval"), None);
        assert_eq!(IntegerType::parse(""), None);
    }

    #[test]
    fn test_default_value_to_sql() {
        assert_eq!(DefaultValue::None.to_sql(), None);
        assert_eq!(DefaultValue::Null.to_sql(), Some("NULL".to_string()));
        assert_eq!(
            DefaultValue::Literal("0".to_string()).to_sql(),
            Some("'0'".to_string())
        );
        assert_eq!(
            DefaultValue::Literal("it's".to_string()).to_sql(),
            Some("'it''s'".to_string())
        );
        assert_eq!(
            DefaultValue::Expression("(1 + 1)".to_string()).to_sql(),
            Some("(1 + 1)".to_string())
        );
    }

    #[test]
    fn test_foreign_key_action_parse() {
        assert_eq!(
            ForeignKeyAction::parse("CASCADE"),
            Some(ForeignKeyAction::Cascade)
        );
        assert_eq!(
            ForeignKeyAction::parse("set  null"),
            Some(ForeignKeyAction::SetNull)
        );
        assert_eq!(
            ForeignKeyAction::parse("No Action"),
            Some(ForeignKeyAction::NoAction)
        );
        assert_eq!(
            ForeignKeyAction::parse("RESTRICT"),
            Some(ForeignKeyAction::Restrict)
        );
        assert_eq!(ForeignKeyAction::parse("DROP"), None);
    }

    #[test]
    fn test_column_builder_and_attributes() {
        let col = IntegerColumn::new(TableName::new("users"), "id", IntegerType::Int)
            .unsigned()
            .not_null()
            .auto_increment();

        assert!(col.unsigned);
        assert!(!col.nullable);
        assert_eq!(
            col.attributes(),
            WidenAttributes {
                nullable: false,
                default: DefaultValue::None,
                auto_increment: true,
            }
        );
    }

    #[test]
    fn test_foreign_key_inherits_schema() {
        let fk = ForeignKeyConstraint::new(
            "fk_orders_user",
            TableName::qualified("shop", "orders"),
            "user_id",
            "users",
            "id",
        )
        .on_delete(ForeignKeyAction::Cascade);

        assert_eq!(fk.referenced_table, TableName::qualified("shop", "users"));
        assert_eq!(fk.on_delete, Some(ForeignKeyAction::Cascade));
        assert_eq!(fk.on_update, None);
    }

    #[test]
    fn test_table_name_displays_unqualified() {
        assert_eq!(TableName::qualified("shop", "orders").to_string(), "orders");
    }
}
