//! Catalog backed by `information_schema` queries.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

use crate::error::{Result, WidenError};
use crate::schema::{
    DefaultValue, ForeignKeyAction, ForeignKeyConstraint, IntegerColumn, IntegerType, TableName,
};

use super::SchemaCatalog;

const LIST_TABLES_SQL: &str = "SELECT TABLE_NAME AS table_name
    FROM information_schema.TABLES
    WHERE TABLE_SCHEMA = COALESCE(?, DATABASE())
    AND TABLE_TYPE = 'BASE TABLE'
    ORDER BY TABLE_NAME";

const PRIMARY_KEY_SQL: &str = "SELECT COLUMN_NAME AS column_name
    FROM information_schema.KEY_COLUMN_USAGE
    WHERE TABLE_SCHEMA = COALESCE(?, DATABASE())
    AND TABLE_NAME = ?
    AND CONSTRAINT_NAME = 'PRIMARY'
    ORDER BY ORDINAL_POSITION";

const FOREIGN_KEYS_SQL: &str = "SELECT
        kcu.CONSTRAINT_NAME AS constraint_name,
        kcu.TABLE_SCHEMA AS table_schema,
        kcu.COLUMN_NAME AS column_name,
        kcu.REFERENCED_TABLE_SCHEMA AS referenced_table_schema,
        kcu.REFERENCED_TABLE_NAME AS referenced_table_name,
        kcu.REFERENCED_COLUMN_NAME AS referenced_column_name,
        rc.DELETE_RULE AS delete_rule,
        rc.UPDATE_RULE AS update_rule
    FROM information_schema.KEY_COLUMN_USAGE kcu
    JOIN information_schema.REFERENTIAL_CONSTRAINTS rc
    ON kcu.CONSTRAINT_SCHEMA = rc.CONSTRAINT_SCHEMA
        AND kcu.CONSTRAINT_NAME = rc.CONSTRAINT_NAME
        AND kcu.TABLE_NAME = rc.TABLE_NAME
    WHERE kcu.TABLE_SCHEMA = COALESCE(?, DATABASE())
    AND kcu.TABLE_NAME = ?
    AND kcu.REFERENCED_TABLE_NAME IS NOT NULL
    ORDER BY kcu.CONSTRAINT_NAME, kcu.ORDINAL_POSITION";

const COLUMNS_SQL: &str = "SELECT
        COLUMN_NAME AS column_name,
        COLUMN_TYPE AS column_type,
        IS_NULLABLE AS is_nullable,
        COLUMN_DEFAULT AS column_default,
        EXTRA AS extra
    FROM information_schema.COLUMNS
    WHERE TABLE_SCHEMA = COALESCE(?, DATABASE())
    AND TABLE_NAME = ?
    ORDER BY ORDINAL_POSITION";

/// MySQL catalog that reads structured metadata from `information_schema`.
pub struct MysqlInformationSchemaCatalog {
    pool: MySqlPool,
}

impl MysqlInformationSchemaCatalog {
    /// Creates a catalog over `pool`.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn get_str_with_null(row: &MySqlRow, col_name: &str) -> Result<Option<String>> {
        row.try_get(col_name)
            .map_err(|e| WidenError::catalog(format!("reading {}", col_name), e))
    }

    fn get_str(row: &MySqlRow, col_name: &str) -> Result<String> {
        Ok(Self::get_str_with_null(row, col_name)?.unwrap_or_default())
    }
}

/// Builds a column from one `information_schema.COLUMNS` row.
///
/// `information_schema` cannot tell "no default" from `DEFAULT NULL`; both
/// come back as `None`, which restates identically on a nullable column.
fn integer_column(
    table: &TableName,
    name: String,
    column_type: &str,
    is_nullable: &str,
    column_default: Option<String>,
    extra: &str,
) -> Option<IntegerColumn> {
    let integer_type = IntegerType::parse(column_type)?;
    let extra = extra.to_ascii_lowercase();

    let default = match column_default {
        None => DefaultValue::None,
        Some(value) if value.eq_ignore_ascii_case("NULL") => DefaultValue::Null,
        Some(value) if extra.contains("default_generated") => {
            DefaultValue::Expression(format!("({})", value))
        }
        Some(value) => DefaultValue::Literal(value),
    };

    Some(IntegerColumn {
        table: table.clone(),
        name,
        integer_type,
        unsigned: column_type.to_ascii_lowercase().contains("unsigned"),
        nullable: is_nullable.eq_ignore_ascii_case("YES"),
        default,
        auto_increment: extra.contains("auto_increment"),
    })
}

/// One `KEY_COLUMN_USAGE` row joined with its referential rules.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ForeignKeyRow {
    constraint_name: String,
    table_schema: String,
    column_name: String,
    referenced_table_schema: Option<String>,
    referenced_table_name: String,
    referenced_column_name: String,
    delete_rule: String,
    update_rule: String,
}

/// Builds the single-column foreign keys of `table` from rows ordered by
/// constraint name and ordinal position.
///
/// Composite keys show up as several rows under one name and are left out.
/// A referenced table in another schema keeps that schema, even when
/// `table` itself is unqualified.
fn foreign_keys(table: &TableName, rows: Vec<ForeignKeyRow>) -> Vec<ForeignKeyConstraint> {
    let mut grouped: BTreeMap<String, Vec<ForeignKeyConstraint>> = BTreeMap::new();
    let mut order = Vec::new();

    for row in rows {
        let referenced_table = match row.referenced_table_schema {
            Some(schema) if schema != row.table_schema => {
                TableName::qualified(schema, row.referenced_table_name)
            }
            _ => table.sibling(row.referenced_table_name),
        };

        let fk = ForeignKeyConstraint {
            name: row.constraint_name.clone(),
            table: table.clone(),
            column: row.column_name,
            referenced_table,
            referenced_column: row.referenced_column_name,
            on_delete: ForeignKeyAction::parse(&row.delete_rule),
            on_update: ForeignKeyAction::parse(&row.update_rule),
        };

        if !grouped.contains_key(&row.constraint_name) {
            order.push(row.constraint_name.clone());
        }
        grouped.entry(row.constraint_name).or_default().push(fk);
    }

    order
        .into_iter()
        .filter_map(|name| {
            let mut parts = grouped.remove(&name)?;
            if parts.len() == 1 {
                parts.pop()
            } else {
                None
            }
        })
        .collect()
}

#[async_trait]
impl SchemaCatalog for MysqlInformationSchemaCatalog {
    fn name(&self) -> &'static str {
        "information-schema"
    }

    async fn list_tables(&self, schema: Option<&str>) -> Result<Vec<TableName>> {
        let mut tables = Vec::new();
        let mut rows = sqlx::query(LIST_TABLES_SQL).bind(schema).fetch(&self.pool);
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| WidenError::catalog("listing tables", e))?
        {
            let name = Self::get_str(&row, "table_name")?;
            tables.push(match schema {
                Some(schema) => TableName::qualified(schema, name),
                None => TableName::new(name),
            });
        }
        Ok(tables)
    }

    async fn primary_key_columns(&self, table: &TableName) -> Result<Vec<String>> {
        let mut columns = Vec::new();
        let mut rows = sqlx::query(PRIMARY_KEY_SQL)
            .bind(table.schema.as_deref())
            .bind(&table.name)
            .fetch(&self.pool);
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| WidenError::catalog(format!("primary key of {}", table), e))?
        {
            columns.push(Self::get_str(&row, "column_name")?);
        }
        Ok(columns)
    }

    async fn foreign_key_constraints(&self, table: &TableName) -> Result<Vec<ForeignKeyConstraint>> {
        let mut fk_rows = Vec::new();
        let mut rows = sqlx::query(FOREIGN_KEYS_SQL)
            .bind(table.schema.as_deref())
            .bind(&table.name)
            .fetch(&self.pool);
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| WidenError::catalog(format!("foreign keys of {}", table), e))?
        {
            fk_rows.push(ForeignKeyRow {
                constraint_name: Self::get_str(&row, "constraint_name")?,
                table_schema: Self::get_str(&row, "table_schema")?,
                column_name: Self::get_str(&row, "column_name")?,
                referenced_table_schema: Self::get_str_with_null(&row, "referenced_table_schema")?,
                referenced_table_name: Self::get_str(&row, "referenced_table_name")?,
                referenced_column_name: Self::get_str(&row, "referenced_column_name")?,
                delete_rule: Self::get_str(&row, "delete_rule")?,
                update_rule: Self::get_str(&row, "update_rule")?,
            });
        }
        Ok(foreign_keys(table, fk_rows))
    }

    async fn integer_columns(&self, table: &TableName) -> Result<Vec<IntegerColumn>> {
        let mut columns = Vec::new();
        let mut rows = sqlx::query(COLUMNS_SQL)
            .bind(table.schema.as_deref())
            .bind(&table.name)
            .fetch(&self.pool);
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| WidenError::catalog(format!("columns of {}", table), e))?
        {
            let column = integer_column(
                table,
                Self::get_str(&row, "column_name")?,
                &Self::get_str(&row, "column_type")?,
                &Self::get_str(&row, "is_nullable")?,
                Self::get_str_with_null(&row, "column_default")?,
                &Self::get_str(&row, "extra")?,
            );
            if let Some(column) = column {
                columns.push(column);
            }
        }
        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> TableName {
        TableName::new("orders")
    }

    #[test]
    fn test_integer_column_auto_increment_key() {
        let column = integer_column(
            &orders(),
            "id".to_string(),
            "int unsigned",
            "NO",
            None,
            "auto_increment",
        )
        .unwrap();

        assert_eq!(column.integer_type, IntegerType::Int);
        assert!(column.unsigned);
        assert!(!column.nullable);
        assert!(column.auto_increment);
        assert_eq!(column.default, DefaultValue::None);
    }

    #[test]
    fn test_integer_column_literal_and_expression_defaults() {
        let literal = integer_column(
            &orders(),
            "quantity".to_string(),
            "smallint(6)",
            "NO",
            Some("1".to_string()),
            "",
        )
        .unwrap();
        assert_eq!(literal.default, DefaultValue::Literal("1".to_string()));
        assert!(!literal.unsigned);

        let expression = integer_column(
            &orders(),
            "n".to_string(),
            "int",
            "YES",
            Some("1 + 1".to_string()),
            "DEFAULT_GENERATED",
        )
        .unwrap();
        assert_eq!(
            expression.default,
            DefaultValue::Expression("(1 + 1)".to_string())
        );
        assert!(expression.nullable);
    }

    #[test]
    fn test_non_integer_columns_are_ignored() {
        assert!(integer_column(
            &orders(),
            "note".to_string(),
            "varchar(255)",
            "YES",
            None,
            ""
        )
        .is_none());
    }

    fn fk_row(name: &str, column: &str, referenced_schema: &str, referenced: &str) -> ForeignKeyRow {
        ForeignKeyRow {
            constraint_name: name.to_string(),
            table_schema: "shop".to_string(),
            column_name: column.to_string(),
            referenced_table_schema: Some(referenced_schema.to_string()),
            referenced_table_name: referenced.to_string(),
            referenced_column_name: "id".to_string(),
            delete_rule: "CASCADE".to_string(),
            update_rule: "RESTRICT".to_string(),
        }
    }

    #[test]
    fn test_foreign_keys_same_schema() {
        let fks = foreign_keys(
            &orders(),
            vec![fk_row("fk_orders_user", "user_id", "shop", "users")],
        );

        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].name, "fk_orders_user");
        assert_eq!(fks[0].column, "user_id");
        assert_eq!(fks[0].referenced_table, TableName::new("users"));
        assert_eq!(fks[0].on_delete, Some(ForeignKeyAction::Cascade));
        assert_eq!(fks[0].on_update, Some(ForeignKeyAction::Restrict));

        let qualified = TableName::qualified("shop", "orders");
        let fks = foreign_keys(
            &qualified,
            vec![fk_row("fk_orders_user", "user_id", "shop", "users")],
        );
        assert_eq!(fks[0].referenced_table, TableName::qualified("shop", "users"));
    }

    #[test]
    fn test_foreign_keys_cross_schema_without_selector() {
        let fks = foreign_keys(
            &orders(),
            vec![fk_row("fk_orders_account", "account_id", "auth", "users")],
        );

        assert_eq!(fks[0].referenced_table, TableName::qualified("auth", "users"));
        assert_eq!(fks[0].table, orders());
    }

    #[test]
    fn test_foreign_keys_skip_composite() {
        let fks = foreign_keys(
            &orders(),
            vec![
                fk_row("fk_orders_shipment", "shipment_id", "shop", "shipments"),
                fk_row("fk_orders_shipment", "warehouse_id", "shop", "shipments"),
                fk_row("fk_orders_user", "user_id", "shop", "users"),
            ],
        );

        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].name, "fk_orders_user");
    }
}
