//! Schema catalog backends.
//!
//! The transformer reads schema facts through the [`SchemaCatalog`] trait
//! only. Backends differ in where the facts come from:
//!
//! - [`MysqlCreateTableCatalog`] parses `SHOW CREATE TABLE` output.
//! - [`MysqlInformationSchemaCatalog`] queries `information_schema`.
//!
//! Both produce the same [`SchemaSnapshot`] for the same schema.

mod create_table;
mod information_schema;

pub use create_table::{parse_create_table, MysqlCreateTableCatalog};
pub use information_schema::MysqlInformationSchemaCatalog;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::schema::{ForeignKeyConstraint, IntegerColumn, SchemaSnapshot, TableName, TableSnapshot};

/// Source of table, column and constraint facts.
///
/// Every method fails with [`WidenError::Catalog`](crate::error::WidenError::Catalog).
#[async_trait]
pub trait SchemaCatalog: Send + Sync {
    /// Returns the backend name (for logs).
    fn name(&self) -> &'static str;

    /// Lists base tables of `schema`, or of the connection default schema.
    async fn list_tables(&self, schema: Option<&str>) -> Result<Vec<TableName>>;

    /// Returns the primary key columns of `table` in key order, empty if none.
    async fn primary_key_columns(&self, table: &TableName) -> Result<Vec<String>>;

    /// Returns the foreign keys declared on `table`.
    async fn foreign_key_constraints(&self, table: &TableName) -> Result<Vec<ForeignKeyConstraint>>;

    /// Returns the integer-family columns of `table`.
    async fn integer_columns(&self, table: &TableName) -> Result<Vec<IntegerColumn>>;
}

/// Which catalog backend to read the schema with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CatalogKind {
    /// Parse `SHOW CREATE TABLE` statements.
    #[default]
    CreateTable,
    /// Query `information_schema`.
    InformationSchema,
}

/// Reads a consistent snapshot of every table, in listing order.
pub async fn introspect<C>(catalog: &C, schema: Option<&str>) -> Result<SchemaSnapshot>
where
    C: SchemaCatalog + ?Sized,
{
    let tables = catalog.list_tables(schema).await?;
    info!(
        catalog = catalog.name(),
        schema = schema.unwrap_or("<default>"),
        tables = tables.len(),
        "Introspecting schema"
    );

    let mut snapshot = SchemaSnapshot::new();
    for table in tables {
        let primary_key = catalog.primary_key_columns(&table).await?;
        let foreign_keys = catalog.foreign_key_constraints(&table).await?;
        let integer_columns = catalog.integer_columns(&table).await?;

        debug!(
            table = %table,
            primary_key = ?primary_key,
            foreign_keys = foreign_keys.len(),
            integer_columns = integer_columns.len(),
            "Table introspected"
        );

        snapshot.tables.push(TableSnapshot {
            name: table,
            primary_key,
            foreign_keys,
            integer_columns,
        });
    }

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WidenError;
    use crate::mock::MemoryCatalog;
    use crate::schema::{IntegerType, TableSnapshot};

    #[tokio::test]
    async fn test_introspect_preserves_listing_order() {
        let catalog = MemoryCatalog::new()
            .table(TableSnapshot::new(TableName::new("users")))
            .table(TableSnapshot::new(TableName::new("orders")))
            .table(TableSnapshot::new(TableName::new("items")));

        let snapshot = introspect(&catalog, None).await.unwrap();
        let names: Vec<&str> = snapshot.table_names().collect();
        assert_eq!(names, vec!["users", "orders", "items"]);
    }

    #[tokio::test]
    async fn test_introspect_collects_table_facts() {
        let users = TableName::new("users");
        let catalog = MemoryCatalog::new().table(
            TableSnapshot::new(users.clone())
                .primary_key(vec!["id".to_string()])
                .integer_column(
                    IntegerColumn::new(users.clone(), "id", IntegerType::Int)
                        .unsigned()
                        .not_null()
                        .auto_increment(),
                ),
        );

        let snapshot = introspect(&catalog, None).await.unwrap();
        let table = snapshot.get_table("users").unwrap();
        assert_eq!(table.primary_key, vec!["id"]);
        assert!(table.get_integer_column("id").unwrap().auto_increment);
    }

    #[tokio::test]
    async fn test_introspect_propagates_catalog_errors() {
        let catalog = MemoryCatalog::new()
            .table(TableSnapshot::new(TableName::new("users")))
            .fail_on("users");

        let result = introspect(&catalog, None).await;
        assert!(matches!(result, Err(WidenError::Catalog { .. })));
    }
}
