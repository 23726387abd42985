//! DDL executor interface.
//!
//! The transformer never talks SQL itself. It hands each mutation to a
//! [`DdlExecutor`], which is free to run it, print it, or record it.

use async_trait::async_trait;

use crate::error::Result;
use crate::schema::{ForeignKeyConstraint, TableName, WidenAttributes};

/// Applies schema mutations against a live connection.
///
/// Every method fails with [`WidenError::Ddl`](crate::error::WidenError::Ddl)
/// when the statement is rejected.
#[async_trait]
pub trait DdlExecutor: Send + Sync {
    /// Drops the named foreign key constraint from `table`.
    async fn drop_foreign_key(&self, table: &TableName, constraint_name: &str) -> Result<()>;

    /// Changes the column to the 64-bit unsigned type, applying `attributes`.
    async fn widen_column(
        &self,
        table: &TableName,
        column_name: &str,
        attributes: &WidenAttributes,
    ) -> Result<()>;

    /// Recreates a foreign key constraint exactly as described.
    async fn add_foreign_key(&self, foreign_key: &ForeignKeyConstraint) -> Result<()>;
}
