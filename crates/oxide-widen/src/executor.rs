//! SQL-backed DDL executor.
//!
//! This module renders widening operations with a dialect and runs them
//! against a MySQL connection pool, one statement at a time.

use async_trait::async_trait;
use sqlx::MySqlPool;
use tracing::{debug, info};

use crate::ddl::DdlExecutor;
use crate::dialect::WidenDialect;
use crate::error::{Result, WidenError};
use crate::operations::DdlOperation;
use crate::schema::{ForeignKeyConstraint, TableName, WidenAttributes};

/// Executes widening DDL against a database.
pub struct SqlExecutor<D: WidenDialect> {
    pool: MySqlPool,
    dialect: D,
    dry_run: bool,
}

impl<D: WidenDialect> SqlExecutor<D> {
    /// Creates a new executor.
    pub fn new(pool: MySqlPool, dialect: D) -> Self {
        Self {
            pool,
            dialect,
            dry_run: false,
        }
    }

    /// Enables dry-run mode (SQL is printed but not executed).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    /// Generates SQL for an operation without executing it.
    #[must_use]
    pub fn sql_for(&self, operation: &DdlOperation) -> String {
        self.dialect.generate_sql(operation)
    }

    /// Renders and runs a single operation.
    pub async fn execute(&self, operation: &DdlOperation) -> Result<()> {
        let sql = self.sql_for(operation);
        debug!(sql = %sql, dialect = self.dialect.name(), "Executing SQL");

        if self.dry_run {
            println!("{};", sql);
            return Ok(());
        }

        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| WidenError::ddl(operation.description(), sql.as_str(), e))?;

        info!(
            table = %operation.table(),
            operation = %operation.description(),
            "DDL applied"
        );
        Ok(())
    }
}

#[async_trait]
impl<D: WidenDialect> DdlExecutor for SqlExecutor<D> {
    async fn drop_foreign_key(&self, table: &TableName, constraint_name: &str) -> Result<()> {
        self.execute(&DdlOperation::drop_foreign_key(
            table.clone(),
            constraint_name,
        ))
        .await
    }

    async fn widen_column(
        &self,
        table: &TableName,
        column_name: &str,
        attributes: &WidenAttributes,
    ) -> Result<()> {
        self.execute(&DdlOperation::widen_column(
            table.clone(),
            column_name,
            attributes.clone(),
        ))
        .await
    }

    async fn add_foreign_key(&self, foreign_key: &ForeignKeyConstraint) -> Result<()> {
        self.execute(&DdlOperation::add_foreign_key(foreign_key.clone()))
            .await
    }
}
