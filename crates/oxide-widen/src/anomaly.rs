//! Referential anomaly detection.
//!
//! A foreign key cannot be restored over data that violates it, so every
//! constraint in the work set is checked against live rows before anything
//! is dropped.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::debug;

use crate::dialect::{MysqlDialect, WidenDialect};
use crate::error::{Result, WidenError};
use crate::schema::ForeignKeyConstraint;

/// A foreign key whose existing data violates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintAnomaly {
    /// The violated constraint.
    pub constraint: ForeignKeyConstraint,
}

impl ConstraintAnomaly {
    /// Records an anomaly on `constraint`.
    #[must_use]
    pub fn new(constraint: ForeignKeyConstraint) -> Self {
        Self { constraint }
    }
}

impl fmt::Display for ConstraintAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.constraint;
        write!(
            f,
            "Anomaly on constraint {}: {}.{} references {}.{}",
            c.name, c.table, c.column, c.referenced_table, c.referenced_column
        )
    }
}

/// Checks live data for orphaned foreign key values.
#[async_trait]
pub trait AnomalyDetector: Send + Sync {
    /// Returns true iff some non-null `constraint.column` value in
    /// `constraint.table` is missing from the referenced column.
    async fn has_anomaly(&self, constraint: &ForeignKeyConstraint) -> Result<bool>;
}

/// Checks every constraint and collects all anomalies.
///
/// Does not stop at the first anomaly so the operator sees them all at once.
/// A failing query is fatal.
pub async fn find_anomalies<A>(
    detector: &A,
    constraints: &[ForeignKeyConstraint],
) -> Result<Vec<ConstraintAnomaly>>
where
    A: AnomalyDetector + ?Sized,
{
    let mut anomalies = Vec::new();
    for constraint in constraints {
        if detector.has_anomaly(constraint).await? {
            debug!(constraint = %constraint.name, table = %constraint.table, "Anomaly found");
            anomalies.push(ConstraintAnomaly::new(constraint.clone()));
        }
    }
    Ok(anomalies)
}

/// Runs the orphan check with a `NOT IN` sub-select on MySQL.
pub struct MysqlAnomalyDetector {
    pool: MySqlPool,
    dialect: MysqlDialect,
}

impl MysqlAnomalyDetector {
    /// Creates a detector over `pool`.
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            dialect: MysqlDialect::new(),
        }
    }

    /// Returns the query used for `constraint`.
    ///
    /// Uses a correlated `NOT EXISTS` so NULLs in the referenced column
    /// cannot mask orphaned values. Aliases keep self-references apart.
    #[must_use]
    pub fn anomaly_sql(&self, constraint: &ForeignKeyConstraint) -> String {
        let d = &self.dialect;
        let column = d.quote_identifier(&constraint.column);
        format!(
            "SELECT EXISTS(SELECT 1 FROM {table} AS child WHERE child.{column} IS NOT NULL \
             AND NOT EXISTS(SELECT 1 FROM {ref_table} AS parent \
             WHERE parent.{ref_column} = child.{column}))",
            table = d.quote_table(&constraint.table),
            column = column,
            ref_column = d.quote_identifier(&constraint.referenced_column),
            ref_table = d.quote_table(&constraint.referenced_table),
        )
    }
}

#[async_trait]
impl AnomalyDetector for MysqlAnomalyDetector {
    async fn has_anomaly(&self, constraint: &ForeignKeyConstraint) -> Result<bool> {
        let sql = self.anomaly_sql(constraint);
        debug!(sql = %sql, "Checking constraint data");

        let (found,): (i64,) = sqlx::query_as(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                WidenError::catalog(format!("anomaly check on {}", constraint.name), e)
            })?;

        Ok(found != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MemoryDatabase;
    use crate::schema::TableName;
    use sqlx::mysql::MySqlPoolOptions;

    fn orders_fk() -> ForeignKeyConstraint {
        ForeignKeyConstraint::new(
            "fk_orders_user",
            TableName::new("orders"),
            "user_id",
            "users",
            "id",
        )
    }

    fn items_fk() -> ForeignKeyConstraint {
        ForeignKeyConstraint::new(
            "fk_items_order",
            TableName::new("items"),
            "order_id",
            "orders",
            "id",
        )
    }

    #[test]
    fn test_anomaly_display() {
        let anomaly = ConstraintAnomaly::new(orders_fk());
        assert_eq!(
            anomaly.to_string(),
            "Anomaly on constraint fk_orders_user: orders.user_id references users.id"
        );
    }

    #[tokio::test]
    async fn test_find_anomalies_reports_all() {
        let db = MemoryDatabase::new()
            .rows("users", "id", vec![Some(1), Some(2)])
            .rows("orders", "id", vec![Some(10), Some(11)])
            .rows("orders", "user_id", vec![Some(1), Some(999)])
            .rows("items", "order_id", vec![Some(10), Some(12)]);

        let anomalies = find_anomalies(&db, &[orders_fk(), items_fk()])
            .await
            .unwrap();

        assert_eq!(anomalies.len(), 2);
        assert_eq!(anomalies[0].constraint.name, "fk_orders_user");
        assert_eq!(anomalies[1].constraint.name, "fk_items_order");
    }

    #[tokio::test]
    async fn test_nulls_are_not_anomalies() {
        let db = MemoryDatabase::new()
            .rows("users", "id", vec![Some(1)])
            .rows("orders", "user_id", vec![Some(1), None, None]);

        assert!(!db.has_anomaly(&orders_fk()).await.unwrap());
        assert!(find_anomalies(&db, &[orders_fk()]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_anomaly_sql() {
        let pool = MySqlPoolOptions::new()
            .connect_lazy("mysql://root@127.0.0.1:1/unused")
            .unwrap();
        let detector = MysqlAnomalyDetector::new(pool);

        assert_eq!(
            detector.anomaly_sql(&orders_fk()),
            "SELECT EXISTS(SELECT 1 FROM `orders` AS child WHERE child.`user_id` IS NOT NULL \
             AND NOT EXISTS(SELECT 1 FROM `users` AS parent \
             WHERE parent.`id` = child.`user_id`))"
        );
    }

    #[tokio::test]
    async fn test_anomaly_sql_self_reference_and_schema() {
        let pool = MySqlPoolOptions::new()
            .connect_lazy("mysql://root@127.0.0.1:1/unused")
            .unwrap();
        let detector = MysqlAnomalyDetector::new(pool);
        let fk = ForeignKeyConstraint::new(
            "categories_parent_id_foreign",
            TableName::qualified("shop", "categories"),
            "parent_id",
            "categories",
            "id",
        );

        let sql = detector.anomaly_sql(&fk);
        assert!(sql.contains("FROM `shop`.`categories` AS child"));
        assert!(sql.contains("FROM `shop`.`categories` AS parent"));
        assert!(sql.contains("parent.`id` = child.`parent_id`"));
        assert!(!sql.contains("NOT IN"));
    }

    #[tokio::test]
    async fn test_nulls_in_referenced_column_do_not_hide_orphans() {
        let fk = ForeignKeyConstraint::new(
            "fk_orders_legacy_user",
            TableName::new("orders"),
            "legacy_user_id",
            "users",
            "legacy_id",
        );
        let db = MemoryDatabase::new()
            .rows("users", "legacy_id", vec![Some(1), None])
            .rows("orders", "legacy_user_id", vec![Some(999)]);

        assert!(db.has_anomaly(&fk).await.unwrap());
        assert_eq!(find_anomalies(&db, &[fk]).await.unwrap().len(), 1);
    }
}
