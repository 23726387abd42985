//! In-memory collaborators for testing.
//!
//! These stand in for a live database so the transformer can be exercised
//! end to end:
//!
//! - [`MemoryCatalog`] serves predefined table snapshots.
//! - [`MemoryDatabase`] holds column values and answers anomaly checks.
//! - [`RecordingExecutor`] records DDL calls instead of running them.
//! - [`RecordingSink`] keeps every progress line.
//!
//! Recorders share their state between clones, so a test can hand one clone
//! to the transformer and inspect the other afterwards.
//!
//! ```rust,ignore
//! let executor = RecordingExecutor::new();
//! let sink = RecordingSink::new();
//! let mut transformer = Transformer::new(catalog, MemoryDatabase::new(), executor.clone(), sink.clone());
//! transformer.transform(None).await?;
//! assert_eq!(sink.messages()[0], "Drop foreign on orders.user_id");
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::anomaly::AnomalyDetector;
use crate::catalog::SchemaCatalog;
use crate::ddl::DdlExecutor;
use crate::error::{Result, WidenError};
use crate::progress::{ProgressSink, Severity};
use crate::schema::{
    ForeignKeyConstraint, IntegerColumn, TableName, TableSnapshot, WidenAttributes,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Catalog serving predefined table snapshots, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    tables: Vec<TableSnapshot>,
    failing_tables: HashSet<String>,
    fail_listing: bool,
}

impl MemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table.
    #[must_use]
    pub fn table(mut self, table: TableSnapshot) -> Self {
        self.tables.push(table);
        self
    }

    /// Makes every read of `table` fail.
    #[must_use]
    pub fn fail_on(mut self, table: impl Into<String>) -> Self {
        self.failing_tables.insert(table.into());
        self
    }

    /// Makes listing tables fail, as if the connection were down.
    #[must_use]
    pub fn with_listing_failure(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    fn get(&self, table: &TableName) -> Result<&TableSnapshot> {
        if self.failing_tables.contains(&table.name) {
            return Err(WidenError::catalog(
                format!("reading {}", table),
                "simulated failure",
            ));
        }
        self.tables
            .iter()
            .find(|t| t.name == *table)
            .ok_or_else(|| WidenError::catalog(format!("reading {}", table), "no such table"))
    }
}

#[async_trait]
impl SchemaCatalog for MemoryCatalog {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list_tables(&self, _schema: Option<&str>) -> Result<Vec<TableName>> {
        if self.fail_listing {
            return Err(WidenError::catalog("listing tables", "connection refused"));
        }
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn primary_key_columns(&self, table: &TableName) -> Result<Vec<String>> {
        Ok(self.get(table)?.primary_key.clone())
    }

    async fn foreign_key_constraints(&self, table: &TableName) -> Result<Vec<ForeignKeyConstraint>> {
        Ok(self.get(table)?.foreign_keys.clone())
    }

    async fn integer_columns(&self, table: &TableName) -> Result<Vec<IntegerColumn>> {
        Ok(self.get(table)?.integer_columns.clone())
    }
}

/// Column values keyed by table and column name.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    values: HashMap<(String, String), Vec<Option<i64>>>,
    failing_constraints: HashSet<String>,
}

impl MemoryDatabase {
    /// Creates an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the values stored in `table.column`.
    #[must_use]
    pub fn rows(
        mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        values: Vec<Option<i64>>,
    ) -> Self {
        self.values.insert((table.into(), column.into()), values);
        self
    }

    /// Makes the check of `constraint` fail.
    #[must_use]
    pub fn fail_on(mut self, constraint: impl Into<String>) -> Self {
        self.failing_constraints.insert(constraint.into());
        self
    }

    fn column(&self, table: &TableName, column: &str) -> &[Option<i64>] {
        self.values
            .get(&(table.name.clone(), column.to_string()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[async_trait]
impl AnomalyDetector for MemoryDatabase {
    async fn has_anomaly(&self, constraint: &ForeignKeyConstraint) -> Result<bool> {
        if self.failing_constraints.contains(&constraint.name) {
            return Err(WidenError::catalog(
                format!("anomaly check on {}", constraint.name),
                "simulated failure",
            ));
        }

        let referenced: HashSet<i64> = self
            .column(&constraint.referenced_table, &constraint.referenced_column)
            .iter()
            .flatten()
            .copied()
            .collect();

        Ok(self
            .column(&constraint.table, &constraint.column)
            .iter()
            .flatten()
            .any(|value| !referenced.contains(value)))
    }
}

/// A DDL call captured by [`RecordingExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdlCall {
    /// `drop_foreign_key`.
    DropForeignKey {
        /// Table.
        table: TableName,
        /// Constraint name.
        name: String,
    },
    /// `widen_column`.
    Widen {
        /// Table.
        table: TableName,
        /// Column name.
        column: String,
        /// Attributes passed along.
        attributes: WidenAttributes,
    },
    /// `add_foreign_key`.
    AddForeignKey(ForeignKeyConstraint),
}

/// Executor that records calls instead of running them.
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    calls: Arc<Mutex<Vec<DdlCall>>>,
    fail_widen: Option<(String, String)>,
    fail_add: Option<String>,
}

impl RecordingExecutor {
    /// Creates an executor that accepts every call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails (after recording) the widening of `table.column`.
    #[must_use]
    pub fn fail_on_widen(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.fail_widen = Some((table.into(), column.into()));
        self
    }

    /// Fails (after recording) the restore of constraint `name`.
    #[must_use]
    pub fn fail_on_add(mut self, name: impl Into<String>) -> Self {
        self.fail_add = Some(name.into());
        self
    }

    /// Returns every call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<DdlCall> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: DdlCall) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl DdlExecutor for RecordingExecutor {
    async fn drop_foreign_key(&self, table: &TableName, constraint_name: &str) -> Result<()> {
        self.record(DdlCall::DropForeignKey {
            table: table.clone(),
            name: constraint_name.to_string(),
        });
        Ok(())
    }

    async fn widen_column(
        &self,
        table: &TableName,
        column_name: &str,
        attributes: &WidenAttributes,
    ) -> Result<()> {
        self.record(DdlCall::Widen {
            table: table.clone(),
            column: column_name.to_string(),
            attributes: attributes.clone(),
        });

        match &self.fail_widen {
            Some((t, c)) if *t == table.name && c == column_name => Err(WidenError::ddl(
                format!("Widen column '{}' in table '{}'", column_name, table),
                "<recorded>",
                "simulated failure",
            )),
            _ => Ok(()),
        }
    }

    async fn add_foreign_key(&self, foreign_key: &ForeignKeyConstraint) -> Result<()> {
        self.record(DdlCall::AddForeignKey(foreign_key.clone()));

        match &self.fail_add {
            Some(name) if *name == foreign_key.name => Err(WidenError::ddl(
                format!("Add foreign key '{}'", foreign_key.name),
                "<recorded>",
                "simulated failure",
            )),
            _ => Ok(()),
        }
    }
}

/// Sink that keeps every line.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<(String, Severity)>>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every line with its severity.
    #[must_use]
    pub fn lines(&self) -> Vec<(String, Severity)> {
        lock(&self.lines).clone()
    }

    /// Returns every line's text.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|(m, _)| m).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, message: &str, severity: Severity) {
        lock(&self.lines).push((message.to_string(), severity));
    }
}
