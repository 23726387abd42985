//! The widening transformer.
//!
//! Runs the whole migration for one schema:
//!
//! 1. Introspect the schema and classify key columns.
//! 2. Check every foreign key in the work set against live data. Any
//!    anomaly aborts the run before a single statement is issued.
//! 3. Drop all foreign key constraints of the work set.
//! 4. Change INT to BIGINT on every key column.
//! 5. Restore all foreign key constraints, in the order they were dropped.
//!
//! DDL is not transactional on the supported engines. A failure during
//! steps 3 to 5 stops the run and leaves the schema where it is; re-running
//! starts again from a fresh introspection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::anomaly::{find_anomalies, AnomalyDetector, ConstraintAnomaly};
use crate::catalog::{introspect, SchemaCatalog};
use crate::classifier::WorkSet;
use crate::ddl::DdlExecutor;
use crate::error::{Result, WidenError};
use crate::progress::ProgressSink;

/// Where a transformer is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Reading the schema.
    Introspecting,
    /// Checking foreign key data.
    Validating,
    /// Stopped after validation; nothing was changed.
    Aborted,
    /// Dropping foreign keys.
    DroppingConstraints,
    /// Altering key columns.
    WideningColumns,
    /// Re-adding foreign keys.
    RestoringConstraints,
    /// Finished.
    Done,
}

/// What a run would do, computed without touching the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationPlan {
    /// Schema selector the plan was computed for.
    pub schema: Option<String>,
    /// Number of tables introspected.
    pub tables_scanned: usize,
    /// Columns and constraints to act on.
    pub work: WorkSet,
    /// Foreign keys whose data would prevent restoring them.
    pub anomalies: Vec<ConstraintAnomaly>,
}

impl MigrationPlan {
    /// Returns true if the plan can be carried out.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformReport {
    /// Schema selector the run was scoped to.
    pub schema: Option<String>,
    /// Number of tables introspected.
    pub tables_scanned: usize,
    /// Foreign keys dropped.
    pub constraints_dropped: usize,
    /// Columns widened.
    pub columns_widened: usize,
    /// Foreign keys restored.
    pub constraints_restored: usize,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

/// Drives introspection, validation and the three DDL passes.
pub struct Transformer {
    catalog: Box<dyn SchemaCatalog>,
    detector: Box<dyn AnomalyDetector>,
    executor: Box<dyn DdlExecutor>,
    sink: Box<dyn ProgressSink>,
    phase: Phase,
}

impl Transformer {
    /// Creates a transformer from its collaborators.
    pub fn new(
        catalog: impl SchemaCatalog + 'static,
        detector: impl AnomalyDetector + 'static,
        executor: impl DdlExecutor + 'static,
        sink: impl ProgressSink + 'static,
    ) -> Self {
        Self::from_boxed(
            Box::new(catalog),
            Box::new(detector),
            Box::new(executor),
            Box::new(sink),
        )
    }

    /// Creates a transformer from already boxed collaborators.
    pub fn from_boxed(
        catalog: Box<dyn SchemaCatalog>,
        detector: Box<dyn AnomalyDetector>,
        executor: Box<dyn DdlExecutor>,
        sink: Box<dyn ProgressSink>,
    ) -> Self {
        Self {
            catalog,
            detector,
            executor,
            sink,
            phase: Phase::Introspecting,
        }
    }

    /// Returns the phase reached by the last run.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "Phase transition");
        self.phase = phase;
    }

    /// Introspects and validates without changing anything.
    pub async fn plan(&mut self, schema: Option<&str>) -> Result<MigrationPlan> {
        self.enter(Phase::Introspecting);
        let snapshot = introspect(self.catalog.as_ref(), schema).await?;
        let work = WorkSet::from_snapshot(&snapshot);
        info!(
            columns = work.columns.len(),
            constraints = work.constraints.len(),
            "Work set classified"
        );

        self.enter(Phase::Validating);
        let anomalies = find_anomalies(self.detector.as_ref(), &work.constraints).await?;

        Ok(MigrationPlan {
            schema: schema.map(str::to_string),
            tables_scanned: snapshot.tables.len(),
            work,
            anomalies,
        })
    }

    /// Widens every integer key column of `schema` (or the default schema).
    ///
    /// Returns [`WidenError::ConstraintAnomalies`] without issuing any DDL
    /// when existing data violates a foreign key of the work set.
    pub async fn transform(&mut self, schema: Option<&str>) -> Result<TransformReport> {
        let started_at = Utc::now();
        let plan = self.plan(schema).await?;

        if !plan.is_clean() {
            for anomaly in &plan.anomalies {
                self.sink.error(&anomaly.to_string());
            }
            self.enter(Phase::Aborted);
            return Err(WidenError::ConstraintAnomalies(plan.anomalies));
        }

        let work = plan.work;

        self.enter(Phase::DroppingConstraints);
        for fk in &work.constraints {
            self.sink
                .info(&format!("Drop foreign on {}.{}", fk.table, fk.column));
            self.executor
                .drop_foreign_key(&fk.table, &fk.name)
                .await
                .inspect_err(|e| error!(phase = ?Phase::DroppingConstraints, error = %e, "DDL failed"))?;
        }

        self.enter(Phase::WideningColumns);
        for column in &work.columns {
            self.sink.info(&format!(
                "Change INT to BIGINT for {}.{}",
                column.table, column.name
            ));
            self.executor
                .widen_column(&column.table, &column.name, &column.attributes())
                .await
                .inspect_err(|e| error!(phase = ?Phase::WideningColumns, error = %e, "DDL failed"))?;
        }

        self.enter(Phase::RestoringConstraints);
        for fk in &work.constraints {
            self.sink
                .info(&format!("Restore foreign on {}.{}", fk.table, fk.column));
            self.executor
                .add_foreign_key(fk)
                .await
                .inspect_err(|e| error!(phase = ?Phase::RestoringConstraints, error = %e, "DDL failed"))?;
        }

        self.enter(Phase::Done);
        let report = TransformReport {
            schema: plan.schema,
            tables_scanned: plan.tables_scanned,
            constraints_dropped: work.constraints.len(),
            columns_widened: work.columns.len(),
            constraints_restored: work.constraints.len(),
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            columns = report.columns_widened,
            constraints = report.constraints_restored,
            "Key columns widened"
        );

        Ok(report)
    }
}
