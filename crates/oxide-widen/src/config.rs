//! Run configuration and wiring.

use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;

use crate::anomaly::MysqlAnomalyDetector;
use crate::catalog::{
    CatalogKind, MysqlCreateTableCatalog, MysqlInformationSchemaCatalog, SchemaCatalog,
};
use crate::dialect::MysqlDialect;
use crate::executor::SqlExecutor;
use crate::progress::ProgressSink;
use crate::transformer::Transformer;

/// Options for one widening run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidenOptions {
    /// Schema to transform, `None` for the connection default.
    pub schema: Option<String>,
    /// Catalog backend.
    pub catalog: CatalogKind,
    /// Print DDL instead of executing it.
    pub dry_run: bool,
}

impl WidenOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scopes the run to `schema`.
    #[must_use]
    pub fn schema(mut self, schema: Option<String>) -> Self {
        self.schema = schema;
        self
    }

    /// Selects the catalog backend.
    #[must_use]
    pub fn catalog(mut self, catalog: CatalogKind) -> Self {
        self.catalog = catalog;
        self
    }

    /// Enables dry-run mode.
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Builds a MySQL transformer over `pool`, reporting to `sink`.
    pub fn mysql_transformer(
        &self,
        pool: MySqlPool,
        sink: impl ProgressSink + 'static,
    ) -> Transformer {
        let catalog: Box<dyn SchemaCatalog> = match self.catalog {
            CatalogKind::CreateTable => Box::new(MysqlCreateTableCatalog::new(pool.clone())),
            CatalogKind::InformationSchema => {
                Box::new(MysqlInformationSchemaCatalog::new(pool.clone()))
            }
        };

        Transformer::from_boxed(
            catalog,
            Box::new(MysqlAnomalyDetector::new(pool.clone())),
            Box::new(SqlExecutor::new(pool, MysqlDialect::new()).dry_run(self.dry_run)),
            Box::new(sink),
        )
    }
}
