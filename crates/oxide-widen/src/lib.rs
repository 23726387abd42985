//! Widen integer primary keys and their foreign keys to BIGINT.
//!
//! `oxide-widen` converts every integer key column of a schema (primary key
//! members and the local columns of foreign keys) to `BIGINT UNSIGNED`
//! while keeping nullability, defaults, auto-increment and foreign key
//! actions exactly as they were.
//!
//! # Architecture
//!
//! - **Catalog** - Reads tables, keys and integer columns ([`SchemaCatalog`])
//! - **Classifier** - Reduces the snapshot to a [`WorkSet`]
//! - **Anomaly detection** - Refuses to run when data violates a foreign key
//! - **Transformer** - Drops constraints, widens columns, restores constraints
//! - **Executor** - Applies each DDL operation ([`DdlExecutor`])
//! - **Dialect** - Database-specific SQL generation
//! - **Progress** - One line per step through a [`ProgressSink`]
//!
//! # Example
//!
//! ```rust,ignore
//! use oxide_widen::prelude::*;
//! use sqlx::mysql::MySqlPoolOptions;
//!
//! let pool = MySqlPoolOptions::new()
//!     .max_connections(1)
//!     .connect("mysql://root@localhost/shop")
//!     .await?;
//!
//! let mut transformer = WidenOptions::new().mysql_transformer(pool, ConsoleSink);
//! let report = transformer.transform(None).await?;
//! println!("Widened {} columns", report.columns_widened);
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Show what would change
//! oxide-widen plan --database shop
//!
//! # Print the DDL without running it
//! oxide-widen transform --database shop --dry-run
//!
//! # Widen the key columns
//! oxide-widen transform --database shop
//! ```

pub mod anomaly;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod ddl;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod mock;
pub mod operations;
pub mod progress;
pub mod schema;
pub mod transformer;

pub use anomaly::{AnomalyDetector, ConstraintAnomaly};
pub use catalog::SchemaCatalog;
pub use classifier::WorkSet;
pub use ddl::DdlExecutor;
pub use error::{Result, WidenError};
pub use progress::ProgressSink;
pub use transformer::{MigrationPlan, Phase, TransformReport, Transformer};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::anomaly::{
        find_anomalies, AnomalyDetector, ConstraintAnomaly, MysqlAnomalyDetector,
    };
    pub use crate::catalog::{
        introspect, CatalogKind, MysqlCreateTableCatalog, MysqlInformationSchemaCatalog,
        SchemaCatalog,
    };
    pub use crate::classifier::{classify_table, WorkSet};
    pub use crate::config::WidenOptions;
    pub use crate::ddl::DdlExecutor;
    pub use crate::dialect::{MysqlDialect, WidenDialect};
    pub use crate::error::{Result, WidenError};
    pub use crate::executor::SqlExecutor;
    pub use crate::operations::DdlOperation;
    pub use crate::progress::{ConsoleSink, ProgressSink, Severity, TracingSink};
    pub use crate::schema::{
        DefaultValue, ForeignKeyAction, ForeignKeyConstraint, IntegerColumn, IntegerType,
        SchemaSnapshot, TableName, TableSnapshot, WidenAttributes,
    };
    pub use crate::transformer::{MigrationPlan, Phase, TransformReport, Transformer};
}
