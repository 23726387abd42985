//! Error types for the widening engine.

use crate::anomaly::ConstraintAnomaly;

/// Errors that can occur while widening key columns.
#[derive(Debug, thiserror::Error)]
pub enum WidenError {
    /// Introspection failed (connection, permission or parse failure).
    ///
    /// Raised before any mutation, so the schema is untouched.
    #[error("Catalog error ({context}): {message}")]
    Catalog {
        /// What was being read (table, query, statement).
        context: String,
        /// Underlying failure.
        message: String,
    },

    /// Existing data violates one or more foreign keys.
    #[error("Aborted, foreign key anomalies found ({}):\n{}",
        .0.len(),
        .0.iter().map(|a| format!("  - {}", a)).collect::<Vec<_>>().join("\n"))]
    ConstraintAnomalies(Vec<ConstraintAnomaly>),

    /// A DDL statement failed mid-run. Nothing is rolled back.
    #[error("DDL failed on {operation}: {message}\n  Statement: {statement}")]
    Ddl {
        /// Description of the operation, naming table and column/constraint.
        operation: String,
        /// The statement that was sent.
        statement: String,
        /// Error reported by the database.
        message: String,
    },

    /// Database error outside of introspection and DDL (e.g. connecting).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WidenError {
    /// Creates a Catalog error with context about what was being read.
    pub fn catalog(context: impl Into<String>, message: impl ToString) -> Self {
        WidenError::Catalog {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Creates a Ddl error.
    pub fn ddl(
        operation: impl Into<String>,
        statement: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        WidenError::Ddl {
            operation: operation.into(),
            statement: statement.into(),
            message: message.to_string(),
        }
    }

    /// Returns true when the run stopped before any mutation.
    #[must_use]
    pub fn is_clean_abort(&self) -> bool {
        matches!(
            self,
            WidenError::Catalog { .. } | WidenError::ConstraintAnomalies(_)
        )
    }
}

/// Result type for widening operations.
pub type Result<T> = std::result::Result<T, WidenError>;
