//! Progress output.
//!
//! The transformer reports one human-readable line per step through an
//! injected [`ProgressSink`]. Sinks never fail: a sink that cannot write
//! simply drops the line.

use std::io::Write;

use serde::{Deserialize, Serialize};

/// Severity of a progress line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Normal progress.
    Info,
    /// A finding or failure the operator must see.
    Error,
}

/// Receives progress lines from the transformer.
pub trait ProgressSink: Send + Sync {
    /// Emits one line. Must not panic and must not block the migration.
    fn emit(&self, message: &str, severity: Severity);

    /// Emits an informational line.
    fn info(&self, message: &str) {
        self.emit(message, Severity::Info);
    }

    /// Emits an error line.
    fn error(&self, message: &str) {
        self.emit(message, Severity::Error);
    }
}

/// Writes info lines to stdout and error lines to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn emit(&self, message: &str, severity: Severity) {
        // Broken pipes are ignored.
        let _ = match severity {
            Severity::Info => writeln!(std::io::stdout().lock(), "{}", message),
            Severity::Error => writeln!(std::io::stderr().lock(), "{}", message),
        };
    }
}

/// Forwards lines to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn emit(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => tracing::info!("{}", message),
            Severity::Error => tracing::error!("{}", message),
        }
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for &S {
    fn emit(&self, message: &str, severity: Severity) {
        (**self).emit(message, severity);
    }
}
