//! Error taxonomy for a generation run.
//!
//! Every failure is fatal to the run: a run either produces every artifact
//! or none. The variant identifies the offending table, column or edge.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for generation operations.
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Errors that can occur while reading the catalog or building artifacts.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// The metadata source could not be reached or did not answer in time.
    #[error("catalog unavailable during {operation}: {reason}")]
    CatalogUnavailable {
        /// Catalog operation that failed (e.g. `columns_of(book)`).
        operation: String,
        /// Underlying cause.
        reason: String,
    },

    /// A referenced table or column does not exist in the catalog.
    #[error("{}", schema_not_found_message(.table, .column.as_deref()))]
    SchemaNotFound {
        /// Table that was looked up.
        table: String,
        /// Column that was looked up, if the lookup was column-scoped.
        column: Option<String>,
    },

    /// A foreign key points at a table outside the known table set.
    #[error(
        "dangling reference: {table}.{column} -> {target_table} (constraint {constraint}) targets an unknown table"
    )]
    DanglingReference {
        /// Table owning the foreign key.
        table: String,
        /// Foreign key column.
        column: String,
        /// Referenced table that does not exist.
        target_table: String,
        /// Constraint name reported by the catalog.
        constraint: String,
    },

    /// Engine misuse, e.g. writing to a sealed registry.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The run was cancelled; nothing was recorded for `table`.
    #[error("generation cancelled at table '{table}'")]
    Cancelled {
        /// Table that was about to be (or being) processed.
        table: String,
    },

    /// Writing an artifact failed.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

fn schema_not_found_message(table: &str, column: Option<&str>) -> String {
    match column {
        Some(column) => format!("column '{}.{}' not found in catalog", table, column),
        None => format!("table '{}' not found in catalog", table),
    }
}

impl GenerateError {
    /// Create a catalog-unavailable error.
    pub fn unavailable(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::CatalogUnavailable {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a table-scoped not-found error.
    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::SchemaNotFound {
            table: table.into(),
            column: None,
        }
    }

    /// Create a column-scoped not-found error.
    pub fn column_not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::SchemaNotFound {
            table: table.into(),
            column: Some(column.into()),
        }
    }

    /// Check if this error is retriable.
    ///
    /// Only connectivity failures are; a missing table stays missing.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::CatalogUnavailable { .. })
    }
}
