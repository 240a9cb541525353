//! Error types for table construction and operations.
//!
//! Every error is raised synchronously at the offending call and is
//! deterministic for a given input; there are no transient failure modes.
//! Operations fail atomically: on error no partially-built table escapes.

use thiserror::Error;

/// All errors produced by exactable operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    /// A raw value could not be interpreted as the requested column type.
    #[error("cannot cast '{value}' to {target}")]
    Cast { value: String, target: &'static str },

    /// A cell failed to cast during table construction or `compute`.
    #[error("cannot cast '{value}' to {target} (row {row}, column '{column}')")]
    CellCast {
        value: String,
        target: &'static str,
        row: usize,
        column: String,
    },

    /// A column name collided with an existing column.
    #[error("column '{0}' already exists")]
    ColumnExists(String),

    /// A referenced column name is not part of the table.
    #[error("column '{0}' does not exist")]
    ColumnDoesNotExist(String),

    /// A numeric statistic was requested on a non-Number column.
    #[error("column '{column}' is {actual}, expected Number")]
    TypeMismatch { column: String, actual: &'static str },

    /// A statistic was requested on a column with zero non-null values.
    #[error("column '{0}' has no non-null values")]
    EmptyColumn(String),

    /// A ratio operation hit a zero denominator.
    #[error("division by zero at row {row}")]
    DivisionByZero { row: usize },

    /// Column types and column names disagree on count.
    #[error("expected {expected} column types, got {actual}")]
    SchemaLength { expected: usize, actual: usize },

    /// A row does not have exactly one cell per column.
    #[error("row {row} has {actual} cells, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// `limit` was called with a step of zero.
    #[error("step must be positive")]
    ZeroStep,

    /// JSON serialization or parsing failed.
    #[error("JSON error: {0}")]
    Json(String),
}

/// Result type for all exactable operations.
pub type Result<T> = std::result::Result<T, TableError>;
