//! Error types for sqlkit.

use thiserror::Error;

/// Core error type for expression construction, schema lookups, and facade
/// operations.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The expression factory received a value it cannot coerce to a typed
    /// literal (an object, an array, an explicit NULL passed to `expr()`).
    #[error("invalid literal: {0}")]
    InvalidLiteral(String),

    /// An operator or CASE branch was applied to operands of incompatible
    /// SQL types.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// `Select::as_subquery` was asked for an alias that was never bound by
    /// a `select()`/`pass_through()` call.
    #[error("no projection bound to alias `{0}`")]
    MissingProjection(String),

    /// `Select::from`/`join` or `Schema::get_*_sql` referenced a table the
    /// schema does not declare.
    #[error("unknown table `{0}`")]
    UnknownTable(String),

    /// A join predicate or projection referenced a column the table does
    /// not declare.
    #[error("unknown column `{1}` on table `{0}`")]
    UnknownColumn(String, String),

    /// Propagated from the underlying SQLite driver.
    #[error("driver error: {0}")]
    Driver(#[from] rusqlite::Error),
}

/// Result type for sqlkit operations.
pub type Result<T> = core::result::Result<T, QueryError>;
