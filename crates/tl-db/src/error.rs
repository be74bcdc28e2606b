//! Error types for tl-db

use std::time::Duration;
use thiserror::Error;
use tl_core::Direction;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection could not be opened (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionFailure(String),

    /// Statement execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// A migration script failed; earlier scripts of the batch stay applied (D003)
    #[error("[D003] Migration {identifier} ({direction}) failed: {message}")]
    MigrationScriptFailure {
        version: i64,
        identifier: String,
        direction: Direction,
        message: String,
    },

    /// The backend reports a version that has no script in the directory (D004)
    #[error("[D004] No migration script found for applied version {version}")]
    MissingMigration { version: i64 },

    /// Deadline passed while talking to the backend (D005)
    #[error("[D005] Deadline of {budget:?} exceeded during {operation}")]
    DeadlineExceeded { budget: Duration, operation: String },

    /// Connection already released (D006)
    #[error("[D006] Database connection is closed")]
    ConnectionClosed,

    /// Mutex poisoned (D007)
    #[error("[D007] Database mutex poisoned: {0}")]
    MutexPoisoned(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::ExecutionError(err.to_string())
    }
}
