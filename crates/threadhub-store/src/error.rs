use rusqlite::ErrorCode;
use thiserror::Error;

use crate::models::ScopePolicy;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// An insert collided with a unique index.
    #[error("Record conflicts with an existing record")]
    Conflict,

    /// The running statement was interrupted from another thread.
    #[error("Operation interrupted")]
    Interrupted,

    /// The database was created under a different default-scope policy.
    #[error("Scope policy mismatch: database uses {stored}, requested {requested}")]
    ScopePolicyMismatch {
        stored: ScopePolicy,
        requested: ScopePolicy,
    },

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A stored value could not be decoded.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether this error was caused by `sqlite3_interrupt`.
    pub fn is_interrupted(&self) -> bool {
        match self {
            StoreError::Interrupted => true,
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(code, _)) => {
                code.code == ErrorCode::OperationInterrupted
            }
            _ => false,
        }
    }
}

/// Map a failed insert onto `Conflict` when a unique index rejected it.
pub(crate) fn map_insert_error(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(code, _) if code.code == ErrorCode::ConstraintViolation => {
            StoreError::Conflict
        }
        rusqlite::Error::SqliteFailure(code, _) if code.code == ErrorCode::OperationInterrupted => {
            StoreError::Interrupted
        }
        other => StoreError::Sqlite(other),
    }
}

/// Map a failed single-row query, folding "no rows" into `NotFound`.
pub(crate) fn map_query_error(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        rusqlite::Error::SqliteFailure(code, _) if code.code == ErrorCode::OperationInterrupted => {
            StoreError::Interrupted
        }
        other => StoreError::Sqlite(other),
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
