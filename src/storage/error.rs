//! Error type shared by the Stores.

use std::path::PathBuf;

/// Errors raised inside a Store operation.
///
/// These never leave the storage module through the public Store methods.
/// They are logged and turned into `false`, `None` or an empty list there.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database file could not be opened or configured.
    #[error("failed to open database {}: {source}", path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A statement or transaction failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The account may never be deleted.
    #[error("account '{0}' is protected")]
    ProtectedAccount(String),
}

impl StoreError {
    /// Returns true when the error is a UNIQUE, PRIMARY KEY or FOREIGN KEY
    /// constraint violation.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            StoreError::Database(rusqlite::Error::SqliteFailure(err, _)) => {
                err.code == rusqlite::ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }
}

/// Result type for the fallible inner Store routines.
pub type StoreResult<T> = Result<T, StoreError>;
