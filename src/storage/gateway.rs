//! Persistence Gateway
//!
//! Every Store operation opens its own connection through [`Database::connect`],
//! uses it, and drops it before returning. There is no pool: the cost of an
//! open is paid per operation, and a connection never outlives the call that
//! acquired it.

use crate::storage::error::{StoreError, StoreResult};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{trace, warn};

/// Default time a connection waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the SQLite database file.
///
/// Cloning is cheap; clones refer to the same file.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Database {
    /// Creates a handle for the database at `path` with the default busy timeout.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_busy_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Creates a handle with an explicit busy timeout.
    pub fn with_busy_timeout(path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            busy_timeout,
        }
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a new connection with foreign keys enforced.
    ///
    /// The connection closes when the returned value is dropped.
    pub fn connect(&self) -> StoreResult<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&self.path, flags).map_err(|source| {
            StoreError::Connect {
                path: self.path.clone(),
                source,
            }
        })?;

        conn.busy_timeout(self.busy_timeout)
            .and_then(|_| conn.execute_batch("PRAGMA foreign_keys = ON;"))
            .map_err(|source| StoreError::Connect {
                path: self.path.clone(),
                source,
            })?;

        trace!(path = %self.path.display(), "Opened database connection");
        Ok(conn)
    }
}

/// Converts the outcome of a Store routine into its plain result.
///
/// Failures are logged here and replaced by `fallback`, so callers only ever
/// see `false`, `None` or an empty list.
pub(crate) fn recover<T>(operation: &'static str, result: StoreResult<T>, fallback: T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(operation, error = %e, "Store operation failed");
            fallback
        }
    }
}
