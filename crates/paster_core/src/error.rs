//! Error types for the paste store.
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Low-level failure raised by the storage backend or row encoding.
#[derive(Error, Debug)]
pub enum StorageFault {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<redb::DatabaseError> for StorageFault {
    fn from(value: redb::DatabaseError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TransactionError> for StorageFault {
    fn from(value: redb::TransactionError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TableError> for StorageFault {
    fn from(value: redb::TableError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::StorageError> for StorageFault {
    fn from(value: redb::StorageError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::CommitError> for StorageFault {
    fn from(value: redb::CommitError) -> Self {
        Self::Database(value.into())
    }
}

/// Errors surfaced by [`crate::Store`] operations.
///
/// A missing paste is never an error; lookups return `Ok(None)` instead.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage unavailable at '{}': {source}", path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: StorageFault,
    },

    #[error("Storage write failed: {0}")]
    StorageWriteFailed(#[source] StorageFault),

    #[error("Storage read failed: {0}")]
    StorageReadFailed(#[source] StorageFault),

    #[error("No unused paste id found after {attempts} attempts")]
    IdSpaceExhausted { attempts: u32 },

    #[error("Timed out after {waited:?} waiting for the write lock")]
    LockTimeout { waited: Duration },

    #[error("Store is closed")]
    StoreClosed,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl StoreError {
    pub(crate) fn write(err: impl Into<StorageFault>) -> Self {
        Self::StorageWriteFailed(err.into())
    }

    pub(crate) fn read(err: impl Into<StorageFault>) -> Self {
        Self::StorageReadFailed(err.into())
    }

    /// Whether the error belongs to the write-failure family.
    ///
    /// Id exhaustion and lock timeouts are operational write failures: the
    /// caller should report them upstream the same way.
    pub fn is_write_failure(&self) -> bool {
        matches!(
            self,
            Self::StorageWriteFailed(_) | Self::IdSpaceExhausted { .. } | Self::LockTimeout { .. }
        )
    }
}
