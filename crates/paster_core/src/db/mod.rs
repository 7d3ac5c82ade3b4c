//! Paste store backed by a single redb file.

/// Insert, lookup and listing operations.
pub mod paste;
/// Expiration sweep and the background sweeper.
pub mod sweep;
/// Table definitions.
pub mod tables;

mod time_util;

pub use sweep::{SweepReport, Sweeper, SweeperHandle};

use self::tables::{PASTES, PASTES_BY_CREATED, PASTES_BY_EXPIRY, RETIRED_IDS, STORE_META};
use crate::clock::{Clock, SystemClock};
use crate::constants::DEFAULT_LOCK_TIMEOUT;
use crate::error::{StorageFault, StoreError};
use crate::naming::IdPolicy;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Pause between attempts to open a file another owner still holds.
const OPEN_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Tunables for a [`Store`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    lock_timeout: Duration,
    id_policy: IdPolicy,
    clock: Arc<dyn Clock>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            id_policy: IdPolicy::default(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl StoreOptions {
    /// How long writers (and `open`) wait for the exclusive lock.
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Id alphabet, length and collision retry bound.
    pub fn with_id_policy(mut self, id_policy: IdPolicy) -> Self {
        self.id_policy = id_policy;
        self
    }

    /// Time source for `created_at` and expiry checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Configured lock-wait budget.
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Configured id policy.
    pub fn id_policy(&self) -> &IdPolicy {
        &self.id_policy
    }
}

/// State shared by every handle opened over the same file.
struct Shared {
    db: redb::Database,
    /// Serializes writers so waits are bounded by `lock_timeout`.
    writer: Mutex<()>,
    options: StoreOptions,
}

impl Shared {
    fn lock_writer(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        let budget = self.options.lock_timeout;
        self.writer.try_lock_for(budget).ok_or_else(|| {
            tracing::warn!(waited_ms = budget.as_millis() as u64, "write lock not acquired");
            StoreError::LockTimeout { waited: budget }
        })
    }
}

/// Handle to the paste store.
///
/// A store is either open or closed. Every operation other than
/// [`Store::close`] fails with [`StoreError::StoreClosed`] once the handle is
/// closed. Use [`Store::share`] to give another subsystem (for example the
/// background sweeper) its own handle over the same file.
pub struct Store {
    path: PathBuf,
    shared: RwLock<Option<Arc<Shared>>>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Store {
    /// Open (creating if absent) the store at `path` with default options.
    ///
    /// # Errors
    /// Returns [`StoreError::StorageUnavailable`] when the file cannot be
    /// opened or the schema cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with(path, StoreOptions::default())
    }

    /// Open the store at `path` with explicit options.
    ///
    /// If another owner holds the file, opening is retried until the lock
    /// budget runs out.
    ///
    /// # Errors
    /// Returns [`StoreError::StorageUnavailable`] when the file cannot be
    /// opened or the schema cannot be created.
    pub fn open_with(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        tracing::info!(path = %path.display(), "opening paste store");

        let db = open_database(&path, options.lock_timeout)
            .map_err(|source| Self::unavailable(&path, source))?;
        init_schema(&db).map_err(|source| Self::unavailable(&path, source))?;

        Ok(Self {
            path,
            shared: RwLock::new(Some(Arc::new(Shared {
                db,
                writer: Mutex::new(()),
                options,
            }))),
        })
    }

    fn unavailable(path: &Path, source: StorageFault) -> StoreError {
        tracing::warn!(path = %path.display(), error = %source, "paste store unavailable");
        StoreError::StorageUnavailable {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create another open handle over the same database file.
    ///
    /// The new handle shares the writer lock and has its own open/closed
    /// state; the file is released once every handle is closed or dropped.
    ///
    /// # Errors
    /// Returns [`StoreError::StoreClosed`] when this handle is closed.
    pub fn share(&self) -> Result<Self, StoreError> {
        let shared = self.shared()?;
        Ok(Self {
            path: self.path.clone(),
            shared: RwLock::new(Some(shared)),
        })
    }

    /// Close this handle. Closing twice is a no-op.
    pub fn close(&self) -> Result<(), StoreError> {
        if self.shared.write().take().is_some() {
            tracing::debug!(path = %self.path.display(), "closing paste store handle");
        }
        Ok(())
    }

    /// Whether this handle is still open.
    pub fn is_open(&self) -> bool {
        self.shared.read().is_some()
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn shared(&self) -> Result<Arc<Shared>, StoreError> {
        self.shared
            .read()
            .as_ref()
            .cloned()
            .ok_or(StoreError::StoreClosed)
    }
}

fn open_database(path: &Path, wait: Duration) -> Result<redb::Database, StorageFault> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let deadline = Instant::now() + wait;
    loop {
        match redb::Database::create(path) {
            Ok(db) => return Ok(db),
            Err(redb::DatabaseError::DatabaseAlreadyOpen) if Instant::now() < deadline => {
                thread::sleep(OPEN_RETRY_INTERVAL);
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn init_schema(db: &redb::Database) -> Result<(), StorageFault> {
    let write_txn = db.begin_write()?;
    write_txn.open_table(PASTES)?;
    write_txn.open_table(PASTES_BY_CREATED)?;
    write_txn.open_table(PASTES_BY_EXPIRY)?;
    write_txn.open_table(RETIRED_IDS)?;
    write_txn.open_table(STORE_META)?;
    write_txn.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests;
