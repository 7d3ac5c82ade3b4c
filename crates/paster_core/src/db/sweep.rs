//! Expiration sweep and its background runner.

use super::paste::StoredPaste;
use super::tables::{PASTES, PASTES_BY_CREATED, PASTES_BY_EXPIRY, RETIRED_IDS};
use super::time_util::unix_millis;
use super::{Store, StoreOptions};
use crate::error::{StorageFault, StoreError};
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use redb::{ReadableTable, WriteTransaction};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Rows deleted because `now - created_at >= duration`.
    pub deleted: usize,
}

impl Store {
    /// Delete every expired paste in one transaction.
    ///
    /// Running it with nothing expired is a no-op. This is the only operation
    /// that removes rows.
    ///
    /// # Errors
    /// - [`StoreError::LockTimeout`] when the writer lock is not acquired in time.
    /// - [`StoreError::StorageWriteFailed`] when the transaction fails.
    /// - [`StoreError::StoreClosed`] when the handle is closed.
    pub fn sweep(&self) -> Result<SweepReport, StoreError> {
        let shared = self.shared()?;
        let _writer = shared.lock_writer()?;
        let now = shared.options.clock.now();

        let write_txn = shared.db.begin_write().map_err(StoreError::write)?;
        let deleted = match delete_expired(&write_txn, now) {
            Ok(deleted) => deleted,
            Err(err) => {
                if let Err(abort_err) = write_txn.abort() {
                    tracing::warn!(error = %abort_err, "failed to abort sweep");
                }
                tracing::warn!(error = %err, "sweep rolled back");
                return Err(StoreError::write(err));
            }
        };
        write_txn.commit().map_err(|err| {
            tracing::warn!(error = %err, "sweep commit failed");
            StoreError::write(err)
        })?;

        if deleted > 0 {
            tracing::info!(deleted, "swept expired pastes");
        } else {
            tracing::debug!("no expired pastes");
        }
        Ok(SweepReport { deleted })
    }
}

fn delete_expired(write_txn: &WriteTransaction, now: DateTime<Utc>) -> Result<usize, StorageFault> {
    let now_millis = unix_millis(now);
    let mut by_expiry = write_txn.open_table(PASTES_BY_EXPIRY)?;

    // The index is sorted by deadline, so the scan stops at the first live row.
    let mut expired = Vec::new();
    for item in by_expiry.iter()? {
        let (key, _) = item?;
        let (expires_at, id) = key.value();
        if expires_at > now_millis {
            break;
        }
        expired.push((expires_at, id.to_string()));
    }

    let mut pastes = write_txn.open_table(PASTES)?;
    let mut by_created = write_txn.open_table(PASTES_BY_CREATED)?;
    let mut retired = write_txn.open_table(RETIRED_IDS)?;
    let mut deleted = 0;
    for (expires_at, id) in &expired {
        by_expiry.remove((*expires_at, id.as_str()))?;
        let row = match pastes.remove(id.as_str())? {
            Some(value) => Some(StoredPaste::decode(value.value())?),
            None => None,
        };
        if let Some(row) = row {
            if row.paste.visible {
                by_created.remove(row.recency_key())?;
            }
            retired.insert(id.as_str(), ())?;
            deleted += 1;
        }
    }
    Ok(deleted)
}

/// What the sweeper thread sweeps.
enum SweepTarget {
    /// A handle kept open for the sweeper's whole life.
    Handle(Store),
    /// A file opened for each sweep and released right after it.
    File { path: PathBuf, options: StoreOptions },
}

impl SweepTarget {
    fn sweep(&self) -> Result<SweepReport, StoreError> {
        match self {
            Self::Handle(store) => store.sweep(),
            Self::File { path, options } => {
                let store = Store::open_with(path, options.clone())?;
                let report = store.sweep();
                store.close()?;
                report
            }
        }
    }

    fn finish(self) {
        if let Self::Handle(store) = self {
            if let Err(err) = store.close() {
                tracing::warn!(error = %err, "failed to close sweeper store handle");
            }
        }
    }
}

/// Runs [`Store::sweep`] periodically on a dedicated thread.
pub struct Sweeper;

impl Sweeper {
    /// Start sweeping `store` every `interval`, beginning immediately.
    ///
    /// The sweeper owns `store`; pass a handle from [`Store::share`] so the
    /// request path keeps its own. Failures are logged and the loop keeps
    /// going; the loop ends when the handle is stopped or the store is closed.
    ///
    /// # Errors
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(store: Store, interval: Duration) -> std::io::Result<SweeperHandle> {
        Self::start(SweepTarget::Handle(store), interval)
    }

    /// Start sweeping the file at `path` every `interval`, beginning
    /// immediately, without holding it between sweeps.
    ///
    /// Each tick opens the store, sweeps and closes it again, so other
    /// processes can open the file while the sweeper sleeps. A tick that
    /// cannot open the file is logged and retried on the next one.
    ///
    /// # Errors
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn_detached(
        path: impl AsRef<Path>,
        options: StoreOptions,
        interval: Duration,
    ) -> std::io::Result<SweeperHandle> {
        let target = SweepTarget::File {
            path: path.as_ref().to_path_buf(),
            options,
        };
        Self::start(target, interval)
    }

    fn start(target: SweepTarget, interval: Duration) -> std::io::Result<SweeperHandle> {
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let thread = thread::Builder::new()
            .name("paster-sweeper".to_string())
            .spawn(move || {
                tracing::info!(interval_secs = interval.as_secs(), "sweeper started");
                loop {
                    match target.sweep() {
                        Ok(_) => {}
                        Err(StoreError::StoreClosed) => break,
                        Err(err) => tracing::warn!(error = %err, "background sweep failed"),
                    }
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                target.finish();
                tracing::info!("sweeper stopped");
            })?;

        Ok(SweeperHandle {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }
}

/// Control handle for a running [`Sweeper`]. Dropping it stops the thread.
pub struct SweeperHandle {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Signal the sweeper to stop and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    /// Block until the sweeper exits on its own.
    ///
    /// A sweeper only exits on its own once its store handle is closed, so
    /// in practice this runs until the process is terminated.
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("sweeper thread panicked");
            }
        }
    }

    fn shutdown(&mut self) {
        // Dropping the sender disconnects the channel, waking the thread.
        self.stop_tx.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("sweeper thread panicked");
            }
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
