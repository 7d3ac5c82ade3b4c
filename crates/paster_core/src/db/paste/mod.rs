//! Paste insert, lookup and listing backed by redb.

#[cfg(test)]
mod failpoint;
mod helpers;

#[cfg(test)]
pub(crate) use self::failpoint::{set_insert_failpoint, InsertFailpoint};
pub(crate) use self::helpers::StoredPaste;

use super::tables::{
    NEXT_SEQUENCE_KEY, PASTES, PASTES_BY_CREATED, PASTES_BY_EXPIRY, RETIRED_IDS, STORE_META,
};
use super::{Store, StoreOptions};
use crate::error::{StorageFault, StoreError};
use crate::models::paste::{NewPaste, Paste};
use crate::models::search::SearchFilter;
use crate::naming::IdPolicy;
use chrono::SubsecRound;
use redb::{ReadableDatabase, ReadableTable, WriteTransaction};

impl Store {
    /// Persist a new paste and return its freshly minted id.
    ///
    /// Id generation, the collision check and the row insert run inside one
    /// exclusive write transaction. On any failure nothing is written.
    ///
    /// # Errors
    /// - [`StoreError::LockTimeout`] when the writer lock is not acquired in time.
    /// - [`StoreError::IdSpaceExhausted`] when every candidate id collided.
    /// - [`StoreError::StorageWriteFailed`] when the transaction fails.
    /// - [`StoreError::StoreClosed`] when the handle is closed.
    pub fn insert(&self, paste: NewPaste) -> Result<String, StoreError> {
        let shared = self.shared()?;
        let _writer = shared.lock_writer()?;

        let write_txn = shared.db.begin_write().map_err(|err| {
            tracing::warn!(error = %err, "could not begin paste insert");
            StoreError::write(err)
        })?;

        let stored = match stage_insert(&write_txn, &shared.options, paste) {
            Ok(stored) => stored,
            Err(err) => {
                if let Err(abort_err) = write_txn.abort() {
                    tracing::warn!(error = %abort_err, "failed to abort paste insert");
                }
                tracing::warn!(error = %err, "paste insert rolled back");
                return Err(err);
            }
        };

        write_txn.commit().map_err(|err| {
            tracing::warn!(error = %err, "paste insert commit failed");
            StoreError::write(err)
        })?;

        tracing::info!(
            id = %stored.id,
            author = %stored.author,
            duration = stored.duration,
            "new paste"
        );
        Ok(stored.id)
    }

    /// Fetch a paste by id, regardless of its visibility.
    ///
    /// # Returns
    /// `Ok(Some(paste))` when found, `Ok(None)` when no row matches.
    ///
    /// # Errors
    /// Returns [`StoreError::StorageReadFailed`] on storage or decoding failure.
    pub fn get(&self, id: &str) -> Result<Option<Paste>, StoreError> {
        let shared = self.shared()?;
        let found = load_paste(&shared.db, id).map_err(|err| {
            tracing::warn!(id, error = %err, "paste lookup failed");
            StoreError::read(err)
        })?;
        tracing::debug!(id, found = found.is_some(), "paste lookup");
        Ok(found)
    }

    /// List up to `limit` visible pastes, newest first.
    ///
    /// Expired pastes that have not been swept yet are still listed.
    ///
    /// # Errors
    /// Returns [`StoreError::StorageReadFailed`] on storage or decoding failure.
    pub fn recent(&self, limit: usize) -> Result<Vec<Paste>, StoreError> {
        let shared = self.shared()?;
        let pastes = list_visible(&shared.db, limit, &SearchFilter::default()).map_err(|err| {
            tracing::warn!(error = %err, "recent listing failed");
            StoreError::read(err)
        })?;
        tracing::debug!(limit, found = pastes.len(), "recent pastes");
        Ok(pastes)
    }

    /// List up to `limit` visible pastes matching `filter`, newest first.
    ///
    /// # Errors
    /// Returns [`StoreError::StorageReadFailed`] on storage or decoding failure.
    pub fn search(&self, limit: usize, filter: &SearchFilter) -> Result<Vec<Paste>, StoreError> {
        let shared = self.shared()?;
        let pastes = list_visible(&shared.db, limit, filter).map_err(|err| {
            tracing::warn!(error = %err, "paste search failed");
            StoreError::read(err)
        })?;
        tracing::debug!(?filter, limit, found = pastes.len(), "paste search");
        Ok(pastes)
    }
}

fn stage_insert(
    write_txn: &WriteTransaction,
    options: &StoreOptions,
    paste: NewPaste,
) -> Result<Paste, StoreError> {
    let policy = options.id_policy();
    let Some(id) = claim_id(write_txn, policy).map_err(StoreError::write)? else {
        return Err(StoreError::IdSpaceExhausted {
            attempts: policy.max_attempts(),
        });
    };
    // Index keys hold milliseconds; keep the row at the same precision.
    let created_at = options.clock.now().trunc_subsecs(3);
    let paste = paste.into_paste(id, created_at);
    write_rows(write_txn, paste).map_err(StoreError::write)
}

/// Draw candidates until one was never used, or give up after the policy bound.
fn claim_id(write_txn: &WriteTransaction, policy: &IdPolicy) -> Result<Option<String>, StorageFault> {
    let pastes = write_txn.open_table(PASTES)?;
    let retired = write_txn.open_table(RETIRED_IDS)?;
    let mut rng = rand::thread_rng();
    for attempt in 1..=policy.max_attempts() {
        let candidate = policy.generate(&mut rng);
        let taken = pastes.get(candidate.as_str())?.is_some()
            || retired.get(candidate.as_str())?.is_some();
        if !taken {
            return Ok(Some(candidate));
        }
        tracing::debug!(attempt, candidate = %candidate, "paste id collision");
    }
    Ok(None)
}

fn write_rows(write_txn: &WriteTransaction, paste: Paste) -> Result<Paste, StorageFault> {
    let mut meta = write_txn.open_table(STORE_META)?;
    let seq = meta.get(NEXT_SEQUENCE_KEY)?.map(|v| v.value()).unwrap_or(0);
    meta.insert(NEXT_SEQUENCE_KEY, seq + 1)?;
    #[cfg(test)]
    failpoint::hit(InsertFailpoint::AfterSequenceBump)?;

    let row = StoredPaste { seq, paste };
    let encoded = row.encode()?;

    let mut pastes = write_txn.open_table(PASTES)?;
    let mut by_created = write_txn.open_table(PASTES_BY_CREATED)?;
    let mut by_expiry = write_txn.open_table(PASTES_BY_EXPIRY)?;
    pastes.insert(row.paste.id.as_str(), encoded.as_slice())?;
    #[cfg(test)]
    failpoint::hit(InsertFailpoint::AfterRowInsert)?;
    if row.paste.visible {
        by_created.insert(row.recency_key(), row.paste.id.as_str())?;
    }
    by_expiry.insert(row.expiry_key(), ())?;

    Ok(row.paste)
}

fn load_paste(db: &redb::Database, id: &str) -> Result<Option<Paste>, StorageFault> {
    let read_txn = db.begin_read()?;
    let pastes = read_txn.open_table(PASTES)?;
    match pastes.get(id)? {
        Some(value) => Ok(Some(StoredPaste::decode(value.value())?.paste)),
        None => Ok(None),
    }
}

/// Walk the recency index newest first, keeping rows that match.
///
/// Only visible pastes are indexed, so hidden rows are never decoded here.
fn list_visible(
    db: &redb::Database,
    limit: usize,
    filter: &SearchFilter,
) -> Result<Vec<Paste>, StorageFault> {
    if limit == 0 {
        return Ok(Vec::new());
    }

    let read_txn = db.begin_read()?;
    let by_created = read_txn.open_table(PASTES_BY_CREATED)?;
    let pastes_table = read_txn.open_table(PASTES)?;
    let check_filter = !filter.is_unconstrained();
    let mut pastes = Vec::new();

    for item in by_created.iter()? {
        let (_, id) = item?;
        let Some(row) = pastes_table.get(id.value())? else {
            continue;
        };
        let paste = StoredPaste::decode(row.value())?.paste;
        if check_filter && !filter.matches(&paste) {
            continue;
        }
        pastes.push(paste);
        if pastes.len() >= limit {
            break;
        }
    }

    Ok(pastes)
}
