//! Paste store integration tests.

use super::*;
use crate::clock::ManualClock;
use crate::models::paste::*;
use crate::models::search::SearchFilter;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use redb::{ReadableDatabase, ReadableTable};
use std::sync::{Arc, Barrier};
use tempfile::TempDir;

fn setup_test_store() -> (Store, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open(temp_dir.path().join("paster.redb")).unwrap();
    (store, temp_dir)
}

fn setup_clocked_store() -> (Store, Arc<ManualClock>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    ));
    let options = StoreOptions::default().with_clock(clock.clone());
    let store = Store::open_with(temp_dir.path().join("paster.redb"), options).unwrap();
    (store, clock, temp_dir)
}

fn sample(title: &str, author: &str, language: &str) -> NewPaste {
    NewPaste::new(
        title,
        author,
        language,
        format!("// {}\nint main() {{}}", title),
        Lifetime::Hour,
    )
}

fn titles(pastes: &[Paste]) -> Vec<&str> {
    pastes.iter().map(|p| p.title.as_str()).collect()
}

fn next_sequence(store: &Store) -> u64 {
    let shared = store.shared().unwrap();
    let read_txn = shared.db.begin_read().unwrap();
    let meta = read_txn.open_table(STORE_META).unwrap();
    let value = meta
        .get(tables::NEXT_SEQUENCE_KEY)
        .unwrap()
        .map(|v| v.value());
    value.unwrap_or(0)
}

fn stored_row_count(store: &Store) -> usize {
    let shared = store.shared().unwrap();
    let read_txn = shared.db.begin_read().unwrap();
    let pastes = read_txn.open_table(PASTES).unwrap();
    let count = pastes.iter().unwrap().count();
    count
}

fn recency_index_ids(store: &Store) -> Vec<String> {
    let shared = store.shared().unwrap();
    let read_txn = shared.db.begin_read().unwrap();
    let by_created = read_txn.open_table(PASTES_BY_CREATED).unwrap();
    let ids = by_created
        .iter()
        .unwrap()
        .map(|item| item.unwrap().1.value().to_string())
        .collect();
    ids
}

fn expiry_index_len(store: &Store) -> usize {
    let shared = store.shared().unwrap();
    let read_txn = shared.db.begin_read().unwrap();
    let by_expiry = read_txn.open_table(PASTES_BY_EXPIRY).unwrap();
    let count = by_expiry.iter().unwrap().count();
    count
}

mod expiry;
mod lifecycle;
