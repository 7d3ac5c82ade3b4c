//! Expiration sweep tests.

use super::*;
use crate::constants::PASTE_HOUR;
use std::time::{Duration, Instant};

#[test]
fn sweep_removes_only_expired_pastes() {
    let (store, clock, _temp) = setup_clocked_store();
    let short_a = store
        .insert(sample("short a", "a", "c").with_duration(1))
        .unwrap();
    let short_b = store
        .insert(sample("short b", "a", "c").with_duration(1).hidden())
        .unwrap();
    let long = store
        .insert(sample("long", "a", "c").with_duration(PASTE_HOUR))
        .unwrap();

    clock.advance(ChronoDuration::seconds(2));
    let report = store.sweep().expect("sweep");

    assert_eq!(report.deleted, 2);
    assert!(store.get(&short_a).unwrap().is_none());
    assert!(store.get(&short_b).unwrap().is_none());
    assert!(store.get(&long).unwrap().is_some());
    assert_eq!(titles(&store.recent(10).unwrap()), vec!["long"]);
}

#[test]
fn sweep_after_real_sleep() {
    let (store, _temp) = setup_test_store();
    let short_a = store
        .insert(sample("short a", "a", "c").with_duration(1))
        .unwrap();
    let short_b = store
        .insert(sample("short b", "a", "c").with_duration(1))
        .unwrap();
    let long = store
        .insert(sample("long", "a", "c").with_duration(PASTE_HOUR))
        .unwrap();

    std::thread::sleep(Duration::from_millis(1_200));
    store.sweep().expect("sweep");

    assert!(store.get(&short_a).unwrap().is_none());
    assert!(store.get(&short_b).unwrap().is_none());
    assert!(store.get(&long).unwrap().is_some());
}

#[test]
fn expiry_boundary_is_inclusive() {
    let (store, clock, _temp) = setup_clocked_store();
    let id = store
        .insert(sample("edge", "a", "c").with_duration(60))
        .unwrap();

    clock.advance(ChronoDuration::seconds(59));
    assert_eq!(store.sweep().unwrap().deleted, 0);
    assert!(store.get(&id).unwrap().is_some());

    clock.advance(ChronoDuration::seconds(1));
    assert_eq!(store.sweep().unwrap().deleted, 1);
    assert!(store.get(&id).unwrap().is_none());
}

#[test]
fn sweep_is_idempotent() {
    let (store, clock, _temp) = setup_clocked_store();
    assert_eq!(store.sweep().unwrap(), SweepReport::default());

    store
        .insert(sample("short", "a", "c").with_duration(1))
        .unwrap();
    clock.advance(ChronoDuration::seconds(1));
    assert_eq!(store.sweep().unwrap().deleted, 1);
    assert_eq!(store.sweep().unwrap().deleted, 0);
    assert_eq!(store.sweep().unwrap().deleted, 0);
}

#[test]
fn swept_ids_are_never_reused_in_a_small_id_space() {
    let temp_dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let options = StoreOptions::default()
        .with_clock(clock.clone())
        .with_id_policy(IdPolicy::new(b"a", 1, 2).unwrap());
    let store = Store::open_with(temp_dir.path().join("paster.redb"), options).unwrap();

    store
        .insert(sample("short", "a", "c").with_duration(1))
        .unwrap();
    clock.advance(ChronoDuration::seconds(1));
    assert_eq!(store.sweep().unwrap().deleted, 1);

    let err = store.insert(sample("next", "a", "c")).unwrap_err();
    assert!(matches!(err, StoreError::IdSpaceExhausted { attempts: 2 }));
    assert!(store.recent(10).unwrap().is_empty());
}

#[test]
fn background_sweeper_removes_expired_pastes() {
    let (store, clock, _temp) = setup_clocked_store();
    let id = store
        .insert(sample("short", "a", "c").with_duration(1))
        .unwrap();
    let keep = store.insert(sample("long", "a", "c")).unwrap();
    clock.advance(ChronoDuration::seconds(2));

    let handle = Sweeper::spawn(store.share().unwrap(), Duration::from_millis(20)).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while store.get(&id).unwrap().is_some() {
        assert!(Instant::now() < deadline, "sweeper did not remove the paste");
        std::thread::sleep(Duration::from_millis(10));
    }
    handle.stop();

    assert!(store.get(&keep).unwrap().is_some());
    assert!(store.is_open(), "stopping the sweeper must not close the request handle");
}

#[test]
fn dropping_the_sweeper_handle_stops_the_thread() {
    let (store, _temp) = setup_test_store();
    let handle = Sweeper::spawn(store.share().unwrap(), Duration::from_secs(3600)).unwrap();
    let started = Instant::now();
    drop(handle);
    assert!(started.elapsed() < Duration::from_secs(5));
    store.insert(sample("still writable", "a", "c")).unwrap();
}

#[test]
fn detached_sweeper_releases_the_file_between_ticks() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("paster.redb");
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let options = StoreOptions::default()
        .with_clock(clock.clone())
        .with_lock_timeout(Duration::from_secs(5));

    let store = Store::open_with(&path, options.clone()).unwrap();
    let short = store
        .insert(sample("short", "a", "c").with_duration(1))
        .unwrap();
    store.close().unwrap();
    drop(store);
    clock.advance(ChronoDuration::seconds(2));

    let handle =
        Sweeper::spawn_detached(&path, options.clone(), Duration::from_millis(50)).unwrap();

    // Other owners keep opening and writing while the sweeper runs.
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut writes = 0;
    loop {
        let store = Store::open_with(&path, options.clone()).expect("open between sweeps");
        let swept = store.get(&short).unwrap().is_none();
        store.insert(sample("concurrent", "a", "c")).unwrap();
        writes += 1;
        store.close().unwrap();
        drop(store);
        if swept && writes >= 3 {
            break;
        }
        assert!(Instant::now() < deadline, "sweeper did not remove the paste");
        std::thread::sleep(Duration::from_millis(20));
    }
    handle.stop();

    let store = Store::open_with(&path, options).unwrap();
    assert_eq!(store.recent(100).unwrap().len(), writes);
}
