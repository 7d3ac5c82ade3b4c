use super::*;

#[test]
fn close_twice_is_a_no_op() {
    let (store, _temp) = setup_test_store();
    assert!(store.is_open());
    store.close().unwrap();
    store.close().unwrap();
    assert!(!store.is_open());
}

#[test]
fn operations_on_a_closed_store_fail() {
    let (store, _temp) = setup_test_store();
    let id = store.insert(sample("before", "a", "c")).unwrap();
    store.close().unwrap();

    assert!(matches!(
        store.insert(sample("after", "a", "c")),
        Err(StoreError::StoreClosed)
    ));
    assert!(matches!(store.get(&id), Err(StoreError::StoreClosed)));
    assert!(matches!(store.recent(10), Err(StoreError::StoreClosed)));
    assert!(matches!(
        store.search(10, &SearchFilter::default()),
        Err(StoreError::StoreClosed)
    ));
    assert!(matches!(store.sweep(), Err(StoreError::StoreClosed)));
    assert!(matches!(store.share(), Err(StoreError::StoreClosed)));
}

#[test]
fn shared_handle_outlives_the_first_handle() {
    let (store, _temp) = setup_test_store();
    let other = store.share().unwrap();
    let id = store.insert(sample("shared", "a", "c")).unwrap();

    store.close().unwrap();
    assert!(other.is_open());
    assert_eq!(other.get(&id).unwrap().unwrap().title, "shared");
    other.insert(sample("second", "a", "c")).unwrap();
    assert_eq!(titles(&other.recent(10).unwrap()), vec!["second", "shared"]);
}

#[test]
fn reopen_after_close_sees_prior_writes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("paster.redb");

    let store = Store::open(&path).unwrap();
    let id = store.insert(sample("kept", "a", "c")).unwrap();
    store.close().unwrap();
    drop(store);

    let reopened = Store::open(&path).unwrap();
    assert_eq!(reopened.get(&id).unwrap().unwrap().title, "kept");
    assert_eq!(reopened.path(), path.as_path());
}

#[test]
fn open_creates_missing_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("paster.redb");
    let store = Store::open(&path).unwrap();
    store.insert(sample("deep", "a", "c")).unwrap();
    assert!(path.exists());
}

#[test]
fn open_on_a_directory_is_unavailable() {
    let temp_dir = TempDir::new().unwrap();
    let err = Store::open(temp_dir.path()).unwrap_err();
    assert!(matches!(err, StoreError::StorageUnavailable { .. }));
    assert!(!err.is_write_failure());
}

#[test]
fn second_open_waits_then_reports_unavailable() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("paster.redb");
    let _holder = Store::open(&path).unwrap();

    let options = StoreOptions::default().with_lock_timeout(Duration::from_millis(150));
    let started = Instant::now();
    let err = Store::open_with(&path, options).unwrap_err();

    assert!(started.elapsed() >= Duration::from_millis(150));
    match err {
        StoreError::StorageUnavailable { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn open_succeeds_once_the_holder_lets_go() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("paster.redb");
    let holder = Store::open(&path).unwrap();

    let releaser = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        drop(holder);
    });

    let options = StoreOptions::default().with_lock_timeout(Duration::from_secs(5));
    let store = Store::open_with(&path, options).unwrap();
    releaser.join().unwrap();
    store.insert(sample("after handoff", "a", "c")).unwrap();
}
