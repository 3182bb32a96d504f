//! Integration tests for attaching, detaching and destroying stores.

use slotdb::{Error, Registry, Store, StoreConfig, MIN_STORE_SIZE};
use std::sync::Arc;
use std::thread;

const DB_SIZE: usize = 2_000_000;

/// Test attach through the global registry, then destroy by name.
#[test]
fn test_global_attach_and_destroy() {
    let store = Store::attach("lifecycle-global", DB_SIZE).unwrap();
    assert_eq!(store.capacity().unwrap(), DB_SIZE);

    // Destroy is refused while the handle is attached
    assert!(matches!(
        Store::destroy("lifecycle-global"),
        Err(Error::DestroyFailed { .. })
    ));

    store.detach();
    Store::destroy("lifecycle-global").unwrap();

    // Nothing left to destroy
    assert!(matches!(
        Store::destroy("lifecycle-global"),
        Err(Error::DestroyFailed { .. })
    ));
}

/// Test that a second handle joins the existing store and sees its records.
#[test]
fn test_join_shares_records() {
    let registry = Arc::new(Registry::new());
    let creator = Store::attach_in(&registry, "shared", StoreConfig::new().size_bytes(DB_SIZE)).unwrap();
    let record = creator.create_record(1).unwrap();
    creator.set_int_field(record, 0, 42).unwrap();

    // Size is ignored when joining
    let joiner = Store::attach_in(&registry, "shared", StoreConfig::new().size_bytes(1)).unwrap();
    assert_eq!(joiner.capacity().unwrap(), DB_SIZE);
    assert_eq!(joiner.get_int_field(record, 0).unwrap(), 42);
    assert_eq!(registry.handle_count("shared"), 2);

    // Detaching one handle leaves the store intact for the other
    creator.detach();
    assert_eq!(joiner.get_int_field(record, 0).unwrap(), 42);
}

/// Test that recreating a destroyed store yields an empty one.
#[test]
fn test_recreate_after_destroy_is_empty() {
    let registry = Arc::new(Registry::new());
    let config = StoreConfig::new().size_bytes(MIN_STORE_SIZE);

    let store = Store::attach_in(&registry, "recreate", config.clone()).unwrap();
    let old = store.create_record(1).unwrap();
    drop(store);

    registry.destroy("recreate").unwrap();

    let store = Store::attach_in(&registry, "recreate", config).unwrap();
    assert_eq!(store.record_count().unwrap(), 0);
    assert!(store.first_record().unwrap_err().is_end_of_store());

    // Records of the destroyed store do not resolve in the new one
    assert!(matches!(store.record_len(old), Err(Error::StaleRecord(_))));
}

/// Test attach failures.
#[test]
fn test_attach_failures() {
    let registry = Arc::new(Registry::new());

    assert!(matches!(
        Store::attach_in(&registry, "", StoreConfig::default()),
        Err(Error::AttachFailed { .. })
    ));
    assert!(matches!(
        Store::attach_in(&registry, "tiny", StoreConfig::new().size_bytes(MIN_STORE_SIZE - 1)),
        Err(Error::AttachFailed { .. })
    ));
    assert!(registry.is_empty());
}

/// Test that every operation on a detached handle fails.
#[test]
fn test_detached_handle() {
    let registry = Arc::new(Registry::new());
    let store = Store::attach_in(&registry, "detached", StoreConfig::default()).unwrap();
    let record = store.create_record(1).unwrap();
    store.detach();

    assert!(!store.is_attached());
    assert!(matches!(store.create_record(1), Err(Error::Detached)));
    assert!(matches!(store.set_int_field(record, 0, 1), Err(Error::Detached)));
    assert!(matches!(store.get_int_field(record, 0), Err(Error::Detached)));
    assert!(matches!(store.first_record(), Err(Error::Detached)));
    assert!(matches!(store.start_read(), Err(Error::Detached)));
    assert_eq!(store.get_field(record, 0), slotdb::EncodedValue::Illegal);
}

/// Test many threads attaching and detaching concurrently.
#[test]
fn test_concurrent_attach_detach() {
    let registry = Arc::new(Registry::new());
    let mut handles = vec![];

    for t in 0..8i64 {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            for _ in 0..20 {
                let store = Store::attach_in(&registry, "busy", StoreConfig::default()).unwrap();
                let _guard = store.write().unwrap();
                let record = store.create_record(1).unwrap();
                store.set_int_field(record, 0, t).unwrap();
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(registry.handle_count("busy"), 0);
    let store = Store::attach_in(&registry, "busy", StoreConfig::default()).unwrap();
    assert_eq!(store.record_count().unwrap(), 160);
}
