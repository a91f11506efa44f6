use crate::{FileStore, PersistenceStore, SupervisorError};

use googletest::assert_that;
use googletest::prelude::{eq, none, ok, some};
use tempfile::TempDir;

use super::instance_dir;

#[test]
fn given_no_cache_file_when_read_pid_then_none() {
    let instance = instance_dir();
    let store = FileStore::new(instance.path().join("state.json"));

    assert_that!(store.read_pid(instance.path()), ok(none()));
}

#[test]
fn given_stored_pid_when_read_then_same_pid() {
    // Given
    let instance = instance_dir();
    let store = FileStore::new(instance.path().join("state.json"));

    // When
    store.store_pid(instance.path(), Some(4242)).unwrap();

    // Then
    assert_that!(store.read_pid(instance.path()), ok(some(eq(&4242))));
}

#[test]
fn given_cleared_pid_when_file_inspected_then_minus_one() {
    // Given
    let instance = instance_dir();
    let store = FileStore::new(instance.path().join("state.json"));
    store.store_pid(instance.path(), Some(4242)).unwrap();

    // When
    store.store_pid(instance.path(), None).unwrap();

    // Then
    let raw = std::fs::read_to_string(FileStore::cache_path(instance.path())).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_that!(json["pid"].as_i64(), some(eq(-1)));
    assert_that!(store.read_pid(instance.path()), ok(none()));
}

#[test]
fn given_write_when_done_then_no_temp_file_left() {
    let instance = instance_dir();
    let store = FileStore::new(instance.path().join("state.json"));

    store.store_pid(instance.path(), Some(7)).unwrap();

    let leftovers: Vec<_> = std::fs::read_dir(instance.path().join(".svctl"))
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert_that!(leftovers.len(), eq(0));
}

#[test]
fn given_corrupt_cache_when_read_then_persistence_error() {
    // Given
    let instance = instance_dir();
    let store = FileStore::new(instance.path().join("state.json"));
    std::fs::write(FileStore::cache_path(instance.path()), "{pid:").unwrap();

    // When
    let result = store.read_pid(instance.path());

    // Then
    assert!(matches!(result, Err(SupervisorError::Persistence { .. })));
}

#[test]
fn given_paths_appended_when_listed_then_in_order_without_duplicates() {
    // Given
    let config_dir = TempDir::new().unwrap();
    let store = FileStore::new(config_dir.path().join("state.json"));

    // When
    store.append_registered_path("/srv/a".as_ref()).unwrap();
    store.append_registered_path("/srv/b".as_ref()).unwrap();
    store.append_registered_path("/srv/a".as_ref()).unwrap();

    // Then
    let paths = store.registered_paths().unwrap();
    assert_that!(paths.len(), eq(2));
    assert_that!(paths[0].to_str(), some(eq("/srv/a")));
    assert_that!(paths[1].to_str(), some(eq("/srv/b")));
}

#[test]
fn given_state_file_when_inspected_then_servers_array() {
    let config_dir = TempDir::new().unwrap();
    let state_file = config_dir.path().join("state.json");
    let store = FileStore::new(&state_file);

    store.append_registered_path("/srv/a".as_ref()).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&state_file).unwrap()).unwrap();
    assert_that!(json["servers"][0].as_str(), some(eq("/srv/a")));
}

#[test]
fn given_missing_state_file_when_listed_then_empty() {
    let config_dir = TempDir::new().unwrap();
    let store = FileStore::new(config_dir.path().join("nested").join("state.json"));

    assert_that!(store.registered_paths().map(|p| p.len()), ok(eq(&0)));
}
