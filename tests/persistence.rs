//! Persisted stores: restore on construction, save after every step.

use std::sync::Arc;

use parking_lot::Mutex;

use flowstore::config::PersistenceConfig;
use flowstore::counter::{CounterAction, CounterReducer, CounterState};
use flowstore::persist::{CodecKind, FileStorage, MemoryStorage, PersistError, StateStorage};
use flowstore::{Persistable, Persistence, Store, StoreBuilder};

const KEY: &str = "CounterState.store";

fn persisted_store(storage: impl StateStorage + 'static) -> Store<CounterReducer> {
    StoreBuilder::new(CounterReducer)
        .build_persisted(CounterState::default(), Persistence::new(storage))
}

fn stored_count(storage: &MemoryStorage) -> Option<i64> {
    let bytes = storage.get(KEY)?;
    let state: CounterState = serde_json::from_slice(&bytes).ok()?;
    Some(state.count)
}

// -- Test storages ------------------------------------------------------------

/// Memory storage that remembers every write.
#[derive(Clone, Default)]
struct RecordingStorage {
    inner: MemoryStorage,
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingStorage {
    fn saved_counts(&self) -> Vec<i64> {
        self.writes
            .lock()
            .iter()
            .map(|bytes| serde_json::from_slice::<CounterState>(bytes).unwrap().count)
            .collect()
    }
}

impl StateStorage for RecordingStorage {
    fn read(&self, key: &str, extension: &str) -> Result<Option<Vec<u8>>, PersistError> {
        self.inner.read(key, extension)
    }

    fn write(&self, key: &str, extension: &str, bytes: &[u8]) -> Result<(), PersistError> {
        self.writes.lock().push(bytes.to_vec());
        self.inner.write(key, extension, bytes)
    }

    fn remove(&self, key: &str, extension: &str) -> Result<(), PersistError> {
        self.inner.remove(key, extension)
    }
}

/// Storage that rejects every operation.
struct BrokenStorage;

impl StateStorage for BrokenStorage {
    fn read(&self, _key: &str, _extension: &str) -> Result<Option<Vec<u8>>, PersistError> {
        Err(PersistError::NoDataDir)
    }

    fn write(&self, _key: &str, _extension: &str, _bytes: &[u8]) -> Result<(), PersistError> {
        Err(PersistError::NoDataDir)
    }

    fn remove(&self, _key: &str, _extension: &str) -> Result<(), PersistError> {
        Err(PersistError::NoDataDir)
    }
}

// -- Tests --------------------------------------------------------------------

#[test]
fn storage_key_is_type_name() {
    assert_eq!(CounterState::storage_key(), KEY);
}

#[test]
fn state_survives_store_recreation() {
    let storage = MemoryStorage::new();

    let store = persisted_store(storage.clone());
    store.dispatch(CounterAction::Increment);
    store.dispatch(CounterAction::Increment);
    drop(store);

    let restored = persisted_store(storage.clone());
    assert_eq!(restored.current_state().count, 2);
    assert_eq!(stored_count(&storage), Some(2));
}

#[test]
fn default_is_saved_immediately() {
    let storage = MemoryStorage::new();
    let store = persisted_store(storage.clone());

    assert_eq!(store.current_state(), CounterState::default());
    assert_eq!(stored_count(&storage), Some(0));
    assert_eq!(store.version(), 0);
}

#[test]
fn restore_does_not_rewrite() {
    let storage = RecordingStorage::default();
    storage
        .inner
        .insert_raw(KEY, r#"{"count":5,"message":"kept"}"#);

    let store = persisted_store(storage.clone());
    let state = store.current_state();
    assert_eq!(state.count, 5);
    assert_eq!(state.message, "kept");
    assert!(storage.saved_counts().is_empty());
}

#[test]
fn corrupt_entry_falls_back_to_default() {
    let storage = MemoryStorage::new();
    storage.insert_raw(KEY, "not json at all");

    let store = persisted_store(storage.clone());
    assert_eq!(store.current_state(), CounterState::default());
    // The default replaced the unreadable payload.
    assert_eq!(stored_count(&storage), Some(0));
}

#[test]
fn every_step_of_a_cascade_is_saved() {
    let storage = RecordingStorage::default();
    let store = persisted_store(storage.clone());

    store.dispatch(CounterAction::IncrementBy { times: 3 });

    // Initial default, then one save per reduce step.
    assert_eq!(storage.saved_counts(), vec![0, 1, 2, 3]);
    assert_eq!(store.current_state().count, 3);
}

#[test]
fn failing_storage_does_not_block_updates() {
    let store = persisted_store(BrokenStorage);
    store.dispatch(CounterAction::Increment);
    store.dispatch(CounterAction::SetMessage("still here".into()));

    let state = store.current_state();
    assert_eq!(state.count, 1);
    assert_eq!(state.message, "still here");
}

#[test]
fn file_storage_with_toml_codec() {
    let dir = tempfile::tempdir().unwrap();
    let config = PersistenceConfig {
        directory: Some(dir.path().to_path_buf()),
        codec: CodecKind::Toml,
    };

    let store = StoreBuilder::new(CounterReducer).build_persisted(
        CounterState::default(),
        Persistence::from_config(&config).unwrap(),
    );
    store.dispatch(CounterAction::SetMessage("on disk".into()));
    store.dispatch(CounterAction::Increment);
    drop(store);

    let path = FileStorage::new(dir.path()).entry_path(KEY, "toml");
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("count = 1"));
    assert!(text.contains("message = \"on disk\""));

    let restored = StoreBuilder::new(CounterReducer).build_persisted(
        CounterState::default(),
        Persistence::from_config(&config).unwrap(),
    );
    assert_eq!(restored.current_state().count, 1);
    assert_eq!(restored.current_state().message, "on disk");
}

#[test]
fn separate_keys_keep_stores_apart() {
    let storage = MemoryStorage::new();
    let first = StoreBuilder::new(CounterReducer).build_persisted(
        CounterState::default(),
        Persistence::new(storage.clone()).with_key("first"),
    );
    let second = StoreBuilder::new(CounterReducer).build_persisted(
        CounterState::default(),
        Persistence::new(storage.clone()).with_key("second"),
    );

    first.dispatch(CounterAction::Increment);
    second.dispatch(CounterAction::Decrement);

    assert!(storage.contains("first"));
    assert!(storage.contains("second"));
    assert_eq!(storage.len(), 2);
    assert_eq!(first.current_state().count, 1);
    assert_eq!(second.current_state().count, -1);
}
