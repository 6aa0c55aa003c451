//! Key-value storage adapter with JSON (de)serialization.
//!
//! Backends store raw strings; `JsonStorage` layers typed access on top.
//! All operations are synchronous: callers never suspend on storage.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{StorageError, StorageResult};

/// Raw string key-value backend (browser-style local storage semantics).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Process-local backend. Contents are lost when the value is dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Directory-backed storage: one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory.
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            StorageError::backend(dir.to_string_lossy(), format!("create directory: {e}"))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' => '_',
                c => c,
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::backend(key, e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        fs::write(self.path_for(key), value).map_err(|e| StorageError::backend(key, e.to_string()))
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::backend(key, e.to_string())),
        }
    }
}

/// Typed JSON view over a shared backend.
///
/// Cheap to clone; every store holds its own handle to the same backend.
#[derive(Clone)]
pub struct JsonStorage {
    backend: Arc<dyn KeyValueStore>,
}

impl JsonStorage {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// In-memory storage, mainly for tests and ephemeral sessions.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let Some(text) = self.backend.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StorageError::Deserialize {
                key: key.to_string(),
                source,
            })
    }

    /// Read a record, treating unreadable or corrupt values as absent.
    ///
    /// Used when rehydrating stores at startup.
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.get(key) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(err) => {
                tracing::warn!(key, error = %err, "discarding unreadable persisted record");
                T::default()
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let text = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.backend.set(key, &text)
    }

    pub fn remove(&self, key: &str) -> StorageResult<()> {
        self.backend.remove(key)
    }

    /// Raw access for callers that inspect the persisted text.
    pub fn get_raw(&self, key: &str) -> StorageResult<Option<String>> {
        self.backend.get(key)
    }
}

impl core::fmt::Debug for JsonStorage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JsonStorage").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;
    use serde_json::{Value, json};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
        tags: Vec<String>,
    }

    #[test]
    fn missing_key_reads_as_none() {
        let storage = JsonStorage::in_memory();
        let value: Option<Sample> = storage.get("absent").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn remove_deletes_value() {
        let storage = JsonStorage::in_memory();
        storage.set("k", &json!({"a": 1})).unwrap();
        storage.remove("k").unwrap();
        assert!(storage.get_raw("k").unwrap().is_none());
    }

    #[test]
    fn corrupt_value_is_a_deserialize_error() {
        let backend = Arc::new(MemoryStorage::new());
        backend.set("k", "{not json").unwrap();
        let storage = JsonStorage::new(backend);

        let err = storage.get::<Sample>("k").unwrap_err();
        assert!(matches!(err, StorageError::Deserialize { .. }));
        assert_eq!(err.key(), "k");

        let fallback: Vec<String> = storage.get_or_default("k");
        assert!(fallback.is_empty());
    }

    #[test]
    fn file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let sample = Sample {
            name: "label".to_string(),
            count: 3,
            tags: vec!["a".to_string()],
        };

        JsonStorage::new(Arc::new(FileStorage::open(dir.path()).unwrap()))
            .set("labeldesk.session", &sample)
            .unwrap();

        let reopened = JsonStorage::new(Arc::new(FileStorage::open(dir.path()).unwrap()));
        assert_eq!(reopened.get::<Sample>("labeldesk.session").unwrap(), Some(sample));

        reopened.remove("labeldesk.session").unwrap();
        reopened.remove("labeldesk.session").unwrap();
        assert!(reopened.get_raw("labeldesk.session").unwrap().is_none());
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: set then get under the same key yields a deep-equal value.
        #[test]
        fn json_round_trip_is_idempotent(key in "[a-z.]{1,16}", value in arb_json()) {
            let storage = JsonStorage::in_memory();
            storage.set(&key, &value).unwrap();
            let back: Option<Value> = storage.get(&key).unwrap();
            prop_assert_eq!(back, Some(value));
        }
    }
}
