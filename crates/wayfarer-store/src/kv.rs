//! Key-value backends.
//!
//! The whole application state lives under a handful of string keys in one
//! local store. [`FileStore`] keeps them in a single JSON object on disk and
//! rewrites the file atomically on every mutation; [`MemoryStore`] keeps them
//! in memory for tests and for environments where nothing may be persisted.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::StoreError;

/// Synchronous string key-value store.
///
/// All mutations complete before the call returns. Implementations are
/// shared as `Arc<dyn KeyValueStore>` between the credential gate and the
/// itinerary store.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, or `None` if the key has never been set.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Move an undecodable backing store aside so later writes start from an
    /// empty store. Returns where the old contents were kept, or `None` when
    /// there was nothing to move.
    fn set_aside(&self) -> Result<Option<PathBuf>, StoreError> {
        Ok(None)
    }
}

// Compile-time assertion: KeyValueStore must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn KeyValueStore) {}
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// A key-value store persisted as one JSON object in a file.
///
/// A missing file is an empty store. The file is created on first write,
/// together with its parent directory.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl FileStore {
    /// Open (without creating) the store file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Open the store file described by `config`.
    pub fn open(config: &StoreConfig) -> Self {
        Self::new(config.store_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|e| StoreError::CorruptFile {
            path: self.path.clone(),
            source: e,
        })
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let io_err = |e| StoreError::Io {
            path: self.path.clone(),
            source: e,
        };

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }

        let contents = serde_json::to_string_pretty(map).map_err(|e| StoreError::Serialize {
            key: "*".to_string(),
            source: e,
        })?;

        // Write to a sibling temp file, then rename over the original so a
        // crash never leaves a half-written store behind.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&self.path, perms).map_err(io_err)?;
        }

        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _g = lock(&self.guard);
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _g = lock(&self.guard);
        let mut map = self.read_map()?;
        map.insert(key.to_owned(), value.to_owned());
        self.write_map(&map)?;
        debug!(key, path = %self.path.display(), "store key written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _g = lock(&self.guard);
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
            debug!(key, path = %self.path.display(), "store key removed");
        }
        Ok(())
    }

    fn set_aside(&self) -> Result<Option<PathBuf>, StoreError> {
        let _g = lock(&self.guard);
        match self.read_map() {
            Err(StoreError::CorruptFile { .. }) => {}
            _ => return Ok(None),
        }
        let kept = self.path.with_extension("json.corrupt");
        fs::rename(&self.path, &kept).map_err(|e| StoreError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        warn!(
            path = %self.path.display(),
            kept = %kept.display(),
            "unreadable store file moved aside"
        );
        Ok(Some(kept))
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// A key-value store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Mutex::new(map),
        }
    }

    /// Number of keys currently set.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        lock(&self.entries).insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));

        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));

        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        store.remove("a").unwrap();
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("nested").join("store.json"));
        assert_eq!(store.get("anything").unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("store.json");

        FileStore::new(&path).set("locale", "ar").unwrap();
        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("locale").unwrap().as_deref(), Some("ar"));

        reopened.remove("locale").unwrap();
        assert_eq!(FileStore::new(&path).get("locale").unwrap(), None);
    }

    #[test]
    fn file_store_reports_corrupt_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("store.json");
        std::fs::write(&path, "not json at all").unwrap();

        let err = FileStore::new(&path).get("locale").unwrap_err();
        assert!(err.is_corrupt(), "unexpected error: {err}");
    }

    #[test]
    fn set_aside_keeps_corrupt_contents() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("store.json");
        let store = FileStore::new(&path);

        store.set("locale", "ar").unwrap();
        assert_eq!(store.set_aside().unwrap(), None);

        std::fs::write(&path, "{ broken").unwrap();
        let kept = store.set_aside().unwrap().unwrap();
        assert_eq!(std::fs::read_to_string(&kept).unwrap(), "{ broken");
        assert_eq!(store.get("locale").unwrap(), None);
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn file_store_sets_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("store.json");
        FileStore::new(&path).set("gemini-api-key", "secret").unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }
}
