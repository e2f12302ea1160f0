//! Key-value backends: in-memory (with fault injection) and JSON file

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::{Store, StoreError};

/// In-process store
///
/// Faults can be injected per key or for the whole store, mirroring the
/// ways a browser store misbehaves: disabled storage, quota limits and
/// individual failed deletes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,

    /// Keys whose removal fails
    failing_removals: RefCell<HashSet<String>>,

    /// Keys whose next N removals fail
    transient_removal_failures: RefCell<HashMap<String, u32>>,

    /// Keys whose writes fail
    failing_writes: RefCell<HashSet<String>>,

    /// Maximum total bytes (keys + values), if limited
    quota_bytes: Option<usize>,

    /// Every operation fails while set
    unavailable: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes beyond `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Default::default()
        }
    }

    /// Make removals of `key` fail
    pub fn fail_removal_of(&self, key: &str) {
        self.failing_removals.borrow_mut().insert(key.to_string());
    }

    /// Make only the next `times` removals of `key` fail
    pub fn fail_next_removals_of(&self, key: &str, times: u32) {
        self.transient_removal_failures
            .borrow_mut()
            .insert(key.to_string(), times);
    }

    /// Make writes to `key` fail
    pub fn fail_writes_to(&self, key: &str) {
        self.failing_writes.borrow_mut().insert(key.to_string());
    }

    /// Clear all injected per-key faults
    pub fn heal(&self) {
        self.failing_removals.borrow_mut().clear();
        self.transient_removal_failures.borrow_mut().clear();
        self.failing_writes.borrow_mut().clear();
        self.unavailable.set(false);
    }

    /// Simulate storage being disabled
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    /// Check presence without going through fault injection
    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Raw value without going through fault injection
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.get() {
            return Err(StoreError::Unavailable("storage is disabled".to_string()));
        }
        Ok(())
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check_available()?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_available()?;

        if self.failing_writes.borrow().contains(key) {
            return Err(StoreError::Unavailable(format!("write to {} rejected", key)));
        }

        if let Some(limit) = self.quota_bytes {
            let needed = self.used_bytes_without(key) + key.len() + value.len();
            if needed > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }

        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check_available()?;

        if self.failing_removals.borrow().contains(key) {
            return Err(StoreError::Unavailable(format!("removal of {} rejected", key)));
        }

        if let Some(remaining) = self.transient_removal_failures.borrow_mut().get_mut(key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StoreError::Unavailable(format!("removal of {} rejected", key)));
            }
        }

        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.check_available()?;
        Ok(self.entries.borrow().keys().cloned().collect())
    }
}

/// Durable store persisted as a single JSON object on disk
///
/// The whole map is rewritten after every mutation via a temp file and
/// rename, so a crash leaves either the old or the new contents.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RefCell<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, starting empty if the file does not exist
    ///
    /// An unparsable file is renamed to `<name>.corrupt` and the store starts
    /// empty. Only I/O failures are returned as errors.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let entries: BTreeMap<String, String> = if path.exists() {
            let text = fs::read_to_string(&path)?;
            if text.trim().is_empty() {
                BTreeMap::new()
            } else {
                match serde_json::from_str(&text) {
                    Ok(entries) => entries,
                    Err(e) => {
                        let aside = path.with_extension("corrupt");
                        warn!(
                            "Store file {} is unreadable ({}), moving it to {} and starting empty",
                            path.display(),
                            e,
                            aside.display()
                        );
                        fs::rename(&path, &aside)?;
                        BTreeMap::new()
                    }
                }
            }
        } else {
            BTreeMap::new()
        };

        debug!("Opened file store {} with {} keys", path.display(), entries.len());

        Ok(Self {
            path,
            entries: RefCell::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut updated = self.entries.borrow().clone();
        updated.insert(key.to_string(), value.to_string());
        self.persist(&updated)?;
        *self.entries.borrow_mut() = updated;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if !self.entries.borrow().contains_key(key) {
            return Ok(());
        }

        let mut updated = self.entries.borrow().clone();
        updated.remove(key);
        self.persist(&updated)?;
        *self.entries.borrow_mut() = updated;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_basic() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();

        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b").unwrap(), None);

        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_store_faults() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();

        store.fail_removal_of("a");
        assert!(store.remove("a").is_err());
        assert!(store.contains("a"));

        store.fail_writes_to("b");
        assert!(store.set("b", "2").is_err());

        store.set_unavailable(true);
        assert!(matches!(store.get("a"), Err(StoreError::Unavailable(_))));

        store.heal();
        store.remove("a").unwrap();
        store.set("b", "2").unwrap();
        assert_eq!(store.raw("b").as_deref(), Some("2"));
    }

    #[test]
    fn test_memory_store_transient_removal_failure() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();
        store.fail_next_removals_of("a", 1);

        assert!(store.remove("a").is_err());
        assert!(store.remove("a").is_ok());
        assert!(!store.contains("a"));
    }

    #[test]
    fn test_memory_store_quota() {
        let store = MemoryStore::with_quota(10);
        store.set("k", "12345").unwrap();

        // Replacing a value only counts the new size
        store.set("k", "123456789").unwrap();

        assert!(matches!(
            store.set("other", "xxxxxx"),
            Err(StoreError::QuotaExceeded { .. })
        ));
        assert!(!store.contains("other"));
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        {
            let store = FileStore::open(&path).unwrap();
            store.set("theme", "\"dark\"").unwrap();
            store.set("lang", "\"sw\"").unwrap();
            store.remove("lang").unwrap();
        }

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("theme").unwrap().as_deref(), Some("\"dark\""));
        assert_eq!(reopened.get("lang").unwrap(), None);
        assert_eq!(reopened.keys().unwrap(), vec!["theme".to_string()]);
    }

    #[test]
    fn test_file_store_recovers_from_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert!(store.keys().unwrap().is_empty());
        assert_eq!(fs::read_to_string(dir.path().join("store.corrupt")).unwrap(), "not json");

        store.set("theme", "\"dark\"").unwrap();
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("theme").unwrap().as_deref(), Some("\"dark\""));
    }
}
