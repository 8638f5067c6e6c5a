use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use crate::{DataManagerError, StorageFullWarning};

/// Small synchronous string key/value storage.
pub trait ScalarStore: Send {
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, or refuse when the quota would be exceeded.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageFullWarning>;

    fn remove(&mut self, key: &str);
}

fn check_quota(key: &str, value: &str, used_by_others: usize, quota: usize) -> Result<(), StorageFullWarning> {
    let needed = used_by_others + key.len() + value.len();
    if needed > quota {
        return Err(StorageFullWarning {
            key: key.to_string(),
            needed,
            quota,
        });
    }
    Ok(())
}

/// In-process store. Clones share the same entries, which is how tests
/// model data surviving a restart.
#[derive(Debug, Clone)]
pub struct MemoryScalarStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    quota: usize,
}

impl Default for MemoryScalarStore {
    fn default() -> Self {
        Self::with_quota(super::DEFAULT_QUOTA_BYTES)
    }
}

impl MemoryScalarStore {
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            quota,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().map(|entries| entries.is_empty()).unwrap_or(true)
    }
}

impl ScalarStore for MemoryScalarStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageFullWarning> {
        let Ok(mut entries) = self.entries.lock() else {
            return Ok(());
        };

        let used_by_others = entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum();
        check_quota(key, value, used_by_others, self.quota)?;

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

/// One file per key inside a directory.
///
/// Values are written to a temporary file and renamed into place, so a
/// key file always holds either the old or the new value.
#[derive(Debug, Clone)]
pub struct FileScalarStore {
    dir: PathBuf,
    quota: usize,
}

impl FileScalarStore {
    pub fn open(dir: impl Into<PathBuf>, quota: usize) -> Result<Self, DataManagerError> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|err| DataManagerError::io(&dir, err))?;
        }

        Ok(Self { dir, quota })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.val"))
    }

    fn used_by_others(&self, key: &str) -> usize {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                let stem = path.file_stem()?.to_str()?.to_string();
                if path.extension()? != "val" || stem == key {
                    return None;
                }
                Some(stem.len() + entry.metadata().ok()?.len() as usize)
            })
            .sum()
    }

    fn write_atomic(&self, key: &str, value: &str) -> std::io::Result<()> {
        let tmp_path = self.dir.join(format!("{key}.tmp"));
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, self.key_path(key))
    }
}

impl ScalarStore for FileScalarStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.key_path(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageFullWarning> {
        check_quota(key, value, self.used_by_others(key), self.quota)?;

        // A failing disk is reported the same way as a full one: the value
        // is not persisted and the session carries on.
        self.write_atomic(key, value).map_err(|err| {
            tracing::error!("Failed to write {} to {:?}: {}", key, self.dir, err);
            StorageFullWarning {
                key: key.to_string(),
                needed: key.len() + value.len(),
                quota: self.quota,
            }
        })
    }

    fn remove(&mut self, key: &str) {
        let path = self.key_path(key);
        if let Err(err) = fs::remove_file(&path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove {:?}: {}", path, err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_clones_share_entries() {
        let mut store = MemoryScalarStore::default();
        let other = store.clone();

        store.set("a", "1").unwrap();
        assert_eq!(other.get("a").as_deref(), Some("1"));

        store.remove("a");
        assert!(other.get("a").is_none());
        assert!(other.is_empty());
    }

    #[test]
    fn memory_store_enforces_quota() {
        let mut store = MemoryScalarStore::with_quota(10);
        store.set("k", "12345").unwrap();

        let warning = store.set("j", "1234567").unwrap_err();
        assert_eq!(warning.key, "j");
        assert_eq!(warning.quota, 10);
        assert!(store.get("j").is_none());

        // Replacing an existing key only counts the new value.
        store.set("k", "123456789").unwrap();
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileScalarStore::open(dir.path().join("scalar"), 1024).unwrap();
        store.set("run_dist", "42.5").unwrap();

        let reopened = FileScalarStore::open(dir.path().join("scalar"), 1024).unwrap();
        assert_eq!(reopened.get("run_dist").as_deref(), Some("42.5"));
        assert!(!dir.path().join("scalar").join("run_dist.tmp").exists());
    }

    #[test]
    fn file_store_quota_counts_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileScalarStore::open(dir.path(), 20).unwrap();
        store.set("aaaa", "0123456789").unwrap();

        assert!(store.set("bbbb", "0123456789").is_err());
        assert!(store.get("bbbb").is_none());

        store.remove("aaaa");
        store.set("bbbb", "0123456789").unwrap();
        store.remove("missing");
    }
}
