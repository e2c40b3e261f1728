use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Durable key-value storage for serialized worlds.
///
/// Implementations degrade rather than fail: `put` reports whether the
/// value was actually persisted, and callers treat `false` the same as
/// having no storage at all.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&mut self, key: &str, value: &str) -> bool;
}

/// File-per-key store rooted at a directory (`<dir>/<key>.json`).
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key)).ok()
    }

    fn put(&mut self, key: &str, value: &str) -> bool {
        if let Err(err) = fs::create_dir_all(&self.dir) {
            tracing::warn!(dir = %self.dir.display(), %err, "storage directory unavailable");
            return false;
        }
        match fs::write(self.path(key), value) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(key, %err, "storage write failed");
                false
            }
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: &str) -> bool {
        self.entries.insert(key.to_string(), value.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_under_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("storage"));
        assert!(store.get("world").is_none());
        assert!(store.put("world", "{\"bodies\":[]}"));
        assert_eq!(store.get("world").as_deref(), Some("{\"bodies\":[]}"));
    }

    #[test]
    fn memory_store_overwrites_in_place() {
        let mut store = MemoryStore::new();
        store.put("world", "first");
        store.put("world", "second");
        assert_eq!(store.get("world").as_deref(), Some("second"));
    }
}
