use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::diff::PatchOp;

/// Errors raised while reading or writing reference and diff files.
/// All of them abort a harness run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn scenario_file(root: &Path, scenario: &str, frame: u32) -> PathBuf {
    root.join(scenario).join(format!("{scenario}-{frame}.json"))
}

fn write_pretty(path: &Path, doc: &Value) -> Result<(), StoreError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    let text = serde_json::to_string_pretty(doc).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// On-disk store of reference snapshots, one directory per scenario:
/// `<root>/<scenario>/<scenario>-<frame>.json`.
///
/// References are written on first encounter or on an explicit
/// re-baseline, and never deleted here.
#[derive(Debug, Clone)]
pub struct RefStore {
    root: PathBuf,
}

impl RefStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, scenario: &str, frame: u32) -> PathBuf {
        scenario_file(&self.root, scenario, frame)
    }

    /// Load the reference for a frame; `None` when no reference exists yet.
    pub fn load(&self, scenario: &str, frame: u32) -> Result<Option<Value>, StoreError> {
        let path = self.path(scenario, frame);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        let doc = serde_json::from_str(&text).map_err(|source| StoreError::Parse { path, source })?;
        Ok(Some(doc))
    }

    pub fn save(&self, scenario: &str, frame: u32, doc: &Value) -> Result<(), StoreError> {
        write_pretty(&self.path(scenario, frame), doc)
    }
}

/// On-disk store of diff logs, mirroring the reference layout.
#[derive(Debug, Clone)]
pub struct DiffStore {
    root: PathBuf,
}

impl DiffStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, scenario: &str, frame: u32) -> PathBuf {
        scenario_file(&self.root, scenario, frame)
    }

    /// Remove any diff output from a previous run.
    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Write {
                path: self.root.clone(),
                source,
            }),
        }
    }

    /// Create the (empty) diff directory for a run that wants diff logs.
    pub fn prepare(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Write {
            path: self.root.clone(),
            source,
        })
    }

    pub fn save(&self, scenario: &str, frame: u32, ops: &[PatchOp]) -> Result<(), StoreError> {
        let doc = serde_json::to_value(ops).unwrap_or(Value::Null);
        write_pretty(&self.path(scenario, frame), &doc)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn path_layout_groups_by_scenario() {
        let store = RefStore::new("refs");
        assert_eq!(
            store.path("stack", 10),
            PathBuf::from("refs/stack/stack-10.json")
        );
    }

    #[test]
    fn load_missing_reference_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = RefStore::new(dir.path());
        assert!(store.load("stack", 0).unwrap().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = RefStore::new(dir.path());
        let doc = json!({ "bodies": [1, 2, 3] });
        store.save("stack", 0, &doc).unwrap();
        assert_eq!(store.load("stack", 0).unwrap(), Some(doc));
    }

    #[test]
    fn corrupt_reference_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = RefStore::new(dir.path());
        let path = store.path("stack", 0);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();
        match store.load("stack", 0) {
            Err(StoreError::Parse { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn clear_removes_stale_diffs_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiffStore::new(dir.path().join("diffs"));
        store.clear().unwrap();

        store
            .save("stack", 0, &[crate::diff::PatchOp::Remove { path: "/x".to_string() }])
            .unwrap();
        assert!(store.path("stack", 0).exists());
        store.clear().unwrap();
        assert!(!store.path("stack", 0).exists());
    }
}
