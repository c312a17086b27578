//! JSON file persistence for config entries.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::entry::ConfigEntry;

/// Current storage schema version.
pub const STORAGE_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
/// Errors reading or writing the entry store.
pub enum StorageError {
    /// Filesystem failure.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The file exists but does not parse.
    #[error("Storage decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// The file was written by a newer schema.
    #[error("Unsupported storage version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Serialize, Deserialize)]
struct StorageFile {
    version: u32,
    entries: Vec<ConfigEntry>,
}

#[derive(Debug, Clone)]
/// On-disk store for the configured entries.
pub struct EntryStore {
    path: PathBuf,
}

impl EntryStore {
    /// Bind a store to a file path. Nothing is touched until load/save.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Load all persisted entries. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the file cannot be read, parsed, or
    /// was written by a newer schema version.
    pub fn load(&self) -> Result<Vec<ConfigEntry>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let file: StorageFile = serde_json::from_str(&raw)?;
        if file.version > STORAGE_VERSION {
            return Err(StorageError::UnsupportedVersion(file.version));
        }
        Ok(file.entries)
    }

    /// Persist the full entry list, replacing the previous contents.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when serialisation or the write fails.
    pub fn save(&self, entries: &[ConfigEntry]) -> Result<(), StorageError> {
        let file = StorageFile {
            version: STORAGE_VERSION,
            entries: entries.to_vec(),
        };
        let raw = serde_json::to_string_pretty(&file)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        // Write to a sibling then rename so a crash never leaves a torn file.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Uprn;

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = EntryStore::new(dir.path().join("entries.json"));
        assert!(store.load().expect("load").is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = EntryStore::new(dir.path().join("entries.json"));

        let entries = vec![
            ConfigEntry::new("12 Working Street", Uprn::new("100100123456")),
            ConfigEntry::new("14 Working Street", Uprn::new("100100123457")),
        ];
        store.save(&entries).expect("save");

        let loaded = store.load().expect("load");
        assert_eq!(loaded, entries);
    }

    #[test]
    fn newer_version_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("entries.json");
        fs::write(&path, "{\"version\": 99, \"entries\": []}").expect("write");

        let store = EntryStore::new(path);
        assert!(matches!(
            store.load(),
            Err(StorageError::UnsupportedVersion(99))
        ));
    }
}
