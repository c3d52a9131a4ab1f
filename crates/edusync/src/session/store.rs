//! Durable single-slot session storage.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, instrument};

use super::models::SessionRecord;

/// Fixed key the session record is stored under.
pub const DEFAULT_SESSION_KEY: &str = "eduSyncUser";

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Session store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored record exists but cannot be parsed.
    #[error("corrupt session record: {0}")]
    Corrupt(String),

    /// Record could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Storage for the one session record of a running client.
///
/// Reads and writes are synchronous: the session is consulted on every
/// navigation and must never suspend.
pub trait SessionStore: Send + Sync {
    /// Read the stored record, if any.
    fn load(&self) -> StoreResult<Option<SessionRecord>>;

    /// Replace the stored record.
    fn save(&self, record: &SessionRecord) -> StoreResult<()>;

    /// Remove the stored record. Removing a missing record is not an error.
    fn clear(&self) -> StoreResult<()>;
}

/// File-backed store: one JSON file named after the session key.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store `<dir>/<key>.json`.
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> StoreResult<Option<SessionRecord>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let record = serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        debug!("loaded session record");
        Ok(Some(record))
    }

    #[instrument(skip(self, record), fields(path = %self.path.display()))]
    fn save(&self, record: &SessionRecord) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write-then-rename: readers never see a partial record.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(record)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!("saved session record");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn clear(&self) -> StoreResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("cleared session record");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

/// In-memory store, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a record.
    pub fn with_record(record: SessionRecord) -> Self {
        Self {
            slot: Mutex::new(Some(record)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> StoreResult<Option<SessionRecord>> {
        Ok(self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, record: &SessionRecord) -> StoreResult<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record() -> SessionRecord {
        SessionRecord {
            id: "7".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            token: "a.b.c".to_string(),
        }
    }

    #[test]
    fn test_file_store_lifecycle() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path(), DEFAULT_SESSION_KEY);
        assert!(store.path().ends_with("eduSyncUser.json"));

        assert_eq!(store.load().unwrap(), None);

        store.save(&record()).unwrap();
        assert_eq!(store.load().unwrap(), Some(record()));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);

        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("state"), "k");
        store.save(&record()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_file_store_corrupt_record() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path(), DEFAULT_SESSION_KEY);
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert_eq!(store.load().unwrap(), None);
        store.save(&record()).unwrap();
        assert_eq!(store.load().unwrap(), Some(record()));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);

        let seeded = MemorySessionStore::with_record(record());
        assert_eq!(seeded.load().unwrap(), Some(record()));
    }
}
