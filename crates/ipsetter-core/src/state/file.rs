// # File State Store
//
// File-based implementation of StateStore.
//
// ## Crash Recovery
//
// - Atomic writes: new state goes to a `.tmp` file which is renamed into place
// - Backup: the previous file is copied to `.backup` before each rename
// - Recovery: a corrupt main file is replaced by the backup on load; if the
//   backup is corrupt too, the store starts empty (the remembered identifier
//   is only a hint, so an empty store costs one extra listing)
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "records": {
//     "home.example.com": {
//       "record_id": "3352896",
//       "last_ip": "203.0.113.5",
//       "last_updated": "2025-01-09T12:00:00Z"
//     }
//   }
// }
// ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::{StateRecord, StateStore};

/// State file format version
const STATE_FILE_VERSION: &str = "1.0";

/// File-based state store with crash recovery
///
/// # Example
///
/// ```rust,no_run
/// use ipsetter_core::state::FileStateStore;
/// use ipsetter_core::traits::{StateRecord, StateStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/lib/ipsetter/state.json").await?;
///
///     let record = StateRecord::new("3352896".into(), "203.0.113.5".parse()?);
///     store.set_record("home.example.com", &record).await?;
///
///     let remembered = store.get_record("home.example.com").await?;
///     assert_eq!(remembered.map(|r| r.record_id), Some("3352896".into()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

/// Internal state for file-based store
#[derive(Debug)]
struct FileState {
    records: HashMap<String, StateRecord>,
    dirty: bool,
}

/// Serializable state file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StateFileFormat {
    version: String,
    records: HashMap<String, StateRecord>,
}

/// Why a state file could not be loaded
enum LoadError {
    /// The file exists but could not be read
    Unreadable(Error),
    /// The file was read but is not a valid state document
    Corrupt(Error),
}

impl FileStateStore {
    /// Create or load a file state store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Try to load the existing state file
    /// 3. If it is corrupt, try the backup
    /// 4. If both are corrupt, start with empty state
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::state_store(format!(
                        "Failed to create state directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let records = Self::load_state_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(FileState {
                records,
                dirty: false,
            })),
        })
    }

    /// Path of the main state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_state_with_recovery(
        path: &Path,
    ) -> Result<HashMap<String, StateRecord>, Error> {
        let corruption = match Self::load_state(path).await {
            Ok(records) => {
                tracing::debug!(records = records.len(), "Loaded state file");
                return Ok(records);
            }
            Err(LoadError::Unreadable(e)) => return Err(e),
            Err(LoadError::Corrupt(e)) => e,
        };

        tracing::warn!(
            "State file appears corrupted: {}. Attempting recovery from backup.",
            corruption
        );

        let backup_path = Self::backup_path(path);
        if !backup_path.exists() {
            tracing::warn!("No backup file found. Starting with empty state.");
            return Ok(HashMap::new());
        }

        match Self::load_state(&backup_path).await {
            Ok(records) => {
                tracing::info!(records = records.len(), "Recovered state from backup");

                if let Err(restore_err) = Self::restore_from_backup(path, &backup_path).await {
                    tracing::error!(
                        "Failed to restore state file from backup: {}",
                        restore_err
                    );
                }

                Ok(records)
            }
            Err(LoadError::Corrupt(e)) | Err(LoadError::Unreadable(e)) => {
                tracing::error!("Backup also unusable: {}. Starting with empty state.", e);
                Ok(HashMap::new())
            }
        }
    }

    async fn load_state(path: &Path) -> Result<HashMap<String, StateRecord>, LoadError> {
        if !path.exists() {
            tracing::debug!("State file does not exist: {}", path.display());
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            LoadError::Unreadable(Error::state_store(format!(
                "Failed to read state file {}: {}",
                path.display(),
                e
            )))
        })?;

        let state_file: StateFileFormat = serde_json::from_str(&content).map_err(|e| {
            LoadError::Corrupt(Error::state_store(format!(
                "Failed to parse state file {}: {}",
                path.display(),
                e
            )))
        })?;

        if state_file.version != STATE_FILE_VERSION {
            tracing::warn!(
                "State file version mismatch: expected {}, got {}. \
                Attempting to load anyway.",
                STATE_FILE_VERSION,
                state_file.version
            );
        }

        Ok(state_file.records)
    }

    /// Write state to file atomically
    async fn write_state(&self) -> Result<(), Error> {
        let mut state_guard = self.state.write().await;

        let state_file = StateFileFormat {
            version: STATE_FILE_VERSION.to_string(),
            records: state_guard.records.clone(),
        };

        let json = serde_json::to_string_pretty(&state_file)
            .map_err(|e| Error::state_store(format!("Failed to serialize state: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        state_guard.dirty = false;

        tracing::trace!("State written to file: {}", self.path.display());
        Ok(())
    }

    async fn restore_from_backup(path: &Path, backup_path: &Path) -> Result<(), Error> {
        fs::copy(backup_path, path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to restore from backup {} to {}: {}",
                backup_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!("Restored state file from backup");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get_record(&self, key: &str) -> Result<Option<StateRecord>, Error> {
        let state_guard = self.state.read().await;
        Ok(state_guard.records.get(key).cloned())
    }

    async fn set_record(&self, key: &str, record: &StateRecord) -> Result<(), Error> {
        {
            let mut state_guard = self.state.write().await;
            state_guard.records.insert(key.to_string(), record.clone());
            state_guard.dirty = true;
        }

        self.write_state().await
    }

    async fn delete_record(&self, key: &str) -> Result<(), Error> {
        {
            let mut state_guard = self.state.write().await;
            if state_guard.records.remove(key).is_none() {
                return Ok(());
            }
            state_guard.dirty = true;
        }

        self.write_state().await
    }

    async fn list_records(&self) -> Result<Vec<String>, Error> {
        let state_guard = self.state.read().await;
        Ok(state_guard.records.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        let dirty = self.state.read().await.dirty;
        if dirty {
            self.write_state().await
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordId;
    use std::net::IpAddr;
    use tempfile::tempdir;

    fn record(id: &str, ip: &str) -> StateRecord {
        StateRecord::new(RecordId::from(id), ip.parse::<IpAddr>().unwrap())
    }

    #[tokio::test]
    async fn test_file_store_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        assert!(store.list_records().await.unwrap().is_empty());

        store
            .set_record("home.example.com", &record("42", "203.0.113.5"))
            .await
            .unwrap();
        assert!(path.exists());

        // A new instance sees the persisted record
        let store2 = FileStateStore::new(&path).await.unwrap();
        let remembered = store2.get_record("home.example.com").await.unwrap().unwrap();
        assert_eq!(remembered.record_id, RecordId::from("42"));
        assert_eq!(remembered.last_ip, "203.0.113.5".parse::<IpAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        store
            .set_record("home.example.com", &record("1", "203.0.113.5"))
            .await
            .unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_file_store_corruption_recovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        store
            .set_record("home.example.com", &record("1", "203.0.113.5"))
            .await
            .unwrap();
        // Second write moves the first into the backup
        store
            .set_record("home.example.com", &record("2", "203.0.113.6"))
            .await
            .unwrap();

        let backup_path = FileStateStore::backup_path(&path);
        assert!(backup_path.exists(), "Backup file should exist after write");

        fs::write(&path, b"corrupted json data").await.unwrap();

        let store2 = FileStateStore::new(&path).await.unwrap();
        let recovered = store2.get_record("home.example.com").await.unwrap().unwrap();
        assert_eq!(
            recovered.record_id,
            RecordId::from("1"),
            "Backup should contain previous state, not latest"
        );

        // The main file was restored from the backup
        let restored = fs::read_to_string(&path).await.unwrap();
        assert!(restored.contains("\"1\""));
    }

    #[tokio::test]
    async fn test_file_store_starts_empty_when_everything_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        fs::write(&path, b"{").await.unwrap();
        fs::write(FileStateStore::backup_path(&path), b"also broken")
            .await
            .unwrap();

        let store = FileStateStore::new(&path).await.unwrap();
        assert!(store.list_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_delete_and_flush() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        store
            .set_record("home.example.com", &record("1", "203.0.113.5"))
            .await
            .unwrap();
        store.delete_record("home.example.com").await.unwrap();
        // Deleting an absent key is fine
        store.delete_record("home.example.com").await.unwrap();
        store.flush().await.unwrap();

        let store2 = FileStateStore::new(&path).await.unwrap();
        assert_eq!(store2.get_record("home.example.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_atomic_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();

        for i in 0..10 {
            store
                .set_record("home.example.com", &record(&i.to_string(), &format!("1.2.3.{i}")))
                .await
                .unwrap();
        }

        let store2 = FileStateStore::new(&path).await.unwrap();
        let last = store2.get_record("home.example.com").await.unwrap().unwrap();
        assert_eq!(last.record_id, RecordId::from("9"));
        assert!(!FileStateStore::backup_path(&path).with_extension("tmp").exists());
    }
}
