//! Persistence of operation batches across sessions.
//!
//! The store is a single JSON array of [`OperationBatch`] records, append-only
//! except for flipping a batch's `restored` flag. Default location is
//! `.sizesort_history.json` in the home directory; tests and embedding
//! callers can point the store anywhere.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{SortError, SortResult};
use crate::mover::OperationBatch;

/// File name of the default history store in the home directory.
pub const HISTORY_FILE_NAME: &str = ".sizesort_history.json";

/// JSON-file backed store of operation batches.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Creates a store backed by the given file. The file is created lazily
    /// on the first append.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Creates a store at the default location,
    /// `$HOME/.sizesort_history.json`, falling back to the current directory
    /// when HOME is unset.
    pub fn open_default() -> Self {
        let path = match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home).join(HISTORY_FILE_NAME),
            Err(_) => PathBuf::from(HISTORY_FILE_NAME),
        };
        Self::new(path)
    }

    /// The file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a batch to the store.
    pub fn append(&self, batch: &OperationBatch) -> SortResult<()> {
        let mut batches = self.list()?;
        batches.push(batch.clone());
        self.save(&batches)
    }

    /// Returns all recorded batches, oldest first. A missing history file is
    /// an empty store, not an error.
    pub fn list(&self) -> SortResult<Vec<OperationBatch>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| SortError::HistoryReadFailed { source: e })?;

        serde_json::from_str(&content).map_err(|e| SortError::InvalidHistoryFormat {
            reason: e.to_string(),
        })
    }

    /// Looks up a batch by its operation id.
    pub fn find(&self, operation_id: &str) -> SortResult<Option<OperationBatch>> {
        Ok(self
            .list()?
            .into_iter()
            .find(|batch| batch.operation_id == operation_id))
    }

    /// Flips a batch's `restored` flag to true. Returns whether a batch with
    /// that id was found. The flag is monotonic: marking an already-restored
    /// batch leaves it restored.
    pub fn mark_restored(&self, operation_id: &str) -> SortResult<bool> {
        let mut batches = self.list()?;
        let Some(batch) = batches
            .iter_mut()
            .find(|batch| batch.operation_id == operation_id)
        else {
            return Ok(false);
        };

        batch.restored = true;
        self.save(&batches)?;
        Ok(true)
    }

    fn save(&self, batches: &[OperationBatch]) -> SortResult<()> {
        let json = serde_json::to_string_pretty(batches).map_err(|e| {
            SortError::HistoryWriteFailed {
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()),
            }
        })?;

        fs::write(&self.path, json).map_err(|e| SortError::HistoryWriteFailed { source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_batch(id: &str) -> OperationBatch {
        OperationBatch {
            operation_id: id.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            source_folder: PathBuf::from("/data/in"),
            dest_folder: PathBuf::from("/data/in/duplicates_sorted"),
            move_records: Vec::new(),
            total_files: 0,
            total_size: 0,
            restored: false,
        }
    }

    fn store_in(temp_dir: &TempDir) -> HistoryStore {
        HistoryStore::new(temp_dir.path().join("history.json"))
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&temp_dir);
        assert!(store.list().expect("List failed").is_empty());
    }

    #[test]
    fn test_append_and_list_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&temp_dir);

        store.append(&sample_batch("op-a")).expect("Append failed");
        store.append(&sample_batch("op-b")).expect("Append failed");

        let batches = store.list().expect("List failed");
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].operation_id, "op-a");
        assert_eq!(batches[1].operation_id, "op-b");
    }

    #[test]
    fn test_find_by_operation_id() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&temp_dir);
        store.append(&sample_batch("op-a")).expect("Append failed");

        assert!(store.find("op-a").expect("Find failed").is_some());
        assert!(store.find("op-z").expect("Find failed").is_none());
    }

    #[test]
    fn test_mark_restored_flips_flag_once() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&temp_dir);
        store.append(&sample_batch("op-a")).expect("Append failed");

        assert!(store.mark_restored("op-a").expect("Mark failed"));
        let batch = store.find("op-a").expect("Find failed").unwrap();
        assert!(batch.restored);

        // Monotonic: a second mark keeps it restored.
        assert!(store.mark_restored("op-a").expect("Mark failed"));
        assert!(store.find("op-a").expect("Find failed").unwrap().restored);
    }

    #[test]
    fn test_mark_restored_unknown_id() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&temp_dir);
        assert!(!store.mark_restored("op-z").expect("Mark failed"));
    }

    #[test]
    fn test_corrupt_history_reports_format_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("history.json");
        fs::write(&path, "not json at all").expect("Failed to write file");

        let store = HistoryStore::new(path);
        assert!(matches!(
            store.list(),
            Err(SortError::InvalidHistoryFormat { .. })
        ));
    }
}
