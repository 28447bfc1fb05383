//! Transactional move engine.
//!
//! Relocates selected groups into per-group sub-folders under
//! `<base>/duplicates_sorted/` and records every relocation in an
//! [`OperationBatch`], the unit of undo. The engine is best-effort per file
//! and atomic per file, never atomic across the batch: a file that vanished
//! or errors is added to the report's error list without aborting the rest.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::error::{SortError, SortResult};
use crate::fsops;
use crate::progress::{Completion, TaskMonitor};
use crate::scanner::Group;

/// Name of the batch destination root created under the base folder.
pub const BATCH_DIR_NAME: &str = "duplicates_sorted";

/// One completed relocation within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Where the file lived before the move.
    pub source_path: PathBuf,
    /// Where it ended up, after collision resolution.
    pub dest_path: PathBuf,
    /// Original display name of the file.
    pub file_name: String,
    /// Size in bytes at move time.
    pub file_size: u64,
    /// 1-based ordinal of the group within this batch.
    pub group_index: usize,
}

/// The full record of one move operation, the unit of undo.
///
/// `restored` is monotonic: it starts false and is set true exactly once by
/// [`crate::history::HistoryStore::mark_restored`] after a completed restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationBatch {
    /// Opaque unique token identifying this batch.
    pub operation_id: String,
    /// RFC 3339 timestamp of when the move ran.
    pub timestamp: String,
    /// The scanned root the files came from.
    pub source_folder: PathBuf,
    /// The root under which the group sub-folders were created.
    pub dest_folder: PathBuf,
    /// Every relocation performed, in execution order.
    pub move_records: Vec<MoveRecord>,
    /// Number of files actually moved.
    pub total_files: usize,
    /// Combined size of the moved files in bytes.
    pub total_size: u64,
    /// Whether this batch has been restored.
    pub restored: bool,
}

/// A finished move: the persistable batch plus the per-file failures that
/// are reported to the caller but never persisted.
#[derive(Debug)]
pub struct MoveReport {
    pub batch: OperationBatch,
    /// Names of files that vanished or failed, annotated with the underlying
    /// error where known.
    pub error_files: Vec<String>,
}

/// Generates an opaque 12-character operation id.
pub fn generate_operation_id() -> String {
    let mut hasher = DefaultHasher::new();
    Utc::now().to_rfc3339().hash(&mut hasher);
    std::process::id().hash(&mut hasher);
    let mut id = format!("{:016x}", hasher.finish());
    id.truncate(12);
    id
}

/// Relocates groups of files into isolated per-group folders.
pub struct MoveEngine;

impl MoveEngine {
    /// Moves every file of every selected group into
    /// `<base_folder>/duplicates_sorted/folder_<n>/`, where `n` is the
    /// group's 1-based position within this batch.
    ///
    /// Each file is re-verified at move time; name collisions inside a group
    /// folder are resolved by appending `_<n>` before the extension. Files
    /// that vanished or fail to move are collected into the report's error
    /// list and do not abort the batch.
    ///
    /// Cancellation is checked before each file. A cancelled move returns
    /// no report: files already moved stay moved, and nothing is persisted —
    /// the caller should treat this as an untracked partial state.
    ///
    /// # Errors
    ///
    /// Rejects a missing base folder or an empty selection before touching
    /// the filesystem; fails if a destination folder cannot be created.
    pub fn move_groups(
        groups: &[Group],
        base_folder: &Path,
        operation_id: &str,
        monitor: &TaskMonitor,
    ) -> SortResult<Completion<MoveReport>> {
        if !base_folder.is_dir() {
            return Err(SortError::InvalidInput {
                reason: format!("{} is not a directory", base_folder.display()),
            });
        }
        let total_files: usize = groups.iter().map(Group::len).sum();
        if total_files == 0 {
            return Err(SortError::InvalidInput {
                reason: "no files selected to move".to_string(),
            });
        }

        let dest_folder = base_folder.join(BATCH_DIR_NAME);
        fs::create_dir_all(&dest_folder).map_err(|e| SortError::DirectoryCreationFailed {
            path: dest_folder.clone(),
            source: e,
        })?;

        let mut move_records: Vec<MoveRecord> = Vec::new();
        let mut error_files: Vec<String> = Vec::new();
        let mut total_size: u64 = 0;
        let mut current_file = 0;

        for (position, group) in groups.iter().enumerate() {
            let group_index = position + 1;
            let group_folder = dest_folder.join(format!("folder_{}", group_index));
            fs::create_dir_all(&group_folder).map_err(|e| SortError::DirectoryCreationFailed {
                path: group_folder.clone(),
                source: e,
            })?;

            for file in group.files() {
                if monitor.is_cancelled() {
                    return Ok(Completion::Cancelled);
                }
                current_file += 1;

                // Re-check at move time: the file may have been moved or
                // deleted since selection. A vanished file still counts
                // towards progress.
                match fs::metadata(&file.path) {
                    Ok(metadata) if metadata.is_file() => {
                        let file_size = metadata.len();
                        let dest_path =
                            fsops::collision_free_path(&group_folder.join(&file.name), "_");

                        match fsops::move_file(&file.path, &dest_path) {
                            Ok(()) => {
                                move_records.push(MoveRecord {
                                    source_path: file.path.clone(),
                                    dest_path,
                                    file_name: file.name.clone(),
                                    file_size,
                                    group_index,
                                });
                                total_size += file_size;
                            }
                            Err(e) => {
                                error_files.push(format!("{} ({})", file.name, e));
                            }
                        }
                    }
                    _ => error_files.push(file.name.clone()),
                }

                let percent = (current_file * 100 / total_files) as u8;
                monitor.report(
                    percent,
                    &format!("Moving files... ({}/{})", current_file, total_files),
                );
            }
        }

        let moved = move_records.len();
        monitor.report(100, &format!("Move complete - {} files", moved));

        Ok(Completion::Done(MoveReport {
            batch: OperationBatch {
                operation_id: operation_id.to_string(),
                timestamp: Utc::now().to_rfc3339(),
                source_folder: base_folder.to_path_buf(),
                dest_folder,
                move_records,
                total_files: moved,
                total_size,
                restored: false,
            },
            error_files,
        }))
    }
}
