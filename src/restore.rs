//! Restore engine: reverses a move batch from its recorded mapping.
//!
//! Only the batch record is trusted — the engine never re-derives state from
//! the disk beyond checking that each recorded destination still exists. A
//! destination that was externally renamed after the move is therefore
//! reported as missing, not located by content; that limitation is inherited
//! deliberately. Whether a batch is eligible for restore (its `restored`
//! flag) is the caller's concern, not re-validated here.

use std::fs;
use std::path::Path;

use crate::error::SortResult;
use crate::fsops;
use crate::mover::{MoveRecord, OperationBatch};
use crate::progress::{Completion, TaskMonitor};

/// Outcome of a restore pass over one batch.
#[derive(Debug)]
pub struct RestoreResult {
    /// Number of files moved back successfully.
    pub restored_count: usize,
    /// Names of files that could not be restored, annotated with the reason
    /// where known.
    pub error_files: Vec<String>,
}

/// Moves the files of a batch back to their original locations.
pub struct RestoreEngine;

impl RestoreEngine {
    /// Restores every move record of `batch`, in order.
    ///
    /// Per record: a missing destination is recorded as an error (already
    /// restored, deleted, or never completed) and skipped; the original
    /// parent directory is recreated if other cleanup pruned it; if the
    /// original path is now occupied, the file is diverted to a
    /// `_restored_<n>` name so the restore is never destructive.
    ///
    /// Afterwards the batch's per-group folders are removed if empty, then
    /// the batch root if it too is empty; removal failures are ignored.
    ///
    /// Cancellation is checked before each record.
    pub fn restore(
        batch: &OperationBatch,
        monitor: &TaskMonitor,
    ) -> SortResult<Completion<RestoreResult>> {
        let total = batch.move_records.len();
        let mut restored_count = 0;
        let mut error_files: Vec<String> = Vec::new();

        for (idx, record) in batch.move_records.iter().enumerate() {
            if monitor.is_cancelled() {
                return Ok(Completion::Cancelled);
            }

            if !record.dest_path.exists() {
                error_files.push(record.file_name.clone());
            } else {
                match Self::restore_record(record) {
                    Ok(()) => restored_count += 1,
                    Err(reason) => {
                        error_files.push(format!("{} ({})", record.file_name, reason))
                    }
                }
            }

            let percent = ((idx + 1) * 100 / total.max(1)) as u8;
            monitor.report(
                percent,
                &format!("Restoring files... ({}/{})", idx + 1, total),
            );
        }

        Self::prune_batch_folders(&batch.dest_folder);

        monitor.report(100, &format!("Restore complete - {} files", restored_count));
        Ok(Completion::Done(RestoreResult {
            restored_count,
            error_files,
        }))
    }

    fn restore_record(record: &MoveRecord) -> Result<(), String> {
        // The source tree may have been pruned since the move.
        if let Some(parent) = record.source_path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        // Never overwrite a file that has since taken the original slot.
        let target = fsops::collision_free_path(&record.source_path, "_restored_");

        fsops::move_file(&record.dest_path, &target).map_err(|e| e.to_string())
    }

    /// Best-effort cleanup: removes empty group folders, then the batch root
    /// if it ended up empty. Failures are silently ignored.
    fn prune_batch_folders(dest_folder: &Path) {
        let Ok(entries) = fs::read_dir(dest_folder) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() && fsops::dir_is_empty(&path) {
                let _ = fs::remove_dir(&path);
            }
        }
        if fsops::dir_is_empty(dest_folder) {
            let _ = fs::remove_dir(dest_folder);
        }
    }
}
