//! Size-proximity scanning and grouping.
//!
//! A scan enumerates the regular files directly inside a directory (no
//! recursion), then partitions them into groups whose members are within a
//! byte-size threshold of the group's *anchor* — the smallest file that
//! opened the group. Membership is anchor-relative, not pairwise: a chain of
//! intermediate files can associate two members that are further than the
//! threshold apart from each other. Groups with fewer than two members are
//! never emitted.

use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CompiledFilters;
use crate::error::{SortError, SortResult};
use crate::progress::{Completion, TaskMonitor};

/// Converts a threshold in megabytes to bytes, truncating.
///
/// 0.3 MB becomes 314572 bytes.
pub fn threshold_mb_to_bytes(threshold_mb: f64) -> u64 {
    (threshold_mb * 1024.0 * 1024.0) as u64
}

/// Metadata for one scanned file. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Display name (final path component).
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Lower-cased extension without the leading dot; empty when absent.
    pub extension: String,
    /// Creation timestamp, when the platform reports one.
    pub created: Option<DateTime<Local>>,
    /// Last modification timestamp, when available.
    pub modified: Option<DateTime<Local>>,
}

impl FileRecord {
    /// Reads the metadata for a regular file.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
            extension,
            created: metadata.created().ok().map(DateTime::<Local>::from),
            modified: metadata.modified().ok().map(DateTime::<Local>::from),
        })
    }
}

/// An ordered collection of size-proximate files.
///
/// The first member is always the anchor (the smallest file); every other
/// member is within the scan threshold of it.
#[derive(Debug, Clone)]
pub struct Group {
    files: Vec<FileRecord>,
}

impl Group {
    /// Builds a group from an already-ordered member list.
    ///
    /// Scans only emit groups with at least two members; this constructor
    /// exists for callers assembling a selection by hand and does not
    /// re-validate proximity.
    pub fn new(files: Vec<FileRecord>) -> Self {
        Self { files }
    }

    /// The members, anchor first.
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    /// The smallest member, against which proximity was measured.
    pub fn anchor(&self) -> &FileRecord {
        &self.files[0]
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Combined size of all members in bytes.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// Scans a directory and groups its files by size proximity.
pub struct SizeGrouper;

impl SizeGrouper {
    /// Enumerates the files directly inside `dir` and partitions them into
    /// size-proximity groups.
    ///
    /// Individual entries that cannot be stat'ed (broken links, permission
    /// errors) are skipped; a failure to read the directory itself is fatal.
    /// Files rejected by `filters` never enter the grouping phase.
    ///
    /// Progress covers 0–50% for the enumeration phase and 50–100% for the
    /// grouping phase. Cancellation is checked between files and between
    /// candidate pairs; a cancelled scan yields no result.
    ///
    /// # Arguments
    ///
    /// * `dir` - The directory to scan (single level)
    /// * `threshold_bytes` - Maximum size difference from the group anchor
    /// * `same_extension_only` - Restrict members to the anchor's extension
    /// * `filters` - Compiled exclusion rules
    /// * `monitor` - Cancellation and progress sink
    pub fn scan(
        dir: &Path,
        threshold_bytes: u64,
        same_extension_only: bool,
        filters: &CompiledFilters,
        monitor: &TaskMonitor,
    ) -> SortResult<Completion<Vec<Group>>> {
        if !dir.is_dir() {
            return Err(SortError::InvalidInput {
                reason: format!("{} is not a directory", dir.display()),
            });
        }

        let entries: Vec<_> = fs::read_dir(dir)
            .map_err(|e| SortError::DirectoryRead {
                path: dir.to_path_buf(),
                source: e,
            })?
            .flatten()
            .collect();
        let total_entries = entries.len();

        let mut records: Vec<FileRecord> = Vec::new();
        for (idx, entry) in entries.iter().enumerate() {
            if monitor.is_cancelled() {
                return Ok(Completion::Cancelled);
            }

            // Follows symlinks: a link to a regular file participates with
            // its target's size; a broken link fails the stat and is skipped.
            let path = entry.path();
            if path.metadata().map(|m| m.is_file()).unwrap_or(false)
                && filters.should_include(&path)
                && let Ok(record) = FileRecord::from_path(&path)
            {
                records.push(record);
            }

            let percent = ((idx + 1) * 50 / total_entries.max(1)) as u8;
            monitor.report(
                percent,
                &format!("Scanning files... ({}/{})", idx + 1, total_entries),
            );
        }

        monitor.report(50, "Analyzing size proximity...");
        records.sort_by_key(|r| r.size);

        let total_files = records.len();
        let mut claimed = vec![false; total_files];
        let mut groups: Vec<Group> = Vec::new();

        for i in 0..total_files {
            if monitor.is_cancelled() {
                return Ok(Completion::Cancelled);
            }
            if claimed[i] {
                continue;
            }

            claimed[i] = true;
            let mut members = vec![i];

            for j in (i + 1)..total_files {
                if monitor.is_cancelled() {
                    return Ok(Completion::Cancelled);
                }
                if claimed[j] {
                    continue;
                }

                // Sorted input: once a file overshoots the anchor, all later
                // files do too.
                if records[j].size - records[i].size > threshold_bytes {
                    break;
                }

                // An extension mismatch excludes the file but does not stop
                // the proximity scan.
                if same_extension_only && records[j].extension != records[i].extension {
                    continue;
                }

                claimed[j] = true;
                members.push(j);
            }

            if members.len() > 1 {
                groups.push(Group::new(
                    members.iter().map(|&k| records[k].clone()).collect(),
                ));
            }

            let percent = (50 + (i + 1) * 50 / total_files) as u8;
            monitor.report(
                percent,
                &format!("Analyzing groups... ({} found)", groups.len()),
            );
        }

        monitor.report(100, &format!("Scan complete - {} groups", groups.len()));
        Ok(Completion::Done(groups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::CancelFlag;
    use std::fs::File;
    use tempfile::TempDir;

    /// Creates a sparse file of exactly `size` bytes.
    fn make_file(dir: &Path, name: &str, size: u64) {
        let file = File::create(dir.join(name)).expect("Failed to create file");
        file.set_len(size).expect("Failed to size file");
    }

    fn scan(dir: &Path, threshold_bytes: u64, same_ext: bool) -> Vec<Group> {
        SizeGrouper::scan(
            dir,
            threshold_bytes,
            same_ext,
            &CompiledFilters::default_rules(),
            &TaskMonitor::silent(),
        )
        .expect("Scan failed")
        .done()
        .expect("Scan was cancelled")
    }

    #[test]
    fn test_threshold_mb_conversion_truncates() {
        assert_eq!(threshold_mb_to_bytes(0.3), 314572);
        assert_eq!(threshold_mb_to_bytes(10.0), 10 * 1024 * 1024);
    }

    #[test]
    fn test_small_threshold_excludes_outlier() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        make_file(temp_dir.path(), "a.bin", 1_000_000);
        make_file(temp_dir.path(), "b.bin", 1_200_000);
        make_file(temp_dir.path(), "c.bin", 5_000_000);

        let groups = scan(temp_dir.path(), threshold_mb_to_bytes(0.3), false);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
        let names: Vec<_> = groups[0].files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.bin", "b.bin"]);
    }

    #[test]
    fn test_large_threshold_groups_all_anchor_relative() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        make_file(temp_dir.path(), "a.bin", 1_000_000);
        make_file(temp_dir.path(), "b.bin", 1_200_000);
        make_file(temp_dir.path(), "c.bin", 5_000_000);

        let groups = scan(temp_dir.path(), threshold_mb_to_bytes(10.0), false);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
        assert_eq!(groups[0].anchor().size, 1_000_000);
    }

    #[test]
    fn test_members_within_threshold_of_anchor() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        make_file(temp_dir.path(), "a", 0);
        make_file(temp_dir.path(), "b", 50);
        make_file(temp_dir.path(), "c", 100);
        make_file(temp_dir.path(), "d", 150);

        // 100 is beyond 60 of anchor 0, so the chain splits into two groups.
        let groups = scan(temp_dir.path(), 60, false);

        assert_eq!(groups.len(), 2);
        for group in &groups {
            let anchor = group.anchor().size;
            for member in group.files() {
                assert!(member.size - anchor <= 60);
            }
        }
    }

    #[test]
    fn test_singletons_not_emitted() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        make_file(temp_dir.path(), "a", 100);
        make_file(temp_dir.path(), "b", 10_000);

        let groups = scan(temp_dir.path(), 10, false);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_same_extension_skips_without_stopping() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        make_file(temp_dir.path(), "a.txt", 100);
        make_file(temp_dir.path(), "b.jpg", 150);
        make_file(temp_dir.path(), "c.txt", 200);

        let groups = scan(temp_dir.path(), 1000, true);

        // b.jpg is skipped but the scan continues past it to c.txt.
        assert_eq!(groups.len(), 1);
        let names: Vec<_> = groups[0].files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "c.txt"]);
        for member in groups[0].files() {
            assert_eq!(member.extension, groups[0].anchor().extension);
        }
    }

    #[test]
    fn test_scan_is_idempotent() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        make_file(temp_dir.path(), "a.bin", 500);
        make_file(temp_dir.path(), "b.bin", 600);
        make_file(temp_dir.path(), "c.bin", 650);

        let first = scan(temp_dir.path(), 200, false);
        let second = scan(temp_dir.path(), 200, false);

        assert_eq!(first.len(), second.len());
        for (g1, g2) in first.iter().zip(second.iter()) {
            let p1: Vec<_> = g1.files().iter().map(|f| f.path.clone()).collect();
            let p2: Vec<_> = g2.files().iter().map(|f| f.path.clone()).collect();
            assert_eq!(p1, p2);
        }
    }

    #[test]
    fn test_hidden_files_filtered_out() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        make_file(temp_dir.path(), ".hidden", 100);
        make_file(temp_dir.path(), "visible", 100);

        let groups = scan(temp_dir.path(), 10, false);
        assert!(groups.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_regular_file_is_grouped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let scan_dir = temp_dir.path().join("scan");
        fs::create_dir(&scan_dir).expect("Failed to create subdir");
        make_file(temp_dir.path(), "target.bin", 1010);
        make_file(&scan_dir, "a.bin", 1000);
        std::os::unix::fs::symlink(
            temp_dir.path().join("target.bin"),
            scan_dir.join("link.bin"),
        )
        .expect("Failed to create symlink");

        let groups = scan(&scan_dir, 50, false);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
        // The link participates with its target's size.
        assert!(
            groups[0]
                .files()
                .iter()
                .any(|f| f.name == "link.bin" && f.size == 1010)
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_is_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        make_file(temp_dir.path(), "a.bin", 100);
        make_file(temp_dir.path(), "b.bin", 110);
        std::os::unix::fs::symlink(
            temp_dir.path().join("missing.bin"),
            temp_dir.path().join("dangling.bin"),
        )
        .expect("Failed to create symlink");

        let groups = scan(temp_dir.path(), 50, false);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn test_subdirectories_not_recursed() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let sub = temp_dir.path().join("sub");
        fs::create_dir(&sub).expect("Failed to create subdir");
        make_file(&sub, "a.bin", 100);
        make_file(&sub, "b.bin", 100);
        make_file(temp_dir.path(), "top.bin", 100);

        let groups = scan(temp_dir.path(), 10, false);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let groups = scan(temp_dir.path(), 100, false);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_missing_directory_is_invalid_input() {
        let result = SizeGrouper::scan(
            Path::new("/non/existent/path"),
            100,
            false,
            &CompiledFilters::default_rules(),
            &TaskMonitor::silent(),
        );
        assert!(matches!(result, Err(SortError::InvalidInput { .. })));
    }

    #[test]
    fn test_cancelled_scan_returns_no_result() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        make_file(temp_dir.path(), "a.bin", 100);
        make_file(temp_dir.path(), "b.bin", 100);

        let cancel = CancelFlag::new();
        cancel.cancel();
        let monitor = TaskMonitor::new(cancel);

        let completion = SizeGrouper::scan(
            temp_dir.path(),
            100,
            false,
            &CompiledFilters::default_rules(),
            &monitor,
        )
        .expect("Scan failed");
        assert!(completion.is_cancelled());
    }

    #[test]
    fn test_progress_is_monotonic_and_ends_at_100() {
        use std::sync::{Arc, Mutex};

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        make_file(temp_dir.path(), "a.bin", 100);
        make_file(temp_dir.path(), "b.bin", 110);
        make_file(temp_dir.path(), "c.bin", 120);

        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&updates);
        let monitor = TaskMonitor::with_callback(CancelFlag::new(), move |pct, _| {
            sink.lock().unwrap().push(pct);
        });

        SizeGrouper::scan(
            temp_dir.path(),
            100,
            false,
            &CompiledFilters::default_rules(),
            &monitor,
        )
        .expect("Scan failed");

        let recorded = updates.lock().unwrap();
        assert!(recorded.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*recorded.last().unwrap(), 100);
    }
}
