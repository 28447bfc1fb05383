//! Report export for scan results.
//!
//! Writes the final group list as either a plain-text report or a CSV table.
//! The format is chosen from the target file's extension.

use chrono::Local;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::{SortError, SortResult};
use crate::output::format_size;
use crate::scanner::Group;

/// Writes a report of `groups` to `path`, as CSV when the path ends in
/// `.csv` and plain text otherwise.
pub fn write_report(groups: &[Group], path: &Path) -> SortResult<()> {
    let is_csv = path
        .extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let result = if is_csv {
        write_csv(groups, path)
    } else {
        fs::write(path, render_text(groups))
    };

    result.map_err(|e| SortError::ReportWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

fn render_text(groups: &[Group]) -> String {
    let mut out = String::new();
    out.push_str(&"=".repeat(70));
    out.push('\n');
    out.push_str("Size-proximity report\n");
    out.push_str(&format!(
        "Generated: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&"=".repeat(70));
    out.push('\n');

    for (idx, group) in groups.iter().enumerate() {
        out.push_str(&format!(
            "\nGroup {} ({} files, {})\n",
            idx + 1,
            group.len(),
            format_size(group.total_size())
        ));
        out.push_str(&"-".repeat(70));
        out.push('\n');
        for file in group.files() {
            out.push_str(&format!("  - {}\n", file.name));
            out.push_str(&format!("    size: {}\n", format_size(file.size)));
            out.push_str(&format!("    path: {}\n", file.path.display()));
        }
    }

    out
}

fn write_csv(groups: &[Group], path: &Path) -> io::Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(io::Error::other)?;
    writer
        .write_record(["group", "name", "size_bytes", "size", "extension", "path"])
        .map_err(io::Error::other)?;

    for (idx, group) in groups.iter().enumerate() {
        for file in group.files() {
            writer
                .write_record([
                    (idx + 1).to_string(),
                    file.name.clone(),
                    file.size.to_string(),
                    format_size(file.size),
                    file.extension.clone(),
                    file.path.to_string_lossy().into_owned(),
                ])
                .map_err(io::Error::other)?;
        }
    }

    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::FileRecord;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn record(name: &str, size: u64, ext: &str) -> FileRecord {
        FileRecord {
            path: PathBuf::from("/data").join(name),
            name: name.to_string(),
            size,
            extension: ext.to_string(),
            created: None,
            modified: None,
        }
    }

    fn sample_groups() -> Vec<Group> {
        vec![Group::new(vec![
            record("a.txt", 1000, "txt"),
            record("b.txt", 1100, "txt"),
        ])]
    }

    #[test]
    fn test_text_report_lists_groups_and_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let report_path = temp_dir.path().join("report.txt");

        write_report(&sample_groups(), &report_path).expect("Report failed");

        let content = fs::read_to_string(&report_path).unwrap();
        assert!(content.contains("Group 1 (2 files"));
        assert!(content.contains("a.txt"));
        assert!(content.contains("/data/b.txt"));
    }

    #[test]
    fn test_csv_report_rows() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let report_path = temp_dir.path().join("report.csv");

        write_report(&sample_groups(), &report_path).expect("Report failed");

        let content = fs::read_to_string(&report_path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "group,name,size_bytes,size,extension,path");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1,a.txt,1000,"));
    }

    #[test]
    fn test_csv_quotes_awkward_names() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let report_path = temp_dir.path().join("report.csv");
        let groups = vec![Group::new(vec![
            record("has,comma.txt", 10, "txt"),
            record("has\rreturn.txt", 20, "txt"),
        ])];

        write_report(&groups, &report_path).expect("Report failed");

        let content = fs::read_to_string(&report_path).unwrap();
        assert!(content.contains("\"has,comma.txt\""));
        // A bare carriage return must not escape its field unquoted.
        assert!(content.contains("\"has\rreturn.txt\""));
    }

    #[test]
    fn test_unwritable_report_path_fails() {
        let result = write_report(&sample_groups(), Path::new("/non/existent/report.txt"));
        assert!(matches!(result, Err(SortError::ReportWriteFailed { .. })));
    }
}
