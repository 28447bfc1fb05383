//! Output formatting and styling.
//!
//! Centralizes all CLI output: colored status messages, the percentage
//! progress bar fed by engine callbacks, and the group/history listings.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::mover::OperationBatch;
use crate::scanner::Group;

/// Formats a byte count as a human-readable size (B/KB/MB/GB/TB).
pub fn format_size(size: u64) -> String {
    let mut value = size as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if value < 1024.0 {
            return format!("{:.2} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.2} TB", value)
}

/// Manages all CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red to stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a percentage progress bar ready to be fed from a
    /// [`crate::progress::TaskMonitor`] callback.
    pub fn create_percent_bar() -> ProgressBar {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints the scan result: a stats line followed by each group's members.
    ///
    /// Potential savings assumes everything but the largest member of each
    /// group is redundant.
    pub fn group_listing(groups: &[Group]) {
        let total_files: usize = groups.iter().map(Group::len).sum();
        let total_size: u64 = groups.iter().map(Group::total_size).sum();
        let potential_savings: u64 = groups
            .iter()
            .map(|g| {
                let largest = g.files().iter().map(|f| f.size).max().unwrap_or(0);
                g.total_size() - largest
            })
            .sum();

        Self::header(&format!(
            "{} groups | {} files | total {} | potential savings {}",
            groups.len(),
            total_files,
            format_size(total_size),
            format_size(potential_savings)
        ));

        for (idx, group) in groups.iter().enumerate() {
            println!(
                "\n{} ({} files, {})",
                format!("Group {}", idx + 1).bold().cyan(),
                group.len(),
                format_size(group.total_size())
            );
            for file in group.files() {
                let extension = if file.extension.is_empty() {
                    "-".to_string()
                } else {
                    file.extension.clone()
                };
                let modified = file
                    .modified
                    .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  {:>10}  {:<6}  {}  {}",
                    format_size(file.size).green(),
                    extension,
                    modified,
                    file.name
                );
            }
        }
    }

    /// Prints one line per recorded batch, newest last.
    pub fn history_listing(batches: &[OperationBatch]) {
        if batches.is_empty() {
            Self::info("No recorded operations.");
            return;
        }

        Self::header("Operation history");
        for batch in batches {
            let status = if batch.restored {
                "restored".dimmed()
            } else {
                "restorable".green()
            };
            println!(
                "  {}  {}  {:>4} files  {:>10}  [{}]",
                batch.operation_id.bold(),
                batch.timestamp,
                batch.total_files,
                format_size(batch.total_size),
                status
            );
        }
    }

    /// Prints the per-file failures of a move or restore.
    pub fn error_file_listing(error_files: &[String]) {
        if error_files.is_empty() {
            return;
        }
        Self::warning(&format!("{} files could not be processed:", error_files.len()));
        for name in error_files {
            println!("    - {}", name);
        }
    }
}
