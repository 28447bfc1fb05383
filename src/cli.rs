//! Command-line interface and orchestration.
//!
//! This module wires the engines together:
//! - `scan` lists size-proximity groups (optionally exporting a report)
//! - `move` re-scans, resolves the group selection and runs the move engine
//! - `restore` reverses a recorded batch by operation id
//! - `history list` shows all recorded batches
//!
//! Selection, eligibility checks and history persistence live here, outside
//! the engines: a move takes an explicit list of groups, and a restore is
//! refused for already-restored batches before the engine ever runs.

use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::{AppConfig, CompiledFilters};
use crate::error::{SortError, SortResult};
use crate::history::HistoryStore;
use crate::mover::{MoveEngine, MoveReport, generate_operation_id};
use crate::output::{OutputFormatter, format_size};
use crate::progress::{CancelFlag, Completion, TaskMonitor};
use crate::report::write_report;
use crate::restore::RestoreEngine;
use crate::scanner::{Group, SizeGrouper, threshold_mb_to_bytes};

/// Group files by size proximity and isolate selected groups into
/// reversible batches.
#[derive(Debug, Parser)]
#[command(name = "sizesort", version)]
pub struct Cli {
    /// Path to a configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the history file (defaults to ~/.sizesort_history.json).
    #[arg(long, global = true, value_name = "FILE")]
    pub history_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan a directory and list size-proximity groups.
    Scan {
        /// The directory to scan (single level, non-recursive).
        dir: PathBuf,

        /// Proximity threshold in megabytes.
        #[arg(long, value_name = "MB")]
        threshold_mb: Option<f64>,

        /// Only group files sharing the anchor's extension.
        #[arg(long)]
        same_ext: bool,

        /// Export the group list (CSV for .csv paths, plain text otherwise).
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Move selected groups into isolated sub-folders under
    /// <dir>/duplicates_sorted/.
    Move {
        /// The directory to scan and move within.
        dir: PathBuf,

        /// Groups to move: "all" or a 1-based list with ranges, e.g. "1,3-5".
        #[arg(long, value_name = "SELECTION")]
        groups: String,

        /// Proximity threshold in megabytes.
        #[arg(long, value_name = "MB")]
        threshold_mb: Option<f64>,

        /// Only group files sharing the anchor's extension.
        #[arg(long)]
        same_ext: bool,
    },

    /// Restore a previously moved batch to its original locations.
    Restore {
        /// Operation id of the batch to restore (see `history list`).
        #[arg(long, value_name = "ID")]
        operation_id: String,
    },

    /// Inspect recorded operations.
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List all recorded batches, oldest first.
    List,
}

/// Runs the parsed command. Returns an error for the caller to print and
/// turn into a non-zero exit code.
pub fn run(cli: Cli) -> SortResult<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let store = match cli.history_file {
        Some(path) => HistoryStore::new(path),
        None => HistoryStore::open_default(),
    };

    match cli.command {
        Command::Scan {
            dir,
            threshold_mb,
            same_ext,
            report,
        } => run_scan_command(&config, &dir, threshold_mb, same_ext, report.as_deref()),
        Command::Move {
            dir,
            groups,
            threshold_mb,
            same_ext,
        } => run_move_command(&config, &store, &dir, &groups, threshold_mb, same_ext),
        Command::Restore { operation_id } => run_restore_command(&store, &operation_id),
        Command::History { command } => match command {
            HistoryCommand::List => {
                OutputFormatter::history_listing(&store.list()?);
                Ok(())
            }
        },
    }
}

fn run_scan_command(
    config: &AppConfig,
    dir: &Path,
    threshold_mb: Option<f64>,
    same_ext: bool,
    report: Option<&Path>,
) -> SortResult<()> {
    let Some(groups) = scan_with_progress(config, dir, threshold_mb, same_ext)? else {
        OutputFormatter::warning("Scan cancelled - no result.");
        return Ok(());
    };

    if groups.is_empty() {
        OutputFormatter::info("No size-proximate groups found.");
        return Ok(());
    }

    OutputFormatter::group_listing(&groups);

    if let Some(report_path) = report {
        write_report(&groups, report_path)?;
        OutputFormatter::success(&format!("Report written to {}", report_path.display()));
    }

    OutputFormatter::plain(&format!(
        "\nRun 'sizesort move {} --groups <selection>' to isolate groups.",
        dir.display()
    ));
    Ok(())
}

fn run_move_command(
    config: &AppConfig,
    store: &HistoryStore,
    dir: &Path,
    selection: &str,
    threshold_mb: Option<f64>,
    same_ext: bool,
) -> SortResult<()> {
    let Some(groups) = scan_with_progress(config, dir, threshold_mb, same_ext)? else {
        OutputFormatter::warning("Scan cancelled - no result.");
        return Ok(());
    };

    if groups.is_empty() {
        OutputFormatter::info("No size-proximate groups found; nothing to move.");
        return Ok(());
    }

    let indices = parse_group_selection(selection, groups.len())?;
    let selected: Vec<Group> = indices.iter().map(|&i| groups[i - 1].clone()).collect();
    let total_files: usize = selected.iter().map(Group::len).sum();
    OutputFormatter::info(&format!(
        "Moving {} files in {} groups...",
        total_files,
        selected.len()
    ));

    let operation_id = generate_operation_id();
    let bar = OutputFormatter::create_percent_bar();
    let monitor = bar_monitor(&bar);
    let completion = MoveEngine::move_groups(&selected, dir, &operation_id, &monitor);
    bar.finish_and_clear();

    let report: MoveReport = match completion? {
        Completion::Done(report) => report,
        Completion::Cancelled => {
            // Files already moved stay moved but were not recorded.
            OutputFormatter::warning(
                "Move cancelled - already-moved files remain moved and are untracked.",
            );
            return Ok(());
        }
    };

    store.append(&report.batch)?;

    OutputFormatter::success(&format!(
        "Moved {} files ({}) to {}",
        report.batch.total_files,
        format_size(report.batch.total_size),
        report.batch.dest_folder.display()
    ));
    OutputFormatter::error_file_listing(&report.error_files);
    OutputFormatter::plain(&format!(
        "Run 'sizesort restore --operation-id {}' to undo.",
        report.batch.operation_id
    ));
    Ok(())
}

fn run_restore_command(store: &HistoryStore, operation_id: &str) -> SortResult<()> {
    let batch = store
        .find(operation_id)?
        .ok_or_else(|| SortError::InvalidInput {
            reason: format!("unknown operation id: {}", operation_id),
        })?;

    if batch.restored {
        return Err(SortError::InvalidInput {
            reason: format!("operation {} has already been restored", operation_id),
        });
    }

    OutputFormatter::info(&format!(
        "Restoring {} files to {}...",
        batch.move_records.len(),
        batch.source_folder.display()
    ));

    let bar = OutputFormatter::create_percent_bar();
    let monitor = bar_monitor(&bar);
    let completion = RestoreEngine::restore(&batch, &monitor);
    bar.finish_and_clear();

    let result = match completion? {
        Completion::Done(result) => result,
        Completion::Cancelled => {
            OutputFormatter::warning("Restore cancelled - batch left unmarked.");
            return Ok(());
        }
    };

    store.mark_restored(operation_id)?;

    OutputFormatter::success(&format!(
        "Restored {} of {} files.",
        result.restored_count,
        batch.move_records.len()
    ));
    OutputFormatter::error_file_listing(&result.error_files);
    Ok(())
}

/// Runs a scan with an attached progress bar. `None` means cancelled.
fn scan_with_progress(
    config: &AppConfig,
    dir: &Path,
    threshold_mb: Option<f64>,
    same_ext: bool,
) -> SortResult<Option<Vec<Group>>> {
    let filters: CompiledFilters = config.compile_filters()?;
    let threshold_bytes =
        threshold_mb_to_bytes(threshold_mb.unwrap_or(config.defaults.threshold_mb));
    let same_extension_only = same_ext || config.defaults.same_extension_only;

    let bar = OutputFormatter::create_percent_bar();
    let monitor = bar_monitor(&bar);
    let completion =
        SizeGrouper::scan(dir, threshold_bytes, same_extension_only, &filters, &monitor);
    bar.finish_and_clear();

    Ok(completion?.done())
}

/// Builds a monitor whose progress callback drives an indicatif bar.
fn bar_monitor(bar: &indicatif::ProgressBar) -> TaskMonitor {
    let handle = bar.clone();
    TaskMonitor::with_callback(CancelFlag::new(), move |percent, status| {
        handle.set_position(u64::from(percent));
        handle.set_message(status.to_string());
    })
}

/// Parses a group selection against the current scan's group count.
///
/// Accepts "all", or a comma-separated list of 1-based ordinals and
/// inclusive ranges ("1,3-5"). Duplicates are collapsed; the result is
/// ascending.
pub fn parse_group_selection(selection: &str, group_count: usize) -> SortResult<Vec<usize>> {
    let selection = selection.trim();
    if selection.eq_ignore_ascii_case("all") {
        return Ok((1..=group_count).collect());
    }

    let mut indices = BTreeSet::new();
    for token in selection.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let (start, end) = match token.split_once('-') {
            Some((a, b)) => (parse_ordinal(a)?, parse_ordinal(b)?),
            None => {
                let n = parse_ordinal(token)?;
                (n, n)
            }
        };

        if start > end {
            return Err(SortError::InvalidInput {
                reason: format!("invalid group range '{}'", token),
            });
        }
        for n in start..=end {
            if n == 0 || n > group_count {
                return Err(SortError::InvalidInput {
                    reason: format!(
                        "group {} is out of range (scan found {} groups)",
                        n, group_count
                    ),
                });
            }
            indices.insert(n);
        }
    }

    if indices.is_empty() {
        return Err(SortError::InvalidInput {
            reason: "empty group selection".to_string(),
        });
    }
    Ok(indices.into_iter().collect())
}

fn parse_ordinal(token: &str) -> SortResult<usize> {
    token
        .trim()
        .parse::<usize>()
        .map_err(|_| SortError::InvalidInput {
            reason: format!("invalid group ordinal '{}'", token.trim()),
        })
}
