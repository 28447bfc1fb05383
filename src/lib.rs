//! sizesort - group files by size proximity and isolate them reversibly
//!
//! This library scans a directory for files whose sizes fall within a
//! threshold of each other, moves selected groups into per-group sub-folders
//! with collision-safe naming, records every relocation in a persistent
//! operation batch, and can fully reverse a batch from that record.

pub mod cli;
pub mod config;
pub mod error;
pub mod fsops;
pub mod history;
pub mod mover;
pub mod output;
pub mod progress;
pub mod report;
pub mod restore;
pub mod scanner;

pub use config::{AppConfig, CompiledFilters, ConfigError};
pub use error::{SortError, SortResult};
pub use history::HistoryStore;
pub use mover::{MoveEngine, MoveRecord, MoveReport, OperationBatch};
pub use progress::{CancelFlag, Completion, TaskMonitor};
pub use restore::{RestoreEngine, RestoreResult};
pub use scanner::{FileRecord, Group, SizeGrouper};
