//! Cooperative cancellation and progress reporting for long-running
//! operations.
//!
//! Each of scan, move and restore runs as one cancellable unit of work.
//! Callers hand the engine a [`TaskMonitor`]; the engine checks the cancel
//! flag between file-level steps and emits percentage/status updates through
//! the optional callback. Progress percentages are monotonically
//! non-decreasing and are always emitted before the terminal outcome.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag.
///
/// Cloning produces a handle to the same flag, so a controlling thread can
/// keep one clone and trip it while an engine polls another.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a new, untripped flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Irreversible for the lifetime of the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outcome of a cancellable operation, distinct from success and error.
///
/// A cancelled operation produces no result: a cancelled scan has no groups,
/// a cancelled move persists no batch (files already moved stay moved).
#[derive(Debug)]
pub enum Completion<T> {
    /// The operation ran to the end and produced a value.
    Done(T),
    /// Cancellation was observed at a checkpoint; no result is available.
    Cancelled,
}

impl<T> Completion<T> {
    /// Returns true for the `Cancelled` variant.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Converts into `Some(value)` when the operation completed.
    pub fn done(self) -> Option<T> {
        match self {
            Self::Done(value) => Some(value),
            Self::Cancelled => None,
        }
    }
}

type ProgressCallback = Box<dyn Fn(u8, &str) + Send + Sync>;

/// Bundles the cancel flag and the progress side-channel for one operation.
pub struct TaskMonitor {
    cancel: CancelFlag,
    callback: Option<ProgressCallback>,
}

impl TaskMonitor {
    /// Creates a monitor with a cancel flag but no progress reporting.
    pub fn new(cancel: CancelFlag) -> Self {
        Self {
            cancel,
            callback: None,
        }
    }

    /// Creates a monitor that forwards progress updates to `callback`.
    ///
    /// The callback receives a percentage in `0..=100` and a human-readable
    /// status string.
    pub fn with_callback<F>(cancel: CancelFlag, callback: F) -> Self
    where
        F: Fn(u8, &str) + Send + Sync + 'static,
    {
        Self {
            cancel,
            callback: Some(Box::new(callback)),
        }
    }

    /// Creates a monitor that never cancels and reports nothing.
    pub fn silent() -> Self {
        Self::new(CancelFlag::new())
    }

    /// Returns true once the associated flag has been tripped.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Emits a progress update through the callback, if any.
    pub fn report(&self, percent: u8, status: &str) {
        if let Some(callback) = &self.callback {
            callback(percent.min(100), status);
        }
    }
}
