//! Result model
//!
//! Every rewrite produces a `ProcessingResult`; the coordinator folds them
//! into `RunStats` and renders `FileReport`/`RunSummary` values.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::core::paths::normalize_path;

/// Per-file failure. Never aborts the run.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "cannot create temporary file for {} in {}: {source}",
        .path.display(),
        .dir.display()
    )]
    TempCreate {
        path: PathBuf,
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed while rewriting {}: {source}", .path.display())]
    Stream {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot replace {}: {source}", .path.display())]
    Replace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RewriteError {
    /// Kind of the underlying I/O failure
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            RewriteError::Open { source, .. }
            | RewriteError::TempCreate { source, .. }
            | RewriteError::Stream { source, .. }
            | RewriteError::Replace { source, .. } => source.kind(),
        }
    }
}

/// Outcome of normalizing one file.
///
/// `changed == false` means the file on disk was not touched at all.
#[derive(Debug)]
pub struct ProcessingResult {
    pub path: PathBuf,
    pub changed: bool,
    pub error: Option<RewriteError>,
}

impl ProcessingResult {
    pub fn unchanged(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            changed: false,
            error: None,
        }
    }

    pub fn changed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            changed: true,
            error: None,
        }
    }

    pub fn failed(path: impl Into<PathBuf>, error: RewriteError) -> Self {
        Self {
            path: path.into(),
            changed: false,
            error: Some(error),
        }
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    pub fn status(&self) -> FileStatus {
        if self.is_err() {
            FileStatus::Error
        } else if self.changed {
            FileStatus::Changed
        } else {
            FileStatus::Unchanged
        }
    }
}

/// Rendered status of a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Changed,
    Unchanged,
    Error,
}

/// Serializable view of a `ProcessingResult`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// Path as dispatched, using '/' as separator
    pub path: String,

    pub status: FileStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ProcessingResult> for FileReport {
    fn from(result: &ProcessingResult) -> Self {
        Self {
            path: normalize_path(&result.path),
            status: result.status(),
            error: result.error.as_ref().map(|e| e.to_string()),
        }
    }
}

/// Run counters. Owned by the single result consumer.
#[derive(Debug)]
pub struct RunStats {
    pub processed: usize,
    pub changed: usize,
    pub failed: usize,
    started: Instant,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            processed: 0,
            changed: 0,
            failed: 0,
            started: Instant::now(),
        }
    }

    /// Count a candidate handed to the pool
    pub fn record_dispatch(&mut self) {
        self.processed += 1;
    }

    /// Fold a finished rewrite into the counters
    pub fn record(&mut self, result: &ProcessingResult) {
        match result.status() {
            FileStatus::Changed => self.changed += 1,
            FileStatus::Error => self.failed += 1,
            FileStatus::Unchanged => {}
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Freeze the counters into a summary
    pub fn summary(&self, walk_error: Option<String>) -> RunSummary {
        RunSummary {
            processed: self.processed,
            changed: self.changed,
            failed: self.failed,
            elapsed_ms: self.elapsed().as_millis() as u64,
            elapsed: self.elapsed(),
            walk_error,
        }
    }
}

/// Final report of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub processed: usize,
    pub changed: usize,
    pub failed: usize,
    pub elapsed_ms: u64,

    #[serde(skip)]
    pub elapsed: Duration,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub walk_error: Option<String>,
}
