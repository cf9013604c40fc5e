//! Run coordinator
//!
//! Wires the scanner into the worker pool, drains pool events on the calling
//! thread and owns the run counters. Rendering goes to the supplied writer.

use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, error};

use crate::backends::filter::{GitignoreRules, GlobMatcher, IgnoreRules, NoIgnore};
use crate::backends::pool::{PoolEvent, WorkerPool};
use crate::backends::rewrite::rewrite;
use crate::backends::scan::{ScanError, Target, TreeScanner};
use crate::core::cancel::CancelToken;
use crate::core::model::{FileReport, RunStats, RunSummary};
use crate::core::render::{RenderConfig, Renderer};

/// Everything a run needs to know
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub target: Target,
    pub patterns: Vec<String>,
    pub respect_gitignore: bool,
    pub workers: usize,
    pub render: RenderConfig,
}

/// What a finished run reports back
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub walk_error: Option<ScanError>,
}

type CandidateIter = Box<dyn Iterator<Item = Result<PathBuf, ScanError>> + Send>;

/// Build the candidate sequence for a target
fn candidates(options: &RunOptions) -> Result<CandidateIter> {
    match &options.target {
        Target::File(path) => Ok(Box::new(std::iter::once(Ok::<_, ScanError>(path.clone())))),
        Target::Tree(root) => {
            let matcher = GlobMatcher::new(&options.patterns)?;
            let ignore: Box<dyn IgnoreRules> = if options.respect_gitignore {
                Box::new(GitignoreRules::load(root))
            } else {
                Box::new(NoIgnore)
            };
            let scanner = TreeScanner::new(
                root.clone(),
                options.patterns.clone(),
                ignore,
                Box::new(matcher),
            );
            Ok(Box::new(scanner.candidates()))
        }
    }
}

/// Normalize every candidate of `options.target`, writing reports to `out`
pub fn run_normalize(
    options: &RunOptions,
    cancel: CancelToken,
    out: &mut dyn Write,
) -> Result<RunOutcome> {
    let candidates = candidates(options)?;
    let renderer = Renderer::with_config(options.render);
    let collect_files = options.render.collects_files();

    let pool = WorkerPool::new(options.workers, cancel);
    debug!(workers = pool.workers(), target = ?options.target, "starting run");

    let mut stats = RunStats::new();
    let mut files: Vec<FileReport> = Vec::new();

    let handle = pool.run(candidates, rewrite);
    for event in handle.events() {
        match event {
            PoolEvent::Dispatched(path) => {
                stats.record_dispatch();
                debug!("Processing: {}", path.display());
            }
            PoolEvent::Finished(result) => {
                stats.record(&result);
                match &result.error {
                    Some(err) => {
                        error!(path = %result.path.display(), kind = ?err.kind(), "{}", err)
                    }
                    None if result.changed => debug!("Changed: {}", result.path.display()),
                    None => {}
                }

                let report = FileReport::from(&result);
                if let Some(line) = renderer.render_file(&report) {
                    writeln!(out, "{}", line)?;
                }
                if collect_files {
                    files.push(report);
                }
            }
        }
    }

    let walk_error = handle.finish().err();

    let summary = stats.summary(walk_error.as_ref().map(|e| e.to_string()));
    writeln!(out, "{}", renderer.render_summary(&summary, &files))?;
    out.flush()?;

    Ok(RunOutcome {
        summary,
        walk_error,
    })
}
