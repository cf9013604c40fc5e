//! CLI module - Command-line interface definitions and handlers

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::backends::filter::parse_patterns;
use crate::backends::pool::DEFAULT_WORKERS;
use crate::backends::scan::Target;
use crate::core::cancel::CancelToken;
use crate::core::render::{OutputFormat, RenderConfig};
use crate::flows::run::{run_normalize, RunOptions};

/// sawmill - strip trailing whitespace and fix final newlines across a tree.
#[derive(Parser, Debug)]
#[command(name = "sawmill")]
#[command(
    author,
    version,
    about,
    long_about = r#"sawmill rewrites text files into a canonical form:

- trailing spaces and tabs are removed from every line
- blank lines at the start and end of a file are removed
- blank lines between content are kept as they are
- every non-empty file ends with exactly one newline

Files that are already canonical are never touched (their mtime stays put).
Changed files are replaced atomically through a temporary file in the same
directory.

Examples:
    sawmill
    sawmill src --pattern "*.rs,*.toml"
    sawmill README.md
    sawmill -u --workers 8 --format jsonl
"#
)]
pub struct Cli {
    /// File or directory to normalize.
    #[arg(
        value_name = "PATH",
        default_value = ".",
        long_help = "File or directory to normalize (defaults to the current directory).\n\n\
A directory is walked recursively and filtered by --pattern and .gitignore.\n\
A single file is always processed, whatever its name."
    )]
    pub path: PathBuf,

    /// Comma-separated list of file patterns to process.
    #[arg(
        short,
        long,
        env = "SAWMILL_PATTERN",
        value_name = "GLOBS",
        long_help = "Comma-separated list of glob patterns matched against file names.\n\n\
Example: --pattern \"*.rs,*.md,Dockerfile.*\"\n\n\
If omitted, a built-in list of common source and config extensions is used."
    )]
    pub pattern: Option<String>,

    /// Number of concurrent workers.
    #[arg(
        short,
        long,
        env = "SAWMILL_WORKERS",
        default_value_t = DEFAULT_WORKERS,
        value_name = "N",
        long_help = "Number of files rewritten concurrently. Values below 1 are treated as 1."
    )]
    pub workers: usize,

    /// Process files even if .gitignore excludes them.
    #[arg(
        short = 'u',
        long,
        long_help = "Ignore .gitignore entries and process every file matching --pattern.\n\n\
.git directories are still skipped."
    )]
    pub no_ignore: bool,

    /// Verbose mode (log every processed and changed file).
    #[arg(
        short,
        long,
        long_help = "Log every dispatched, skipped and changed file to stderr.\n\n\
RUST_LOG takes precedence when set."
    )]
    pub verbose: bool,

    /// Summary format (text/json/jsonl).
    #[arg(
        long,
        default_value = "text",
        value_parser = ["text", "json", "jsonl"],
        value_name = "FORMAT",
        long_help = "Select the report format written to stdout.\n\n\
Supported values:\n\
- text (default): one summary line\n\
- json: a single document with the summary and every file\n\
- jsonl: one JSON object per file as it finishes, then the summary"
    )]
    pub format: String,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let format: OutputFormat = cli.format.parse().unwrap_or_default();
    let color = !cli.no_color && std::io::stdout().is_terminal();
    if !color {
        colored::control::set_override(false);
    }

    let target = Target::resolve(&cli.path)
        .with_context(|| format!("Cannot access {}", cli.path.display()))?;
    let patterns = parse_patterns(cli.pattern.as_deref())?;

    let options = RunOptions {
        target,
        patterns,
        respect_gitignore: !cli.no_ignore,
        workers: cli.workers,
        render: RenderConfig::new(format, color),
    };

    let cancel = CancelToken::new();
    if let Err(err) = cancel.install_ctrlc_handler() {
        warn!(error = %err, "Ctrl-C handler not installed");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let outcome = run_normalize(&options, cancel, &mut out)?;
    debug!(
        processed = outcome.summary.processed,
        changed = outcome.summary.changed,
        failed = outcome.summary.failed,
        "run finished"
    );

    match outcome.walk_error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
