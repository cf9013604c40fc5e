//! Renderer module
//!
//! Renders per-file reports and the run summary as text, json or jsonl.

use colored::Colorize;
use std::time::Duration;

use crate::core::model::{FileReport, RunSummary};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Jsonl,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "jsonl" => Ok(OutputFormat::Jsonl),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub color: bool,
}

impl RenderConfig {
    pub fn new(format: OutputFormat, color: bool) -> Self {
        Self { format, color }
    }

    /// Whether per-file reports have to be kept until the summary
    pub fn collects_files(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

/// Renderer for run results
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render one finished file, if the format streams per-file lines
    pub fn render_file(&self, report: &FileReport) -> Option<String> {
        match self.config.format {
            OutputFormat::Jsonl => serde_json::to_string(report).ok(),
            OutputFormat::Text | OutputFormat::Json => None,
        }
    }

    /// Render the final summary. `files` is only consulted for json.
    pub fn render_summary(&self, summary: &RunSummary, files: &[FileReport]) -> String {
        match self.config.format {
            OutputFormat::Text => self.render_text(summary),
            OutputFormat::Jsonl => {
                let line = serde_json::json!({ "summary": summary });
                line.to_string()
            }
            OutputFormat::Json => {
                let doc = serde_json::json!({ "summary": summary, "files": files });
                serde_json::to_string_pretty(&doc).unwrap_or_else(|_| "{}".to_string())
            }
        }
    }

    fn render_text(&self, summary: &RunSummary) -> String {
        let elapsed = format_elapsed(summary.elapsed);
        let processed = summary.processed.to_string();
        let changed = summary.changed.to_string();
        let failed = summary.failed.to_string();

        let (processed, changed, failed) = if self.config.color {
            (
                processed.bold().to_string(),
                if summary.changed > 0 {
                    changed.yellow().bold().to_string()
                } else {
                    changed.green().to_string()
                },
                failed.red().bold().to_string(),
            )
        } else {
            (processed, changed, failed)
        };

        let mut line = format!(
            "Processed {} files, changed {} files",
            processed, changed
        );
        if summary.failed > 0 {
            line.push_str(&format!(", {} failed", failed));
        }
        line.push_str(&format!(" in {}.", elapsed));
        line
    }
}

/// Human duration: 10ms resolution above one second, 10µs below.
pub fn format_elapsed(elapsed: Duration) -> String {
    if elapsed > Duration::from_secs(1) {
        let centis = (elapsed.as_millis() + 5) / 10;
        let text = format!("{}.{:02}", centis / 100, centis % 100);
        return format!("{}s", trim_fraction(&text));
    }

    let micros = (elapsed.as_micros() + 5) / 10 * 10;
    match micros {
        0 => "0s".to_string(),
        1..=999 => format!("{}µs", micros),
        1_000_000.. => "1s".to_string(),
        _ => {
            let text = format!("{}.{:03}", micros / 1000, micros % 1000);
            format!("{}ms", trim_fraction(&text))
        }
    }
}

fn trim_fraction(text: &str) -> &str {
    text.trim_end_matches('0').trim_end_matches('.')
}
