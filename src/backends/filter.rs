//! Selection predicates
//!
//! The scanner asks two questions about every entry: is it ignored, and does
//! its file name match one of the configured patterns. Both are traits so the
//! pipeline can be driven without a real `.gitignore` or glob engine.

use ignore::gitignore::Gitignore;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Patterns used when none are configured
pub const DEFAULT_PATTERNS: &[&str] = &[
    "*.go",
    "*.js",
    "*.ts",
    "*.jsx",
    "*.tsx",
    "*.py",
    "*.rb",
    "*.rs",
    "*.toml",
    "*.yml",
    "*.yaml",
    "*.json",
    "*.xml",
    "*.html",
    "*.css",
    "*.scss",
    "*.md",
    "*.txt",
    "*.conf",
    "*.ini",
    "*.sh",
    "*.tf",
    "Dockerfile.*",
];

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("no file patterns configured")]
    NoPatterns,
}

/// "path -> ignored?" predicate. Paths are relative to the scan root.
pub trait IgnoreRules: Send {
    fn is_ignored(&self, relative: &Path, is_dir: bool) -> bool;
}

/// "name, pattern -> match?" predicate
pub trait NameMatcher: Send {
    fn matches(&self, file_name: &str, pattern: &str) -> bool;
}

/// Ignore nothing (`--no-ignore`, or no `.gitignore` present)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIgnore;

impl IgnoreRules for NoIgnore {
    fn is_ignored(&self, _relative: &Path, _is_dir: bool) -> bool {
        false
    }
}

/// Rules from the `.gitignore` at the scan root
#[derive(Debug)]
pub struct GitignoreRules {
    matcher: Gitignore,
}

impl GitignoreRules {
    /// Load `<root>/.gitignore`. A missing file yields rules that ignore
    /// nothing; malformed lines are logged and skipped.
    pub fn load(root: &Path) -> Self {
        let path = root.join(".gitignore");
        if !path.is_file() {
            return Self {
                matcher: Gitignore::empty(),
            };
        }

        let (matcher, err) = Gitignore::new(&path);
        if let Some(err) = err {
            warn!(path = %path.display(), error = %err, "partially parsed .gitignore");
        }
        Self { matcher }
    }

    /// Build rules from in-memory lines
    #[cfg(test)]
    pub fn from_lines(root: &Path, lines: &[&str]) -> Self {
        let mut builder = ignore::gitignore::GitignoreBuilder::new(root);
        for line in lines {
            builder.add_line(None, line).expect("valid gitignore line");
        }
        Self {
            matcher: builder.build().expect("valid gitignore"),
        }
    }
}

impl IgnoreRules for GitignoreRules {
    fn is_ignored(&self, relative: &Path, is_dir: bool) -> bool {
        if relative.as_os_str().is_empty() {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }
}

/// Shell-style glob matching, compiled once up front
#[derive(Debug, Clone)]
pub struct GlobMatcher {
    compiled: HashMap<String, glob::Pattern>,
}

impl GlobMatcher {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, SelectionError> {
        let mut compiled = HashMap::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = glob::Pattern::new(pattern).map_err(|source| {
                SelectionError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                }
            })?;
            compiled.insert(pattern.to_string(), glob);
        }
        Ok(Self { compiled })
    }
}

impl NameMatcher for GlobMatcher {
    fn matches(&self, file_name: &str, pattern: &str) -> bool {
        self.compiled
            .get(pattern)
            .map(|glob| glob.matches(file_name))
            .unwrap_or(false)
    }
}

/// Split a comma-separated pattern list, dropping empty entries
pub fn parse_patterns(raw: Option<&str>) -> Result<Vec<String>, SelectionError> {
    let patterns: Vec<String> = match raw {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect(),
        None => DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
    };

    if patterns.is_empty() {
        return Err(SelectionError::NoPatterns);
    }
    Ok(patterns)
}
