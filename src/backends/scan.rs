//! Tree scanner
//!
//! Walks a directory with walkdir and yields the regular files that pass the
//! ignore rules and match at least one configured pattern. The sequence is
//! lazy and stops at the first walk error.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::backends::filter::{IgnoreRules, NameMatcher};
use crate::core::paths::{is_git_dir, make_relative};

/// What a run operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Recursive walk below a directory, filtered
    Tree(PathBuf),
    /// One explicit file, never filtered
    File(PathBuf),
}

impl Target {
    /// Classify a user-supplied path
    pub fn resolve(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if metadata.is_dir() {
            Ok(Target::Tree(path.to_path_buf()))
        } else {
            Ok(Target::File(path.to_path_buf()))
        }
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("error walking directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("walk cancelled")]
    Cancelled,
}

/// Candidate file producer
pub struct TreeScanner {
    root: PathBuf,
    patterns: Vec<String>,
    ignore: Box<dyn IgnoreRules>,
    matcher: Box<dyn NameMatcher>,
}

impl TreeScanner {
    pub fn new(
        root: impl Into<PathBuf>,
        patterns: Vec<String>,
        ignore: Box<dyn IgnoreRules>,
        matcher: Box<dyn NameMatcher>,
    ) -> Self {
        Self {
            root: root.into(),
            patterns,
            ignore,
            matcher,
        }
    }

    /// Start the walk. Consumes the scanner; the sequence cannot be restarted.
    pub fn candidates(self) -> Candidates {
        let walker = WalkDir::new(&self.root).sort_by_file_name().into_iter();
        Candidates {
            walker,
            scanner: self,
            finished: false,
        }
    }

    fn name_matches(&self, file_name: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| self.matcher.matches(file_name, pattern))
    }
}

/// Lazy sequence of candidate paths
pub struct Candidates {
    walker: walkdir::IntoIter,
    scanner: TreeScanner,
    finished: bool,
}

impl Iterator for Candidates {
    type Item = Result<PathBuf, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    self.finished = true;
                    return Some(Err(ScanError::Walk(err)));
                }
            };

            let path = entry.path();
            let relative = make_relative(path, &self.scanner.root).unwrap_or(path);
            let file_type = entry.file_type();

            if file_type.is_dir() {
                if entry.depth() > 0
                    && (is_git_dir(path) || self.scanner.ignore.is_ignored(relative, true))
                {
                    debug!("Skipping ignored directory: {}", path.display());
                    self.walker.skip_current_dir();
                }
                continue;
            }

            // Symlinks and special files are left alone.
            if !file_type.is_file() {
                continue;
            }

            if self.scanner.ignore.is_ignored(relative, false) {
                debug!("Skipping ignored file: {}", path.display());
                continue;
            }

            let matched = self
                .scanner
                .name_matches(&entry.file_name().to_string_lossy());
            if matched {
                return Some(Ok(entry.into_path()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::filter::{GitignoreRules, GlobMatcher, NoIgnore};
    use std::fs;
    use tempfile::tempdir;

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn scanner(root: &Path, patterns: &[&str], respect_ignore: bool) -> TreeScanner {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        let matcher = GlobMatcher::new(&patterns).unwrap();
        let ignore: Box<dyn IgnoreRules> = if respect_ignore {
            Box::new(GitignoreRules::load(root))
        } else {
            Box::new(NoIgnore)
        };
        TreeScanner::new(root, patterns, ignore, Box::new(matcher))
    }

    fn collect(scanner: TreeScanner, root: &Path) -> Vec<String> {
        scanner
            .candidates()
            .map(|c| {
                let path = c.unwrap();
                path.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    /// Records every (name, pattern) query
    struct CountingMatcher {
        calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    impl NameMatcher for CountingMatcher {
        fn matches(&self, file_name: &str, pattern: &str) -> bool {
            self.calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            file_name.ends_with(pattern.trim_start_matches('*'))
        }
    }

    #[test]
    fn test_scan_filters_by_pattern() {
        let temp = tempdir().unwrap();
        write_file(&temp.path().join("a.rs"), "");
        write_file(&temp.path().join("b.txt"), "");
        write_file(&temp.path().join("c.bin"), "");
        write_file(&temp.path().join("sub/d.rs"), "");

        let found = collect(scanner(temp.path(), &["*.rs", "*.txt"], true), temp.path());
        assert_eq!(found, vec!["a.rs", "b.txt", "sub/d.rs"]);
    }

    #[test]
    fn test_scan_skips_directories() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("folder.rs")).unwrap();
        write_file(&temp.path().join("x.rs"), "");

        let found = collect(scanner(temp.path(), &["*.rs"], true), temp.path());
        assert_eq!(found, vec!["x.rs"]);
    }

    #[test]
    fn test_scan_respects_gitignore() {
        let temp = tempdir().unwrap();
        write_file(&temp.path().join(".gitignore"), "target/\n*.gen.rs\n");
        write_file(&temp.path().join("src/lib.rs"), "");
        write_file(&temp.path().join("src/api.gen.rs"), "");
        write_file(&temp.path().join("target/debug/out.rs"), "");

        let found = collect(scanner(temp.path(), &["*.rs"], true), temp.path());
        assert_eq!(found, vec!["src/lib.rs"]);
    }

    #[test]
    fn test_scan_no_ignore_includes_everything() {
        let temp = tempdir().unwrap();
        write_file(&temp.path().join(".gitignore"), "target/\n");
        write_file(&temp.path().join("src/lib.rs"), "");
        write_file(&temp.path().join("target/out.rs"), "");

        let found = collect(scanner(temp.path(), &["*.rs"], false), temp.path());
        assert_eq!(found, vec!["src/lib.rs", "target/out.rs"]);
    }

    #[test]
    fn test_scan_never_enters_git_dir() {
        let temp = tempdir().unwrap();
        write_file(&temp.path().join(".git/config.txt"), "");
        write_file(&temp.path().join("readme.txt"), "");

        let found = collect(scanner(temp.path(), &["*.txt"], false), temp.path());
        assert_eq!(found, vec!["readme.txt"]);
    }

    #[test]
    fn test_pattern_check_stops_at_first_match() {
        let temp = tempdir().unwrap();
        write_file(&temp.path().join("one.rs"), "");

        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let matcher = CountingMatcher {
            calls: calls.clone(),
        };
        let patterns = vec!["*.rs".to_string(), "*.md".to_string(), "*.txt".to_string()];
        let scanner = TreeScanner::new(temp.path(), patterns, Box::new(NoIgnore), Box::new(matcher));

        assert_eq!(scanner.candidates().count(), 1);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pattern_order_does_not_change_outcome() {
        let temp = tempdir().unwrap();
        write_file(&temp.path().join("a.md"), "");
        write_file(&temp.path().join("b.rs"), "");

        let forward = collect(scanner(temp.path(), &["*.md", "*.rs"], false), temp.path());
        let reverse = collect(scanner(temp.path(), &["*.rs", "*.md"], false), temp.path());
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_missing_root_is_walk_error() {
        let temp = tempdir().unwrap();
        let missing = temp.path().join("nope");

        let mut candidates = scanner(&missing, &["*"], false).candidates();
        assert!(matches!(candidates.next(), Some(Err(ScanError::Walk(_)))));
        assert!(candidates.next().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_skips_symlinks() {
        let temp = tempdir().unwrap();
        write_file(&temp.path().join("real.txt"), "");
        std::os::unix::fs::symlink(temp.path().join("real.txt"), temp.path().join("link.txt"))
            .unwrap();

        let found = collect(scanner(temp.path(), &["*.txt"], false), temp.path());
        assert_eq!(found, vec!["real.txt"]);
    }

    #[test]
    fn test_target_resolve() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("f.txt");
        write_file(&file, "");

        assert_eq!(
            Target::resolve(temp.path()).unwrap(),
            Target::Tree(temp.path().to_path_buf())
        );
        assert_eq!(Target::resolve(&file).unwrap(), Target::File(file.clone()));
        assert!(Target::resolve(&temp.path().join("missing")).is_err());
    }
}
