//! Path helpers
//!
//! Paths shown to users use '/' as separator; ignore rules are matched
//! against paths relative to the scan root.

use std::path::{Component, Path};

/// Normalize a path to use '/' as separator and drop a leading `./`
pub fn normalize_path(path: &Path) -> String {
    let path = path.strip_prefix(".").unwrap_or(path);
    path.to_string_lossy().replace('\\', "/")
}

/// Make a path relative to the root directory
pub fn make_relative<'a>(path: &'a Path, root: &Path) -> Option<&'a Path> {
    path.strip_prefix(root).ok()
}

/// Check if a path names a `.git` directory
pub fn is_git_dir(path: &Path) -> bool {
    matches!(path.components().next_back(), Some(Component::Normal(name)) if name == ".git")
}
