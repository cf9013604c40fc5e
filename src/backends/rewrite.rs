//! File rewriter
//!
//! Streams a file through the normalizer into a scratch file next to it and,
//! only if something changed, swaps the scratch file in with a rename. The
//! scratch file is a `NamedTempFile`, so it is removed on every exit path
//! that does not hand it over to the target name.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::core::model::{ProcessingResult, RewriteError};
use crate::core::normalize::normalize;

/// Scratch file naming: `.sawmill_XXXXXX.tmp`
pub const TEMP_PREFIX: &str = ".sawmill_";
pub const TEMP_SUFFIX: &str = ".tmp";

/// Normalize one file in place
pub fn rewrite(path: &Path) -> ProcessingResult {
    match rewrite_file(path) {
        Ok(true) => ProcessingResult::changed(path),
        Ok(false) => ProcessingResult::unchanged(path),
        Err(err) => ProcessingResult::failed(path, err),
    }
}

fn rewrite_file(path: &Path) -> Result<bool, RewriteError> {
    let source = File::open(path).map_err(|source| RewriteError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let permissions = source.metadata().map(|m| m.permissions()).ok();

    let dir = parent_dir(path);
    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|source| RewriteError::TempCreate {
            path: path.to_path_buf(),
            dir: dir.to_path_buf(),
            source,
        })?;

    let stream_err = |source: io::Error| RewriteError::Stream {
        path: path.to_path_buf(),
        source,
    };

    let changed = normalize(BufReader::new(&source), temp.as_file_mut()).map_err(stream_err)?;
    if !changed {
        return Ok(false);
    }

    drop(source);

    if let Some(permissions) = permissions {
        if let Err(err) = temp.as_file().set_permissions(permissions) {
            warn!(path = %path.display(), error = %err, "could not carry file mode over");
        }
    }
    temp.as_file().sync_all().map_err(stream_err)?;

    replace(temp, path)?;
    Ok(true)
}

/// Directory that receives the scratch file
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Move the scratch file onto `target`, copying if the rename is refused
fn replace(temp: NamedTempFile, target: &Path) -> Result<(), RewriteError> {
    let err = match temp.persist(target) {
        Ok(_) => return Ok(()),
        Err(err) => err,
    };

    debug!(path = %target.display(), error = %err.error, "rename failed, copying instead");
    let temp = err.file;
    copy_over(temp.path(), target).map_err(|source| RewriteError::Replace {
        path: target.to_path_buf(),
        source,
    })
    // `temp` drops here and removes the scratch file.
}

/// Overwrite `dst` with the bytes of `src`.
///
/// `dst` is only truncated once `src` is open. A copy that fails after that
/// point can leave `dst` partially written; callers reach this only after
/// the rename has already been refused.
fn copy_over(src: &Path, dst: &Path) -> io::Result<()> {
    let mut reader = File::open(src)?;
    let mut writer = File::create(dst)?;
    io::copy(&mut reader, &mut writer)?;
    writer.sync_all()
}

/// Scratch files currently present in `dir`
#[cfg(test)]
pub fn leftover_temp_files(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let name = entry?.file_name().to_string_lossy().to_string();
        if name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX) {
            names.push(name);
        }
    }
    Ok(names)
}
