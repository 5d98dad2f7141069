use std::path::{Path, PathBuf};

use crate::error::{Result, ScanError};

/// Resolve `path` to the absolute, symlink-free form used as the key for
/// deduplication and aggregation.
///
/// Relative paths are resolved against the current working directory.
pub fn canonicalize(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    std::fs::canonicalize(path).map_err(|e| ScanError::io(path, e))
}
