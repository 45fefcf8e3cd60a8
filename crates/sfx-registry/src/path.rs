//! Canonical string form of presentation paths.

use std::io;
use std::path::Path;

/// Convert `path` to an absolute, forward-slash separated string.
///
/// Relative paths are resolved against the current working directory. The
/// filesystem is not consulted, so the path does not need to exist and
/// symbolic links are kept as written.
///
/// # Errors
///
/// Returns an error if the current working directory can not be determined.
pub fn normalize_path(path: &Path) -> io::Result<String> {
    let absolute = std::path::absolute(path)?;
    Ok(absolute.to_string_lossy().replace('\\', "/"))
}
