//! Path comparison helpers.

use std::path::{Path, PathBuf};

/// Normalize path, falling back to the original if canonicalization fails.
///
/// This is useful when the path might not exist and that's acceptable.
pub fn normalize_or_original(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Check whether two paths resolve to the same existing file.
///
/// Both paths are canonicalized, so `./a.js` and `dir/../a.js` compare equal.
/// Returns false if either path does not exist.
pub fn is_same_file(a: impl AsRef<Path>, b: impl AsRef<Path>) -> bool {
    match (a.as_ref().canonicalize(), b.as_ref().canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
