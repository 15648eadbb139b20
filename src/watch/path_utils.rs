// src/watch/path_utils.rs

//! Path helpers shared by the matcher and user-facing messages.

use std::path::Path;

/// Express `path` relative to `root` with forward slashes.
///
/// Tries a plain prefix strip first, then retries with both sides
/// canonicalized (symlinked roots, `/private/var` on macOS). Returns `None`
/// when the path does not live under `root` or no longer exists.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(slashed(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    let path_canon = path.canonicalize().ok()?;
    path_canon.strip_prefix(&root_canon).ok().map(slashed)
}

/// Short form for logs and status lines: relative when possible, otherwise
/// the path as given.
pub fn display_relative(root: &Path, path: &Path) -> String {
    match relative_str(root, path) {
        Some(rel) if !rel.is_empty() => rel,
        _ => path.display().to_string(),
    }
}

fn slashed(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}
