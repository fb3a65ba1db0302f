//! Collision-free target paths.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::split_extension;

/// A path is free only when looking it up reports "not found". Dangling
/// symlinks and entries we cannot stat count as occupied.
fn is_free(path: &Path) -> bool {
    matches!(fs::symlink_metadata(path), Err(e) if e.kind() == io::ErrorKind::NotFound)
}

/// Returns `dir/name` if nothing exists there; otherwise the first free
/// `dir/<base>_<n><ext>` for n = 1, 2, 3, ...
pub fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if is_free(&candidate) {
        return candidate;
    }

    let (base, ext) = split_extension(name);
    (1u64..)
        .map(|n| dir.join(format!("{base}_{n}{ext}")))
        .find(|p| is_free(p))
        .unwrap_or(candidate)
}
