//! Path validation
//!
//! Lexical path normalisation and the containment check that keeps every
//! stored file directly under the storage root.

use std::path::{Component, Path, PathBuf};

use crate::error::StorageError;
use crate::storage::filesystem::is_temporary;

/// Collapses `.` and `..` components without touching the filesystem.
///
/// `..` at the filesystem root stays at the root, matching how the OS
/// resolves it.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) && normalized.pop();
                if !popped && !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Makes `path` absolute against the current directory, then normalises it.
pub fn absolutize(path: &Path) -> Result<PathBuf, StorageError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| StorageError::io("Could not resolve the working directory", e))?;
        cwd.join(path)
    };
    Ok(normalize(&absolute))
}

/// Resolves `filename` against `root` (already absolute and normalised) and
/// requires the result to sit directly inside `root`.
///
/// Names with separators are accepted only when they normalise back to a flat
/// entry of the root, e.g. `sub/../a.json`. Names in the temp-file namespace
/// are refused, since listings hide them.
pub fn resolve_flat_file(root: &Path, filename: &str) -> Result<PathBuf, StorageError> {
    if filename.trim().is_empty() {
        return Err(StorageError::MissingFilename);
    }

    let destination = normalize(&root.join(filename));
    match destination.parent() {
        Some(parent) if parent == root => {}
        _ => return Err(StorageError::PathEscapesRoot(filename.to_string())),
    }

    let flat_name = destination
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    if is_temporary(&flat_name) {
        return Err(StorageError::ReservedFilename(filename.to_string()));
    }
    Ok(destination)
}
