//! File system operations
//!
//! Low-level helpers used by the storage service.

use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::Path;

use log::{debug, error};
use uuid::Uuid;

/// Create a directory and any missing parents
pub fn create_directory(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Recursively remove a directory. Returns `false` if it did not exist.
pub fn remove_directory(path: &Path) -> io::Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Check if file exists
pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

const TEMP_SUFFIX: &str = ".part";

/// Whether `name` is an in-flight upload written by [`write_replacing`]
pub fn is_temporary(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(TEMP_SUFFIX)
}

/// Writes `data` to `destination`, replacing any existing file.
///
/// Bytes land in a uniquely named sibling first and are renamed into place,
/// so concurrent writers to the same name never interleave.
pub fn write_replacing(destination: &Path, data: &[u8]) -> io::Result<()> {
    let dir = destination
        .parent()
        .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "destination has no parent"))?;
    let temp_path = dir.join(format!(".{}{}", Uuid::new_v4(), TEMP_SUFFIX));

    let written = File::create(&temp_path).and_then(|mut file| {
        file.write_all(data)?;
        file.sync_all()
    });

    if let Err(e) = written {
        error!("Failed to write temporary file {}: {}", temp_path.display(), e);
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp_path, destination) {
        error!(
            "Failed to rename {} to {}: {}",
            temp_path.display(),
            destination.display(),
            e
        );
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    debug!("Wrote {} bytes to {}", data.len(), destination.display());
    Ok(())
}
