//! Storage result types
//!
//! Defines the inputs and results exchanged with the storage service.

use std::fs::{self, File, ReadDir};
use std::path::PathBuf;

use crate::error::StorageError;
use crate::storage::filesystem::is_temporary;

/// A file received from a client, not yet persisted.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }
}

/// Result of a successful store
#[derive(Debug, Clone)]
pub struct StoreResult {
    pub filename: String,
    pub path: PathBuf,
    /// Number of records handed to the vector store
    pub documents: usize,
}

/// Readable handle to a stored file
#[derive(Debug, Clone)]
pub struct StoredResource {
    pub filename: String,
    pub path: PathBuf,
    pub size: u64,
}

impl StoredResource {
    pub fn open(&self) -> Result<File, StorageError> {
        File::open(&self.path)
            .map_err(|e| StorageError::io(format!("Could not open {}", self.filename), e))
    }

    pub fn contents(&self) -> Result<Vec<u8>, StorageError> {
        fs::read(&self.path)
            .map_err(|e| StorageError::io(format!("Could not read {}", self.filename), e))
    }
}

/// Lazy one-level listing of the storage root, yielding paths relative to it.
#[derive(Debug)]
pub struct StoredFiles {
    entries: Option<ReadDir>,
}

impl StoredFiles {
    pub(crate) fn new(entries: ReadDir) -> Self {
        Self {
            entries: Some(entries),
        }
    }

    /// Listing of a root that does not exist.
    pub(crate) fn empty() -> Self {
        Self { entries: None }
    }
}

impl Iterator for StoredFiles {
    type Item = Result<PathBuf, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entries = self.entries.as_mut()?;
        loop {
            match entries.next()? {
                Ok(entry) => {
                    let name = entry.file_name();
                    // uploads still being written
                    if is_temporary(&name.to_string_lossy()) {
                        continue;
                    }
                    return Some(Ok(PathBuf::from(name)));
                }
                Err(e) => return Some(Err(StorageError::io("Failed to read stored files", e))),
            }
        }
    }
}
