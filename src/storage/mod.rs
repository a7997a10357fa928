//! File system storage management
//!
//! Handles persisting uploads, path validation and listing of the storage root.

pub mod filesystem;
pub mod results;
pub mod service;
pub mod validation;

pub use results::{StoreResult, StoredFiles, StoredResource, UploadedFile};
pub use service::{FileSystemStorageService, StorageService};
