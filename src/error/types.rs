//! Error types
//!
//! Defines domain-specific error types for each module of the feeder.

use std::io;
use thiserror::Error;

/// Coarse classification shared by every error the service surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Storage,
    NotFound,
    Ingestion,
}

/// Ingestion module errors
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported JSON structure: {0}")]
    InvalidStructure(String),

    #[error("Vector store failure: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for IngestError {
    fn from(error: redis::RedisError) -> Self {
        IngestError::Backend(error.to_string())
    }
}

/// Storage module errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage configuration: {0}")]
    Configuration(String),

    #[error("Missing filename")]
    MissingFilename,

    #[error("Failed to store empty file: {0}")]
    EmptyFile(String),

    #[error("Cannot store file outside the storage root: {0}")]
    PathEscapesRoot(String),

    #[error("Filename is reserved for in-flight uploads: {0}")]
    ReservedFilename(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("Could not read file: {0}")]
    NotFound(String),

    /// Raised by the ingestion collaborator after the file was written.
    #[error(transparent)]
    Ingestion(#[from] IngestError),
}

impl StorageError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        StorageError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::Configuration(_) => ErrorKind::Configuration,
            StorageError::MissingFilename
            | StorageError::EmptyFile(_)
            | StorageError::PathEscapesRoot(_)
            | StorageError::ReservedFilename(_)
            | StorageError::Io { .. } => ErrorKind::Storage,
            StorageError::NotFound(_) => ErrorKind::NotFound,
            StorageError::Ingestion(_) => ErrorKind::Ingestion,
        }
    }
}

/// General feeder error that encompasses all error types
#[derive(Debug, Error)]
pub enum FeederError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FeederError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FeederError::Config(_) => ErrorKind::Configuration,
            FeederError::Storage(e) => e.kind(),
            FeederError::Ingest(_) => ErrorKind::Ingestion,
            FeederError::Io(_) => ErrorKind::Storage,
        }
    }
}
