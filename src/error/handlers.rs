//! Error handlers
//!
//! Maps errors onto protocol reply codes and logs them.

use crate::error::types::{ErrorKind, StorageError};
use crate::protocol::responses;
use log::error;

/// Log a storage failure with its classification.
pub fn handle_error(err: &StorageError) {
    error!("{:?} error: {}", err.kind(), err);
}

/// Convert an error to a protocol reply code
pub fn error_to_reply_code(err: &StorageError) -> u16 {
    match err.kind() {
        ErrorKind::NotFound => responses::FILE_UNAVAILABLE,
        ErrorKind::Storage => responses::FILE_UNAVAILABLE,
        ErrorKind::Ingestion => responses::LOCAL_ERROR,
        ErrorKind::Configuration => responses::SERVICE_UNAVAILABLE,
    }
}
