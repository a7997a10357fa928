//! Startup preparation of the storage root
//!
//! With `storage.reset_on_boot` enabled (the default) every start discards
//! whatever earlier runs uploaded. Uploads therefore do not survive a restart
//! unless the reset is turned off.

use log::{info, warn};

use crate::config::StorageProperties;
use crate::error::StorageError;
use crate::storage::StorageService;

/// Runs once, before the server accepts connections.
pub fn prepare_storage(
    storage: &dyn StorageService,
    properties: &StorageProperties,
) -> Result<(), StorageError> {
    if properties.reset_on_boot {
        warn!(
            "Resetting storage root '{}': previously uploaded files are discarded",
            properties.location
        );
        if storage.delete_all()? {
            info!("Previous uploads removed");
        }
    }

    storage.init()
}
