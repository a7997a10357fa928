//! Command handlers
//!
//! Each handler runs one command against the storage service and builds the
//! reply. Handlers are synchronous; the session runs storage-bound ones on the
//! blocking pool.

use log::{info, warn};

use crate::error::StorageError;
use crate::error::handlers::{error_to_reply_code, handle_error};
use crate::protocol::responses::{
    ARGUMENT_ERROR, CLOSING, FILE_ACTION_OK, OK, OPENING_DATA, SYNTAX_ERROR, TRANSFER_COMPLETE,
    format_response,
};
use crate::protocol::{Command, CommandResult, CommandStatus};
use crate::storage::{StorageService, UploadedFile};

/// Dispatches every command except `STOR`, whose payload is read by the
/// session and passed to [`handle_upload`].
pub fn handle_command(storage: &dyn StorageService, command: &Command) -> CommandResult {
    match command {
        Command::QUIT => handle_cmd_quit(),
        Command::NOOP => CommandResult::success(format_response(OK, "OK")),
        Command::LIST => handle_cmd_list(storage),
        Command::PURGE => handle_cmd_purge(storage),
        Command::RETR(filename) => handle_cmd_retr(storage, filename),
        Command::STOR { .. } => CommandResult::failure(
            "STOR without payload",
            format_response(SYNTAX_ERROR, "STOR must carry its payload"),
        ),
        Command::INVALID(reason) => CommandResult::failure(
            reason.clone(),
            format_response(ARGUMENT_ERROR, reason),
        ),
        Command::UNKNOWN => CommandResult::failure(
            "Unknown command",
            format_response(SYNTAX_ERROR, "Syntax error, command unrecognized"),
        ),
    }
}

/// Stores an uploaded file and reports how many documents were indexed.
pub fn handle_upload(storage: &dyn StorageService, upload: &UploadedFile) -> CommandResult {
    match storage.store(upload) {
        Ok(result) => CommandResult::success(format_response(
            TRANSFER_COMPLETE,
            &format!(
                "Stored {} ({} documents indexed)",
                result.filename, result.documents
            ),
        )),
        Err(e @ StorageError::Ingestion(_)) => {
            warn!("{} was stored but not indexed: {}", upload.filename, e);
            storage_failure(&e, &format!("Stored but not indexed: {}", e))
        }
        Err(e) => storage_failure(&e, &e.to_string()),
    }
}

fn handle_cmd_quit() -> CommandResult {
    CommandResult {
        status: CommandStatus::CloseConnection,
        message: Some(format_response(CLOSING, "Goodbye")),
        data: None,
    }
}

fn handle_cmd_list(storage: &dyn StorageService) -> CommandResult {
    let files = match storage.load_all() {
        Ok(files) => files,
        Err(e) => return storage_failure(&e, &e.to_string()),
    };

    let mut names = Vec::new();
    for entry in files {
        match entry {
            Ok(path) => names.push(path.to_string_lossy().to_string()),
            Err(e) => return storage_failure(&e, &e.to_string()),
        }
    }
    names.sort();
    info!("Listing {} stored files", names.len());

    let mut message = format_response(OPENING_DATA, &format!("{} entries", names.len()));
    for name in &names {
        message.push_str(name);
        message.push_str("\r\n");
    }
    message.push_str(&format_response(TRANSFER_COMPLETE, "Listing complete"));

    CommandResult::success(message)
}

fn handle_cmd_purge(storage: &dyn StorageService) -> CommandResult {
    let reset = storage.delete_all().and_then(|_| storage.init());
    match reset {
        Ok(()) => {
            info!("Storage reset on client request");
            CommandResult::success(format_response(FILE_ACTION_OK, "Storage reset"))
        }
        Err(e) => storage_failure(&e, &e.to_string()),
    }
}

fn handle_cmd_retr(storage: &dyn StorageService, filename: &str) -> CommandResult {
    let contents = storage
        .load_as_resource(filename)
        .and_then(|resource| resource.contents());

    match contents {
        Ok(bytes) => {
            info!("Sending {} ({} bytes)", filename, bytes.len());
            CommandResult {
                status: CommandStatus::Success,
                message: Some(format_response(
                    OPENING_DATA,
                    &format!("{} bytes", bytes.len()),
                )),
                data: Some(bytes),
            }
        }
        Err(e) => storage_failure(&e, &e.to_string()),
    }
}

fn storage_failure(err: &StorageError, text: &str) -> CommandResult {
    handle_error(err);
    CommandResult::failure(
        err.to_string(),
        format_response(error_to_reply_code(err), text),
    )
}
