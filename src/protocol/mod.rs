//! Upload protocol
//!
//! Line-oriented command channel: parsing, handlers and reply codes.

pub mod commands;
pub mod handlers;
pub mod responses;

pub use commands::{Command, CommandResult, CommandStatus, parse_command};
pub use handlers::{handle_command, handle_upload};
