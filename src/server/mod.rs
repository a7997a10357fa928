//! Server core functionality
//!
//! Accept loop, client registry and per-connection sessions.

pub mod core;
pub mod registry;
pub mod session;

pub use self::core::Server;
pub use registry::ClientRegistry;
