pub mod bootstrap;
pub mod config;
pub mod error;
pub mod ingest;
pub mod protocol;
pub mod server;
pub mod storage;

pub use server::Server;
