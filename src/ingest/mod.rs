//! Ingestion
//!
//! Record extraction from stored JSON files, the embedding model, and the
//! vector store the records are handed to.

pub mod document;
pub mod embedding;
pub mod reader;
pub mod redis_store;
pub mod vector_store;

pub use document::Document;
pub use embedding::{EmbeddingModel, HashingEmbedder};
pub use reader::{JsonReader, RECORD_KEYS};
pub use redis_store::RedisVectorStore;
pub use vector_store::{InMemoryVectorStore, VectorStore};
