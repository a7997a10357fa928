//! Document type handed to the vector store

use serde_json::{Map, Value};
use uuid::Uuid;

/// One record extracted from an uploaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub metadata: Map<String, Value>,
}

impl Document {
    /// Creates a document with a fresh random id and no metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            metadata: Map::new(),
        }
    }

    /// Metadata rendered as a compact JSON object.
    pub fn metadata_json(&self) -> String {
        Value::Object(self.metadata.clone()).to_string()
    }
}
