//! Vector store seam
//!
//! The storage service hands extracted documents to a `VectorStore`, which
//! owns embedding and indexing.

use std::sync::Mutex;

use crate::error::IngestError;
use crate::ingest::Document;

/// Backend that embeds and indexes documents.
pub trait VectorStore: Send + Sync + std::fmt::Debug {
    /// Adds documents to the index, returning how many were accepted.
    fn add(&self, documents: &[Document]) -> Result<usize, IngestError>;
}

/// Keeps documents in memory.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    documents: Mutex<Vec<Document>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything added so far.
    pub fn documents(&self) -> Vec<Document> {
        match self.documents.lock() {
            Ok(docs) => docs.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VectorStore for InMemoryVectorStore {
    fn add(&self, documents: &[Document]) -> Result<usize, IngestError> {
        let mut guard = self
            .documents
            .lock()
            .map_err(|_| IngestError::Backend("in-memory store lock poisoned".into()))?;
        guard.extend_from_slice(documents);
        Ok(documents.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_accumulates() {
        let store = InMemoryVectorStore::new();
        assert!(store.is_empty());

        let added = store
            .add(&[Document::new("a"), Document::new("b")])
            .unwrap();
        assert_eq!(added, 2);
        store.add(&[Document::new("c")]).unwrap();

        let contents: Vec<_> = store.documents().into_iter().map(|d| d.content).collect();
        assert_eq!(contents, vec!["a", "b", "c"]);
    }
}
