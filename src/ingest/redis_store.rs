//! Redis-backed vector store
//!
//! Documents are written as hashes under `<prefix><id>` and covered by a
//! RediSearch index created on first use. Each hash carries the content, the
//! metadata as JSON, and an `embedding` field holding the vector from the
//! configured `EmbeddingModel` as little-endian FLOAT32 bytes.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use redis::{Client, Connection};

use crate::config::VectorStoreSettings;
use crate::error::IngestError;
use crate::ingest::{Document, EmbeddingModel, VectorStore};

const INDEX_EXISTS: &str = "Index already exists";

pub struct RedisVectorStore {
    client: Client,
    index: String,
    prefix: String,
    dimensions: usize,
    embedder: Arc<dyn EmbeddingModel>,
    connection: Mutex<Option<Connection>>,
    index_ready: AtomicBool,
}

impl fmt::Debug for RedisVectorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisVectorStore")
            .field("index", &self.index)
            .field("prefix", &self.prefix)
            .field("dimensions", &self.dimensions)
            .field("embedder", &self.embedder)
            .finish()
    }
}

impl RedisVectorStore {
    /// Builds the client. No connection is made until the first `add`.
    ///
    /// The model must produce vectors of `settings.dimensions`, the size the
    /// index is created with.
    pub fn new(
        settings: &VectorStoreSettings,
        embedder: Arc<dyn EmbeddingModel>,
    ) -> Result<Self, IngestError> {
        if embedder.dimensions() != settings.dimensions {
            return Err(IngestError::Backend(format!(
                "embedding model produces {} dimensions, index expects {}",
                embedder.dimensions(),
                settings.dimensions
            )));
        }

        let client = Client::open(settings.uri.as_str())?;
        info!(
            "Vector store configured: index '{}', prefix '{}', {} dimensions",
            settings.index, settings.prefix, settings.dimensions
        );

        Ok(Self {
            client,
            index: settings.index.clone(),
            prefix: settings.prefix.clone(),
            dimensions: settings.dimensions,
            embedder,
            connection: Mutex::new(None),
            index_ready: AtomicBool::new(false),
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index
    }

    /// Hash key a document is stored under.
    pub fn document_key(&self, document: &Document) -> String {
        format!("{}{}", self.prefix, document.id)
    }

    /// Embeds `text`, rejecting vectors of the wrong length.
    fn embedding_bytes(&self, text: &str) -> Result<Vec<u8>, IngestError> {
        let embedding = self.embedder.embed(text)?;
        if embedding.len() != self.dimensions {
            return Err(IngestError::Backend(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                embedding.len()
            )));
        }
        Ok(vector_to_bytes(&embedding))
    }

    fn ensure_index(&self, con: &mut Connection) -> Result<(), IngestError> {
        if self.index_ready.load(Ordering::Acquire) {
            return Ok(());
        }

        let created: redis::RedisResult<()> = redis::cmd("FT.CREATE")
            .arg(&self.index)
            .arg("ON")
            .arg("HASH")
            .arg("PREFIX")
            .arg(1)
            .arg(&self.prefix)
            .arg("SCHEMA")
            .arg("content")
            .arg("TEXT")
            .arg("metadata")
            .arg("TEXT")
            .arg("embedding")
            .arg("VECTOR")
            .arg("HNSW")
            .arg(6)
            .arg("TYPE")
            .arg("FLOAT32")
            .arg("DIM")
            .arg(self.dimensions)
            .arg("DISTANCE_METRIC")
            .arg("COSINE")
            .query(con);

        match created {
            Ok(()) => info!("Created vector index '{}'", self.index),
            Err(e) if e.to_string().contains(INDEX_EXISTS) => {
                debug!("Vector index '{}' already exists", self.index)
            }
            Err(e) => return Err(e.into()),
        }

        self.index_ready.store(true, Ordering::Release);
        Ok(())
    }

    fn write(
        &self,
        con: &mut Connection,
        documents: &[Document],
        embeddings: &[Vec<u8>],
    ) -> Result<(), IngestError> {
        self.ensure_index(con)?;

        let mut pipe = redis::pipe();
        for (document, embedding) in documents.iter().zip(embeddings) {
            pipe.cmd("HSET")
                .arg(self.document_key(document))
                .arg("content")
                .arg(&document.content)
                .arg("metadata")
                .arg(document.metadata_json())
                .arg("embedding")
                .arg(embedding.as_slice())
                .ignore();
        }
        pipe.query::<()>(con)?;
        Ok(())
    }
}

/// FLOAT32 vector field encoding.
fn vector_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

impl VectorStore for RedisVectorStore {
    fn add(&self, documents: &[Document]) -> Result<usize, IngestError> {
        if documents.is_empty() {
            return Ok(0);
        }

        // embed everything before touching redis, so a bad vector writes nothing
        let embeddings = documents
            .iter()
            .map(|document| self.embedding_bytes(&document.content))
            .collect::<Result<Vec<_>, _>>()?;

        let mut guard = self
            .connection
            .lock()
            .map_err(|_| IngestError::Backend("redis connection lock poisoned".into()))?;

        if guard.is_none() {
            *guard = Some(self.client.get_connection()?);
        }

        let result = match guard.as_mut() {
            Some(con) => self.write(con, documents, &embeddings),
            None => Err(IngestError::Backend("no redis connection".into())),
        };

        if let Err(e) = &result {
            warn!("Dropping redis connection after failure: {}", e);
            *guard = None;
        }

        result.map(|_| documents.len())
    }
}
