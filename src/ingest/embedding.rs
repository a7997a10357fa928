//! Embedding models
//!
//! `RedisVectorStore` asks an `EmbeddingModel` for one vector per document.
//! `HashingEmbedder` is a dependency-free model: tokens are hashed into a
//! fixed number of buckets and the counts are L2-normalised, so equal text
//! always yields the same vector.

use crate::error::IngestError;

/// Turns text into a fixed-length vector.
pub trait EmbeddingModel: Send + Sync + std::fmt::Debug {
    /// Length of every vector `embed` returns.
    fn dimensions(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>, IngestError>;
}

/// Feature-hashing bag of words.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(FNV_OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self, IngestError> {
        if dimensions == 0 {
            return Err(IngestError::Backend(
                "embedding dimensions must be greater than 0".into(),
            ));
        }
        Ok(Self { dimensions })
    }
}

impl EmbeddingModel for HashingEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, IngestError> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = fnv1a(token.to_lowercase().as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            // top bit picks the sign so collisions tend to cancel out
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(vector)
    }
}
