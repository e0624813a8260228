//! Payload codec for the document/vector variant.
//!
//! The storage engine itself is payload-agnostic — it stores and returns
//! opaque bytes. This codec defines the payload the DBMS variant stores: an
//! embedding vector paired with the document's serialized metadata (the
//! document minus its embedding), and is needed at the dump boundary where
//! the two halves are exported separately.

use serde::{Deserialize, Serialize};

use crate::error::{FlatError, Result};

/// One stored document: embedding vector plus opaque metadata bytes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocRecord {
    /// Embedding vector
    pub embedding: Vec<f32>,

    /// Serialized document metadata, without the embedding
    pub metadata: Vec<u8>,
}

impl DocRecord {
    pub fn new(embedding: Vec<f32>, metadata: Vec<u8>) -> Self {
        Self {
            embedding,
            metadata,
        }
    }

    /// Serialize to the on-log payload bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| FlatError::Serialization(e.to_string()))
    }

    /// Deserialize from on-log payload bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| FlatError::Serialization(e.to_string()))
    }

    /// Raw little-endian bytes of the embedding, as written to dump shards
    pub fn embedding_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.embedding.len() * 4);
        for v in &self.embedding {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    /// Rebuild an embedding from raw little-endian bytes
    pub fn embedding_from_bytes(bytes: &[u8]) -> Result<Vec<f32>> {
        if bytes.len() % 4 != 0 {
            return Err(FlatError::Serialization(format!(
                "embedding byte length {} is not a multiple of 4",
                bytes.len()
            )));
        }
        Ok(bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
            .collect())
    }
}
