//! Collaborator interfaces for the semantic path: an embedding model and a
//! vector index, plus the in-process implementations used by the pipeline
//! and its tests.
//!
//! The pipeline only ever talks to the [`Embedder`] and [`VectorIndex`]
//! traits, so either side can be swapped for a hosted model or a real
//! vector database without touching the retrieval code.

pub mod embedder;
pub mod error;
pub mod memory;

use async_trait::async_trait;
use caduceus_core::{EvidenceDocument, SearchFilters};

pub use embedder::HashEmbedder;
pub use error::IndexError;
pub use memory::MemoryIndex;

/// A text embedding model. Deterministic for identical input within a
/// model version.
pub trait Embedder: Send + Sync {
    /// Embedding dimensionality.
    fn dim(&self) -> usize;

    /// Embed a batch of texts, one normalized vector per input.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, IndexError>;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        let mut vecs = self.embed_batch(&[text])?;
        vecs.pop().ok_or(IndexError::EmptyBatch)
    }
}

/// A document plus its embedding, ready for insertion.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub document: EvidenceDocument,
    pub vector: Vec<f32>,
}

/// Nearest-neighbour lookup over embedded evidence documents.
///
/// Upserts keyed on the stable document identifier must be idempotent:
/// re-inserting the same identifier may overwrite metadata but never
/// duplicates an entry or corrupts the index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or overwrite entries by document identifier.
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<(), IndexError>;

    /// Top-`k` most similar documents, filtered by `filters`, ordered by
    /// descending similarity. Similarity is 1 − cosine distance.
    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<(EvidenceDocument, f32)>, IndexError>;

    /// Number of stored documents.
    async fn count(&self) -> Result<usize, IndexError>;

    /// Membership check by document identifier. This is the dedup
    /// primitive: callers must not fall back to listing all identifiers.
    async fn contains(&self, doc_id: &str) -> Result<bool, IndexError>;
}
