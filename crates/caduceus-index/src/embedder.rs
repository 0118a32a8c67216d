//! Deterministic local embedding via hashed bag-of-tokens projection.
//!
//! Stands in for a sentence-transformer collaborator: each token is hashed
//! into one of `dim` buckets with a hash-derived sign, counts are
//! accumulated, and the vector is L2-normalized. Identical input always
//! produces the identical vector, which is all the pipeline contract
//! requires of an embedding model.

use xxhash_rust::xxh3::xxh3_64;

use crate::{Embedder, IndexError};

/// Default dimensionality, matching common sentence-transformer models.
pub const DEFAULT_DIM: usize = 384;

/// Hash-projection embedder. Cheap, deterministic, dependency-free at
/// inference time; not semantically meaningful beyond token overlap.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn project(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        let lower = text.to_lowercase();
        for token in lower.split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            let h = xxh3_64(token.as_bytes());
            let bucket = (h % self.dim as u64) as usize;
            // Top bit picks the sign so unrelated tokens cancel rather
            // than pile up in shared buckets.
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        normalize(&mut v);
        v
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIM)
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, IndexError> {
        Ok(texts.iter().map(|t| self.project(t)).collect())
    }
}

/// L2-normalize a vector in place.
pub(crate) fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
