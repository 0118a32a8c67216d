//! In-process vector index with JSON snapshot persistence.
//!
//! Documents are keyed by their stable identifier, so upserts are
//! idempotent under concurrent interleaving: the last write may overwrite
//! metadata but can never duplicate an entry. Snapshots are written to a
//! sibling temp file and renamed into place, so a crash mid-write leaves
//! the previous snapshot intact.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use caduceus_core::{EvidenceDocument, SearchFilters};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::embedder::normalize;
use crate::{IndexEntry, IndexError, VectorIndex};

// Metadata clamps applied on insertion.
const MAX_TITLE_CHARS: usize = 1000;
const MAX_JOURNAL_CHARS: usize = 500;
const MAX_AUTHORS: usize = 10;
const MAX_KEYWORDS: usize = 20;
const MAX_MESH_TERMS: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    document: EvidenceDocument,
    vector: Vec<f32>,
    /// Arrival sequence number; kept across metadata overwrites so first
    /// arrival decides full-tie ordering.
    #[serde(default)]
    seq: u64,
}

#[derive(Default, Serialize, Deserialize)]
struct Snapshot {
    entries: Vec<StoredEntry>,
}

#[derive(Default)]
struct Inner {
    dim: Option<usize>,
    entries: HashMap<String, StoredEntry>,
    next_seq: u64,
}

/// In-memory vector index, optionally persisted to a JSON snapshot file.
pub struct MemoryIndex {
    inner: RwLock<Inner>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryIndex {
    /// Empty, non-persistent index.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            snapshot_path: None,
        }
    }

    /// Open a persistent index, loading the snapshot at `path` if present.
    pub async fn open(path: &Path) -> Result<Self, IndexError> {
        let mut inner = Inner::default();
        if path.exists() {
            let bytes = tokio::fs::read(path).await?;
            let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
            inner.dim = snapshot.entries.first().map(|e| e.vector.len());
            inner.entries = snapshot
                .entries
                .into_iter()
                .map(|e| (e.document.doc_id(), e))
                .collect();
            inner.next_seq = inner
                .entries
                .values()
                .map(|e| e.seq)
                .max()
                .map_or(0, |m| m + 1);
            info!(path = %path.display(), documents = inner.entries.len(), "loaded index snapshot");
        }
        Ok(Self {
            inner: RwLock::new(inner),
            snapshot_path: Some(path.to_path_buf()),
        })
    }

    /// Write the current contents to the snapshot file, if one is configured.
    /// Writes a sibling temp file first, then renames over the target.
    pub async fn save(&self) -> Result<(), IndexError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let bytes = {
            let inner = self.inner.read().await;
            let snapshot = Snapshot {
                entries: inner.entries.values().cloned().collect(),
            };
            serde_json::to_vec(&snapshot)?
        };
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<(), IndexError> {
        if entries.is_empty() {
            return Ok(());
        }
        {
            let mut inner = self.inner.write().await;
            for entry in entries {
                let expected = *inner.dim.get_or_insert(entry.vector.len());
                if entry.vector.len() != expected {
                    return Err(IndexError::DimensionMismatch {
                        expected,
                        got: entry.vector.len(),
                    });
                }
                let mut vector = entry.vector;
                normalize(&mut vector);
                let document = clamp_metadata(entry.document);
                let doc_id = document.doc_id();
                let seq = match inner.entries.get(&doc_id).map(|e| e.seq) {
                    Some(seq) => seq,
                    None => {
                        let seq = inner.next_seq;
                        inner.next_seq += 1;
                        seq
                    }
                };
                inner
                    .entries
                    .insert(doc_id, StoredEntry { document, vector, seq });
            }
        }
        self.save().await
    }

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<(EvidenceDocument, f32)>, IndexError> {
        let inner = self.inner.read().await;
        if let Some(expected) = inner.dim
            && vector.len() != expected
        {
            return Err(IndexError::DimensionMismatch {
                expected,
                got: vector.len(),
            });
        }

        let mut query = vector.to_vec();
        normalize(&mut query);

        let mut scored: Vec<(EvidenceDocument, f32, u64)> = inner
            .entries
            .values()
            .filter(|e| match filters.min_year {
                Some(min) => e.document.pub_year().is_some_and(|y| y >= min),
                None => true,
            })
            .map(|e| {
                let sim: f32 = e.vector.iter().zip(&query).map(|(a, b)| a * b).sum();
                (e.document.clone(), sim, e.seq)
            })
            .collect();

        // Ties at the k boundary resolve by recency, then arrival order;
        // map iteration order must never decide which document survives.
        scored.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| b.0.pub_date_key().cmp(&a.0.pub_date_key()))
                .then_with(|| a.2.cmp(&b.2))
        });
        scored.truncate(k);
        Ok(scored.into_iter().map(|(doc, sim, _)| (doc, sim)).collect())
    }

    async fn count(&self) -> Result<usize, IndexError> {
        Ok(self.inner.read().await.entries.len())
    }

    async fn contains(&self, doc_id: &str) -> Result<bool, IndexError> {
        Ok(self.inner.read().await.entries.contains_key(doc_id))
    }
}

fn clamp_metadata(mut doc: EvidenceDocument) -> EvidenceDocument {
    doc.title = truncate_chars(&doc.title, MAX_TITLE_CHARS);
    doc.journal = truncate_chars(&doc.journal, MAX_JOURNAL_CHARS);
    doc.authors.truncate(MAX_AUTHORS);
    doc.keywords.truncate(MAX_KEYWORDS);
    doc.mesh_terms.truncate(MAX_MESH_TERMS);
    doc
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn doc(pmid: &str, year: i32) -> EvidenceDocument {
        EvidenceDocument {
            pmid: Some(pmid.to_string()),
            title: format!("paper {pmid}"),
            content: "abstract text".into(),
            journal: "Test Journal".into(),
            pub_date: format!("{year}-01-15"),
            ..Default::default()
        }
    }

    fn entry(pmid: &str, year: i32, vector: Vec<f32>) -> IndexEntry {
        IndexEntry {
            document: doc(pmid, year),
            vector,
        }
    }

    #[tokio::test]
    async fn upsert_same_id_is_idempotent() {
        let index = MemoryIndex::new();
        index.upsert(vec![entry("1", 2024, vec![1.0, 0.0])]).await.unwrap();
        index.upsert(vec![entry("1", 2024, vec![1.0, 0.0])]).await.unwrap();
        assert_eq!(index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn upsert_same_id_overwrites_metadata() {
        let index = MemoryIndex::new();
        index.upsert(vec![entry("1", 2020, vec![1.0, 0.0])]).await.unwrap();
        let mut updated = entry("1", 2020, vec![1.0, 0.0]);
        updated.document.journal = "Lancet".into();
        index.upsert(vec![updated]).await.unwrap();

        let results = index
            .query(&[1.0, 0.0], 5, &SearchFilters::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.journal, "Lancet");
    }

    #[tokio::test]
    async fn query_orders_by_similarity() {
        let index = MemoryIndex::new();
        index
            .upsert(vec![
                entry("near", 2024, vec![1.0, 0.1]),
                entry("far", 2024, vec![0.0, 1.0]),
                entry("mid", 2024, vec![0.7, 0.7]),
            ])
            .await
            .unwrap();

        let results = index
            .query(&[1.0, 0.0], 3, &SearchFilters::default())
            .await
            .unwrap();
        let ids: Vec<_> = results.iter().map(|(d, _)| d.pmid.clone().unwrap()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
        assert!(results[0].1 > results[1].1);
        assert!(results[1].1 > results[2].1);
    }

    #[tokio::test]
    async fn query_respects_k() {
        let index = MemoryIndex::new();
        index
            .upsert((0..10).map(|i| entry(&i.to_string(), 2024, vec![1.0, i as f32])).collect())
            .await
            .unwrap();
        let results = index
            .query(&[1.0, 0.0], 3, &SearchFilters::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn equal_similarity_tie_at_k_resolved_by_recency() {
        // Identical vectors straddling the k boundary: the newer paper must
        // win every time, regardless of map iteration order.
        for _ in 0..20 {
            let index = MemoryIndex::new();
            index.upsert(vec![entry("old", 2015, vec![1.0, 0.0])]).await.unwrap();
            index.upsert(vec![entry("new", 2024, vec![1.0, 0.0])]).await.unwrap();
            let results = index
                .query(&[1.0, 0.0], 1, &SearchFilters::default())
                .await
                .unwrap();
            assert_eq!(results[0].0.pmid.as_deref(), Some("new"));
        }
    }

    #[tokio::test]
    async fn full_tie_at_k_resolved_by_arrival_order() {
        // Same similarity and same date: first arrival wins.
        for _ in 0..20 {
            let index = MemoryIndex::new();
            index.upsert(vec![entry("first", 2024, vec![1.0, 0.0])]).await.unwrap();
            index.upsert(vec![entry("second", 2024, vec![1.0, 0.0])]).await.unwrap();
            let results = index
                .query(&[1.0, 0.0], 1, &SearchFilters::default())
                .await
                .unwrap();
            assert_eq!(results[0].0.pmid.as_deref(), Some("first"));
        }
    }

    #[tokio::test]
    async fn min_year_filter_drops_old_papers() {
        let index = MemoryIndex::new();
        index
            .upsert(vec![
                entry("old", 2015, vec![1.0, 0.0]),
                entry("new", 2024, vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let filters = SearchFilters { min_year: Some(2020) };
        let results = index.query(&[1.0, 0.0], 10, &filters).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.pmid.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn undated_papers_excluded_when_filter_set() {
        let index = MemoryIndex::new();
        let mut undated = entry("x", 2024, vec![1.0, 0.0]);
        undated.document.pub_date = String::new();
        index.upsert(vec![undated]).await.unwrap();

        let filters = SearchFilters { min_year: Some(2020) };
        assert!(index.query(&[1.0, 0.0], 10, &filters).await.unwrap().is_empty());
        assert_eq!(
            index
                .query(&[1.0, 0.0], 10, &SearchFilters::default())
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn contains_reflects_membership() {
        let index = MemoryIndex::new();
        index.upsert(vec![entry("42", 2024, vec![1.0, 0.0])]).await.unwrap();
        assert!(index.contains("pmid_42").await.unwrap());
        assert!(!index.contains("pmid_43").await.unwrap());
    }

    #[tokio::test]
    async fn dimension_mismatch_rejected() {
        let index = MemoryIndex::new();
        index.upsert(vec![entry("1", 2024, vec![1.0, 0.0])]).await.unwrap();
        let result = index.upsert(vec![entry("2", 2024, vec![1.0, 0.0, 0.0])]).await;
        assert!(matches!(
            result,
            Err(IndexError::DimensionMismatch { expected: 2, got: 3 })
        ));
        let result = index.query(&[1.0], 5, &SearchFilters::default()).await;
        assert!(matches!(result, Err(IndexError::DimensionMismatch { .. })));
    }

    #[tokio::test]
    async fn metadata_clamped_on_insert() {
        let index = MemoryIndex::new();
        let mut e = entry("1", 2024, vec![1.0, 0.0]);
        e.document.title = "x".repeat(5000);
        e.document.authors = (0..30).map(|i| format!("author {i}")).collect();
        index.upsert(vec![e]).await.unwrap();

        let results = index
            .query(&[1.0, 0.0], 1, &SearchFilters::default())
            .await
            .unwrap();
        assert_eq!(results[0].0.title.chars().count(), 1000);
        assert_eq!(results[0].0.authors.len(), 10);
    }

    #[tokio::test]
    async fn snapshot_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.json");

        {
            let index = MemoryIndex::open(&path).await.unwrap();
            index
                .upsert(vec![entry("1", 2024, vec![1.0, 0.0]), entry("2", 2023, vec![0.0, 1.0])])
                .await
                .unwrap();
        }

        let reopened = MemoryIndex::open(&path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 2);
        assert!(reopened.contains("pmid_1").await.unwrap());
        // Snapshot preserves query behaviour.
        let results = reopened
            .query(&[1.0, 0.0], 1, &SearchFilters::default())
            .await
            .unwrap();
        assert_eq!(results[0].0.pmid.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn open_missing_snapshot_is_empty() {
        let tmp = TempDir::new().unwrap();
        let index = MemoryIndex::open(&tmp.path().join("absent.json")).await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
    }
}
