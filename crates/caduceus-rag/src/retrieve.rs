//! Evidence retrieval: literature ingest into the vector index and the
//! semantic query over it.
//!
//! Every step degrades instead of failing the query: a literature outage
//! yields zero fresh papers, an ingest error leaves the index as it was,
//! and the semantic search still runs over whatever the index holds.

use caduceus_core::{EvidenceDocument, ExpandedQuery, RetrievalConfig};
use caduceus_index::{Embedder, IndexEntry, VectorIndex};
use caduceus_pubmed::LiteratureSource;
use tracing::{debug, warn};

/// Fetch fresh literature for the expanded query. Transport failures are
/// logged and produce an empty batch.
pub async fn fetch_literature(
    literature: &dyn LiteratureSource,
    expanded: &ExpandedQuery,
    config: &RetrievalConfig,
) -> Vec<EvidenceDocument> {
    match literature
        .fetch(&expanded.search_terms, config.fetch_limit, config.days_back)
        .await
    {
        Ok(documents) => {
            debug!(fetched = documents.len(), "literature fetch complete");
            documents
        }
        Err(error) => {
            warn!(%error, "literature fetch failed, continuing with local index");
            Vec::new()
        }
    }
}

/// Embed and upsert fetched documents, skipping those already indexed.
/// Returns the number of newly indexed documents.
pub async fn ingest(
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    documents: Vec<EvidenceDocument>,
) -> usize {
    let mut fresh: Vec<EvidenceDocument> = Vec::new();
    for doc in documents {
        match index.contains(&doc.doc_id()).await {
            Ok(true) => {}
            Ok(false) => fresh.push(doc),
            Err(error) => {
                warn!(%error, "membership check failed, skipping document");
            }
        }
    }
    if fresh.is_empty() {
        return 0;
    }

    let texts: Vec<String> = fresh.iter().map(embedding_text).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let vectors = match embedder.embed_batch(&refs) {
        Ok(vectors) => vectors,
        Err(error) => {
            warn!(%error, "embedding failed, batch not indexed");
            return 0;
        }
    };

    let entries: Vec<IndexEntry> = fresh
        .into_iter()
        .zip(vectors)
        .map(|(document, vector)| IndexEntry { document, vector })
        .collect();
    let indexed = entries.len();

    if let Err(error) = index.upsert(entries).await {
        warn!(%error, "index upsert failed, batch not indexed");
        return 0;
    }
    debug!(indexed, "documents ingested");
    indexed
}

/// Semantic query over the index: top-k by similarity, thresholded, with
/// recency as the tie-break. Returned documents carry their similarity in
/// `relevance`.
pub async fn semantic_search(
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    expanded: &ExpandedQuery,
    config: &RetrievalConfig,
) -> Vec<EvidenceDocument> {
    let query_vector = match embedder.embed(&expanded.enhanced_query) {
        Ok(vector) => vector,
        Err(error) => {
            warn!(%error, "query embedding failed");
            return Vec::new();
        }
    };

    let hits = match index
        .query(&query_vector, config.max_search_results, &expanded.filters)
        .await
    {
        Ok(hits) => hits,
        Err(error) => {
            warn!(%error, "semantic query failed");
            return Vec::new();
        }
    };

    let mut documents: Vec<EvidenceDocument> = hits
        .into_iter()
        .filter(|(_, score)| *score >= config.similarity_threshold)
        .map(|(mut document, score)| {
            document.relevance = score;
            document
        })
        .collect();

    // Similarity first, newer paper wins ties.
    documents.sort_by(|a, b| {
        b.relevance
            .total_cmp(&a.relevance)
            .then_with(|| b.pub_date_key().cmp(&a.pub_date_key()))
    });
    documents
}

/// The canonical text embedded for a document. Keywords and MeSH sections
/// appear only when present so sparse records do not embed empty labels.
pub fn embedding_text(doc: &EvidenceDocument) -> String {
    let mut text = format!("Title: {}\n\nAbstract: {}", doc.title, doc.content);
    if !doc.keywords.is_empty() {
        text.push_str(&format!("\n\nKeywords: {}", doc.keywords.join(", ")));
    }
    if !doc.mesh_terms.is_empty() {
        text.push_str(&format!("\n\nMeSH Terms: {}", doc.mesh_terms.join(", ")));
    }
    text
}
