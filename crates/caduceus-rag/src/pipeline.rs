//! The query-processing pipeline.
//!
//! Construction validates the collaborators and fails fast; after that,
//! query processing is infallible. A mid-query failure in any stage
//! degrades that stage and the query still terminates in a well-formed
//! response, worst case the fixed no-evidence safety response.

use std::sync::Arc;
use std::time::{Duration, Instant};

use caduceus_core::{
    ClinicalQuery, ClinicalRecommendation, EvidenceDocument, QueryResponse, RetrievalConfig,
    ScoringConfig, SourceRef, DISCLAIMER,
};
use caduceus_index::{Embedder, IndexError, VectorIndex};
use caduceus_pubmed::LiteratureSource;
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::progress::{ProgressSink, Stage};
use crate::retrieve;

/// Documents projected into the response source list.
const MAX_SOURCES: usize = 5;

/// Fatal construction-time failures. Queries never return these; once a
/// pipeline exists it always answers.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("vector index unavailable: {0}")]
    Index(#[from] IndexError),
    #[error("embedder reports zero dimensionality")]
    ZeroDimension,
}

/// The retrieval-augmented recommendation pipeline.
pub struct Pipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    literature: Arc<dyn LiteratureSource>,
    retrieval: RetrievalConfig,
    scoring: ScoringConfig,
}

impl Pipeline {
    /// Build a pipeline, validating each collaborator. An unreachable
    /// index or degenerate embedder is a startup failure, not something
    /// to discover one query at a time.
    pub async fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        literature: Arc<dyn LiteratureSource>,
        retrieval: RetrievalConfig,
        scoring: ScoringConfig,
    ) -> Result<Self, PipelineError> {
        if embedder.dim() == 0 {
            return Err(PipelineError::ZeroDimension);
        }
        let indexed = index.count().await?;
        info!(indexed, dim = embedder.dim(), "pipeline ready");
        Ok(Self {
            embedder,
            index,
            literature,
            retrieval,
            scoring,
        })
    }

    /// Number of documents currently indexed.
    pub async fn document_count(&self) -> Result<usize, PipelineError> {
        Ok(self.index.count().await?)
    }

    /// Embed and index a document batch directly, bypassing literature
    /// retrieval. Returns the number of newly indexed documents.
    pub async fn seed(&self, documents: Vec<EvidenceDocument>) -> usize {
        retrieve::ingest(self.embedder.as_ref(), self.index.as_ref(), documents).await
    }

    /// Process a clinical query end to end. Never fails: degraded stages
    /// fall through to the no-evidence safety response.
    pub async fn process_query(
        &self,
        query: &ClinicalQuery,
        progress: &dyn ProgressSink,
    ) -> QueryResponse {
        let started = Instant::now();

        progress.report(Stage::ExtractingEntities);
        let expanded =
            caduceus_clinical::expand(&query.text, query.patient.as_ref(), &self.retrieval);
        info!(
            entities = expanded.clinical_entities.len(),
            terms = expanded.search_terms.len(),
            "query expanded"
        );

        progress.report(Stage::SearchingLiterature);
        let fetched =
            retrieve::fetch_literature(self.literature.as_ref(), &expanded, &self.retrieval).await;

        progress.report(Stage::ProcessingDocuments);
        retrieve::ingest(self.embedder.as_ref(), self.index.as_ref(), fetched).await;

        progress.report(Stage::SemanticSearch);
        let documents = retrieve::semantic_search(
            self.embedder.as_ref(),
            self.index.as_ref(),
            &expanded,
            &self.retrieval,
        )
        .await;

        progress.report(Stage::GeneratingRecommendations);
        let recommendation = self.recommend(&query.text, &documents, started);
        let sources = project_sources(&documents);
        let processing_time = started.elapsed().as_secs_f64();
        info!(
            documents = documents.len(),
            level = %recommendation.evidence_level,
            confidence = recommendation.confidence_score,
            elapsed = processing_time,
            "query processed"
        );

        QueryResponse {
            query: query.text.clone(),
            timestamp: Utc::now(),
            recommendation,
            sources,
            processing_time,
        }
    }

    /// Process with a hard deadline. On expiry the caller gets the fixed
    /// no-evidence safety response instead of an error.
    pub async fn process_query_with_timeout(
        &self,
        query: &ClinicalQuery,
        progress: &dyn ProgressSink,
        deadline: Duration,
    ) -> QueryResponse {
        let started = Instant::now();
        match tokio::time::timeout(deadline, self.process_query(query, progress)).await {
            Ok(response) => response,
            Err(_) => {
                warn!(deadline_secs = deadline.as_secs_f64(), "query deadline expired");
                let elapsed = started.elapsed().as_secs_f64();
                QueryResponse {
                    query: query.text.clone(),
                    timestamp: Utc::now(),
                    recommendation: caduceus_clinical::no_evidence_recommendation(
                        &self.scoring,
                        elapsed,
                    ),
                    sources: Vec::new(),
                    processing_time: elapsed,
                }
            }
        }
    }

    fn recommend(
        &self,
        query: &str,
        documents: &[EvidenceDocument],
        started: Instant,
    ) -> ClinicalRecommendation {
        if documents.is_empty() {
            return caduceus_clinical::no_evidence_recommendation(
                &self.scoring,
                started.elapsed().as_secs_f64(),
            );
        }

        let assessment = caduceus_clinical::assess(documents, &self.scoring);
        let synthesis = caduceus_clinical::synthesize(query, documents);
        let confidence = caduceus_clinical::confidence_score(&assessment, &self.scoring);

        ClinicalRecommendation {
            primary_recommendation: synthesis.primary_recommendation,
            evidence_level: assessment.level,
            confidence_score: confidence,
            supporting_evidence: synthesis.supporting_evidence,
            contraindications: synthesis.contraindications,
            follow_up_actions: synthesis.follow_up_actions,
            evidence_summary: assessment.summary,
            disclaimer: DISCLAIMER.to_string(),
            processing_time: started.elapsed().as_secs_f64(),
        }
    }
}

/// Top documents projected for the caller, with canonical PubMed links
/// where a source identifier exists.
fn project_sources(documents: &[EvidenceDocument]) -> Vec<SourceRef> {
    documents
        .iter()
        .take(MAX_SOURCES)
        .map(|doc| SourceRef {
            id: doc.doc_id(),
            title: doc.title.clone(),
            authors: doc.authors.clone(),
            journal: doc.journal.clone(),
            pub_date: doc.pub_date.clone(),
            relevance: doc.relevance,
            url: doc
                .pmid
                .as_ref()
                .filter(|p| !p.is_empty())
                .map(|p| format!("https://pubmed.ncbi.nlm.nih.gov/{p}/")),
        })
        .collect()
}
