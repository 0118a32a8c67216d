//! Literature-source collaborator interface and the PubMed client.
//!
//! The pipeline depends only on [`LiteratureSource`]; [`PubMedClient`] is
//! the production implementation against the NCBI E-utilities, and
//! [`NullSource`] serves offline runs and tests.

pub mod client;
mod xml;

use async_trait::async_trait;
use caduceus_core::EvidenceDocument;
use thiserror::Error;

pub use client::PubMedClient;

#[derive(Debug, Error)]
pub enum LiteratureError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),
}

/// An external supplier of raw evidence documents.
///
/// Implementations must tolerate partial or zero results; transport
/// failures are surfaced as errors and the caller decides whether to
/// degrade or propagate.
#[async_trait]
pub trait LiteratureSource: Send + Sync {
    /// Fetch recent papers matching the search terms, at most `limit`,
    /// published within the last `days_back` days.
    async fn fetch(
        &self,
        search_terms: &[String],
        limit: usize,
        days_back: i64,
    ) -> Result<Vec<EvidenceDocument>, LiteratureError>;
}

/// A literature source that always returns nothing. Used for offline
/// operation, where retrieval runs purely against the local index.
pub struct NullSource;

#[async_trait]
impl LiteratureSource for NullSource {
    async fn fetch(
        &self,
        _search_terms: &[String],
        _limit: usize,
        _days_back: i64,
    ) -> Result<Vec<EvidenceDocument>, LiteratureError> {
        Ok(Vec::new())
    }
}
