//! PubMed E-utilities client: esearch for PMIDs, efetch for abstracts.

use std::time::Duration;

use async_trait::async_trait;
use caduceus_core::EvidenceDocument;
use chrono::Utc;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::info;

use crate::xml::parse_articles;
use crate::{LiteratureError, LiteratureSource};

const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// NCBI asks callers to batch and pace efetch requests.
const FETCH_BATCH_SIZE: usize = 10;
const BATCH_PAUSE: Duration = Duration::from_millis(500);

#[derive(Deserialize)]
struct EsearchResponse {
    esearchresult: EsearchResult,
}

#[derive(Deserialize)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

/// Client for the NCBI E-utilities endpoints.
pub struct PubMedClient {
    client: reqwest::Client,
    base_url: String,
    email: Option<String>,
    api_key: Option<String>,
}

impl PubMedClient {
    pub fn new() -> Self {
        Self::with_base_url(EUTILS_BASE.to_string())
    }

    /// Point the client at an alternate E-utilities endpoint (mirrors, tests).
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            email: None,
            api_key: None,
        }
    }

    /// Attach the contact email NCBI requires and an optional API key for
    /// higher rate limits.
    pub fn with_credentials(mut self, email: Option<String>, api_key: Option<String>) -> Self {
        self.email = email;
        self.api_key = api_key;
        self
    }

    fn credential_params(&self) -> String {
        let mut s = String::new();
        if let Some(email) = &self.email {
            s.push_str(&format!("&email={}", urlencoding::encode(email)));
        }
        if let Some(key) = &self.api_key {
            s.push_str(&format!("&api_key={}", urlencoding::encode(key)));
        }
        s
    }

    async fn search_pmids(&self, term: &str, limit: usize) -> Result<Vec<String>, LiteratureError> {
        let url = format!(
            "{}/esearch.fcgi?db=pubmed&term={}&retmode=json&retmax={}&sort=relevance{}",
            self.base_url,
            urlencoding::encode(term),
            limit,
            self.credential_params(),
        );

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LiteratureError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let search: EsearchResponse = resp.json().await?;
        Ok(search.esearchresult.idlist)
    }

    async fn fetch_batch(&self, pmids: &[String]) -> Result<Vec<EvidenceDocument>, LiteratureError> {
        let url = format!(
            "{}/efetch.fcgi?db=pubmed&id={}&retmode=xml&rettype=abstract{}",
            self.base_url,
            pmids.join(","),
            self.credential_params(),
        );

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LiteratureError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let xml = resp.text().await?;
        parse_articles(&xml)
    }
}

impl Default for PubMedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LiteratureSource for PubMedClient {
    async fn fetch(
        &self,
        search_terms: &[String],
        limit: usize,
        days_back: i64,
    ) -> Result<Vec<EvidenceDocument>, LiteratureError> {
        let from = (Utc::now() - chrono::Duration::days(days_back))
            .format("%Y/%m/%d")
            .to_string();
        let term = build_term_query(search_terms, &from);

        info!(term = %term, limit, "searching PubMed");
        let pmids = self.search_pmids(&term, limit).await?;
        if pmids.is_empty() {
            info!("no PMIDs matched the query");
            return Ok(Vec::new());
        }

        let mut papers = Vec::with_capacity(pmids.len());
        for (i, batch) in pmids.chunks(FETCH_BATCH_SIZE).enumerate() {
            if i > 0 {
                sleep(BATCH_PAUSE).await;
            }
            papers.extend(self.fetch_batch(batch).await?);
        }

        info!(count = papers.len(), "retrieved papers from PubMed");
        Ok(papers)
    }
}

/// Build an esearch term: quoted search terms ANDed together, constrained
/// to publication dates from `from_date` (YYYY/MM/DD) onward.
fn build_term_query(search_terms: &[String], from_date: &str) -> String {
    let mut term = search_terms
        .iter()
        .map(|t| format!("\"{t}\""))
        .collect::<Vec<_>>()
        .join(" AND ");
    term.push_str(&format!(" AND {from_date}[PDAT]:3000[PDAT]"));
    term
}
