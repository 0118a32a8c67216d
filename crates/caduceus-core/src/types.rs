//! Data model for the clinical evidence pipeline.
//!
//! Everything here is plain data: queries flow in as [`ClinicalQuery`],
//! retrieved papers are [`EvidenceDocument`]s, and the terminal artifact
//! returned to the caller is a [`QueryResponse`] wrapping a
//! [`ClinicalRecommendation`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Fixed disclaimer attached to every recommendation, including fallbacks.
pub const DISCLAIMER: &str = "This system provides general information only and should not \
     replace professional medical advice. Always consult with qualified healthcare providers \
     for clinical decisions.";

/// Optional patient context accompanying a clinical query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientContext {
    pub age: Option<u32>,
    pub gender: Option<String>,
    #[serde(default)]
    pub existing_conditions: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    /// Free-form vital sign readings, e.g. "bp" -> "142/90".
    #[serde(default)]
    pub vital_signs: std::collections::BTreeMap<String, String>,
}

/// A clinical question as submitted by the caller. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalQuery {
    pub text: String,
    pub patient: Option<PatientContext>,
}

impl ClinicalQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            patient: None,
        }
    }

    pub fn with_patient(text: impl Into<String>, patient: PatientContext) -> Self {
        Self {
            text: text.into(),
            patient: Some(patient),
        }
    }
}

/// Retrieval filters derived from query expansion.
///
/// Currently only a publication-year floor; an extension point for future
/// filter types (journal allow-lists, language, study design).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub min_year: Option<i32>,
}

/// A clinical query expanded with extracted entities, search terms, and
/// retrieval filters. Created once per query; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpandedQuery {
    pub original_query: String,
    pub enhanced_query: String,
    /// Deduplicated, first-seen order, at most 10 terms.
    pub search_terms: Vec<String>,
    pub clinical_entities: Vec<String>,
    pub filters: SearchFilters,
}

impl ExpandedQuery {
    /// Identity expansion: the degraded-but-valid fallback when entity
    /// extraction cannot run.
    pub fn identity(query: &str) -> Self {
        Self {
            original_query: query.to_string(),
            enhanced_query: query.to_string(),
            search_terms: vec![query.to_string()],
            clinical_entities: Vec::new(),
            filters: SearchFilters::default(),
        }
    }
}

/// A retrieved paper. Owned by the retriever, read-only downstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceDocument {
    /// Source identifier (PubMed ID) when the paper has one.
    pub pmid: Option<String>,
    pub title: String,
    /// Abstract or full text, whatever the source supplied.
    pub content: String,
    pub journal: String,
    /// "YYYY", "YYYY-MM", or "YYYY-MM-DD"; month may be a PubMed name ("Jan").
    pub pub_date: String,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    pub mesh_terms: Vec<String>,
    /// Retrieval relevance in [0, 1]: 1 − embedding distance. Zero until the
    /// document has been through a semantic query.
    pub relevance: f32,
}

impl EvidenceDocument {
    /// Stable identifier: `pmid_<n>` when a source ID exists, otherwise a
    /// content hash of title + abstract. Two documents with the same
    /// identifier are the same logical paper.
    pub fn doc_id(&self) -> String {
        match &self.pmid {
            Some(pmid) if !pmid.is_empty() => format!("pmid_{pmid}"),
            _ => {
                let mut hasher = Sha256::new();
                hasher.update(self.title.as_bytes());
                hasher.update(self.content.as_bytes());
                format!("{:x}", hasher.finalize())
            }
        }
    }

    /// Publication year, if the date string starts with one.
    pub fn pub_year(&self) -> Option<i32> {
        let digits: String = self.pub_date.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.len() == 4 { digits.parse().ok() } else { None }
    }

    /// Sortable (year, month, day) key. Unparseable components sort as zero,
    /// so undated papers lose recency tie-breaks.
    pub fn pub_date_key(&self) -> (i32, u32, u32) {
        let mut parts = self.pub_date.split('-');
        let year = parts.next().and_then(|y| y.trim().parse().ok()).unwrap_or(0);
        let month = parts.next().map(parse_month).unwrap_or(0);
        let day = parts.next().and_then(|d| d.trim().parse().ok()).unwrap_or(0);
        (year, month, day)
    }
}

/// Parse a numeric or PubMed-style month ("3", "03", "Mar").
fn parse_month(s: &str) -> u32 {
    let s = s.trim();
    if let Ok(n) = s.parse::<u32>() {
        return n.min(12);
    }
    match s.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => 0,
    }
}

/// Ordinal evidence grade for a retrieved document set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvidenceLevel {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Moderate,
    High,
}

impl std::fmt::Display for EvidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EvidenceLevel::VeryLow => "Very Low",
            EvidenceLevel::Low => "Low",
            EvidenceLevel::Moderate => "Moderate",
            EvidenceLevel::High => "High",
        };
        f.write_str(s)
    }
}

/// Aggregate quality assessment over a retrieved document set.
/// Recomputed fresh per query; never cached across queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceAssessment {
    pub level: EvidenceLevel,
    pub average_score: f64,
    pub total_documents: usize,
    /// Published this year or last.
    pub recent_documents: usize,
    /// From the high-impact journal allow-list.
    pub high_impact_documents: usize,
    pub summary: String,
}

/// One supporting-evidence item on a recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportingEvidence {
    pub id: String,
    pub title: String,
    pub journal: String,
    pub pub_date: String,
    pub relevance: f32,
    pub key_finding: String,
    pub study_type: String,
}

/// The terminal recommendation artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalRecommendation {
    pub primary_recommendation: String,
    pub evidence_level: EvidenceLevel,
    /// Bounded in [0.0, 0.95]; exactly 0.1 on the no-evidence path.
    pub confidence_score: f32,
    /// At most 5 items.
    pub supporting_evidence: Vec<SupportingEvidence>,
    /// At most 7 strings, boilerplate included.
    pub contraindications: Vec<String>,
    /// At most 6 strings.
    pub follow_up_actions: Vec<String>,
    pub evidence_summary: String,
    pub disclaimer: String,
    /// Seconds spent producing this recommendation.
    pub processing_time: f64,
}

/// Caller-facing projection of one source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub journal: String,
    pub pub_date: String,
    pub relevance: f32,
    /// Canonical PubMed URL; absent for content-hash identifiers.
    pub url: Option<String>,
}

/// Final response returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub recommendation: ClinicalRecommendation,
    /// Top 5 documents behind the recommendation.
    pub sources: Vec<SourceRef>,
    pub processing_time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(pmid: Option<&str>, title: &str, content: &str) -> EvidenceDocument {
        EvidenceDocument {
            pmid: pmid.map(String::from),
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    #[test]
    fn doc_id_prefers_pmid() {
        let d = doc(Some("12345"), "Title", "Abstract");
        assert_eq!(d.doc_id(), "pmid_12345");
    }

    #[test]
    fn doc_id_falls_back_to_content_hash() {
        let a = doc(None, "Statin therapy outcomes", "A cohort study of statins.");
        let b = doc(None, "Statin therapy outcomes", "A cohort study of statins.");
        let c = doc(None, "Statin therapy outcomes", "A different abstract.");
        assert_eq!(a.doc_id(), b.doc_id(), "identical title+abstract must collapse");
        assert_ne!(a.doc_id(), c.doc_id());
        assert_eq!(a.doc_id().len(), 64);
    }

    #[test]
    fn empty_pmid_treated_as_absent() {
        let a = doc(Some(""), "T", "C");
        assert!(!a.doc_id().starts_with("pmid_"));
    }

    #[test]
    fn pub_year_parses_leading_year() {
        let mut d = doc(None, "t", "c");
        d.pub_date = "2024-03-11".into();
        assert_eq!(d.pub_year(), Some(2024));
        d.pub_date = "2023".into();
        assert_eq!(d.pub_year(), Some(2023));
        d.pub_date = "".into();
        assert_eq!(d.pub_year(), None);
        d.pub_date = "n.d.".into();
        assert_eq!(d.pub_year(), None);
    }

    #[test]
    fn pub_date_key_orders_named_months() {
        let mut a = doc(None, "a", "a");
        a.pub_date = "2024-Feb-01".into();
        let mut b = doc(None, "b", "b");
        b.pub_date = "2024-10".into();
        assert!(a.pub_date_key() < b.pub_date_key());
    }

    #[test]
    fn evidence_level_serde_labels() {
        assert_eq!(
            serde_json::to_string(&EvidenceLevel::VeryLow).unwrap(),
            "\"Very Low\""
        );
        assert_eq!(serde_json::to_string(&EvidenceLevel::High).unwrap(), "\"High\"");
        let l: EvidenceLevel = serde_json::from_str("\"Moderate\"").unwrap();
        assert_eq!(l, EvidenceLevel::Moderate);
    }

    #[test]
    fn evidence_level_is_ordinal() {
        assert!(EvidenceLevel::VeryLow < EvidenceLevel::Low);
        assert!(EvidenceLevel::Low < EvidenceLevel::Moderate);
        assert!(EvidenceLevel::Moderate < EvidenceLevel::High);
    }

    #[test]
    fn identity_expansion_echoes_query() {
        let e = ExpandedQuery::identity("chest pain workup");
        assert_eq!(e.enhanced_query, "chest pain workup");
        assert_eq!(e.search_terms, vec!["chest pain workup".to_string()]);
        assert!(e.clinical_entities.is_empty());
        assert_eq!(e.filters, SearchFilters::default());
    }
}
