pub mod config;
pub mod types;

pub use config::{RetrievalConfig, ScoringConfig};
pub use types::{
    ClinicalQuery, ClinicalRecommendation, EvidenceAssessment, EvidenceDocument, EvidenceLevel,
    ExpandedQuery, PatientContext, QueryResponse, SearchFilters, SourceRef, SupportingEvidence,
    DISCLAIMER,
};
