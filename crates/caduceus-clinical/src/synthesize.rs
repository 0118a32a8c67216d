//! Recommendation synthesis from ranked evidence documents.
//!
//! Clause mining over abstracts is heuristic by nature. The key-finding
//! step sits behind [`FindingExtractor`] so the pattern strategy can be
//! swapped for a real NLP model without changing the pipeline contract.

use caduceus_core::{
    ClinicalRecommendation, EvidenceDocument, EvidenceLevel, ScoringConfig, SupportingEvidence,
    DISCLAIMER,
};
use tracing::debug;

use crate::patterns::{
    CLAUSE_FAMILIES, CONTRAINDICATION_PATTERNS, DEFAULT_STUDY_TYPE, KEY_FINDING_PATTERNS,
    STUDY_TYPE_LABELS,
};

/// Documents scanned for primary text and contraindications.
const TOP_DOCS_FOR_TEXT: usize = 3;
/// Matches taken per document per clause family.
const MATCHES_PER_FAMILY: usize = 2;
/// Clauses assembled into the primary recommendation.
const MAX_PRIMARY_FINDINGS: usize = 3;
const MAX_SUPPORTING_EVIDENCE: usize = 5;
const MAX_CONTRAINDICATIONS: usize = 7;
const MAX_FOLLOW_UP_ACTIONS: usize = 6;
const KEY_FINDING_CHARS: usize = 200;
const CONTRAINDICATION_CHARS: usize = 150;
/// Clause matches shorter than this are noise.
const MIN_CONTRAINDICATION_CHARS: usize = 10;

const GENERIC_RECOMMENDATION: &str = "Based on available evidence, consult with your healthcare \
     provider for personalized recommendations appropriate to your specific clinical situation.";

const CLOSING_CAVEAT: &str = "However, individual patient factors must be considered. Please \
     discuss these findings with your healthcare provider for personalized medical advice.";

const BOILERPLATE_CONTRAINDICATIONS: &[&str] = &[
    "Consult healthcare provider before making any clinical decisions",
    "Consider individual patient factors and medical history",
    "Verify drug interactions and allergies",
];

const BASELINE_ACTIONS: &[&str] = &[
    "Discuss findings with your primary care provider",
    "Schedule appropriate follow-up appointments",
    "Monitor for any adverse effects or changes",
];

/// Query-keyword families and the actions they add, applied in order;
/// the final cap decides which late entries survive.
const ACTION_FAMILIES: &[(&[&str], &[&str])] = &[
    (
        &["medication", "drug", "treatment"],
        &[
            "Verify correct dosage and administration",
            "Check for drug interactions",
            "Monitor therapeutic response",
        ],
    ),
    (
        &["diagnosis", "symptom", "condition"],
        &[
            "Consider additional diagnostic tests if indicated",
            "Monitor symptom progression",
            "Seek immediate care for concerning symptoms",
        ],
    ),
    (
        &["surgery", "procedure", "operation"],
        &[
            "Discuss risks and benefits with surgeon",
            "Obtain second opinion if appropriate",
            "Review pre and post-operative care",
        ],
    ),
];

/// Strategy for pulling a single key finding out of abstract text.
pub trait FindingExtractor: Send + Sync {
    fn extract_finding(&self, content: &str) -> String;
}

/// Default pattern-based extractor: labelled conclusion/results/findings
/// sections first, first sentence as fallback.
pub struct PatternFindingExtractor;

impl FindingExtractor for PatternFindingExtractor {
    fn extract_finding(&self, content: &str) -> String {
        let lower = content.to_lowercase();
        for pattern in KEY_FINDING_PATTERNS.iter() {
            if let Some(caps) = pattern.captures(&lower)
                && let Some(m) = caps.get(1)
            {
                return truncate_with_ellipsis(m.as_str().trim(), KEY_FINDING_CHARS);
            }
        }
        // Fallback keeps the source casing; only pattern matching runs
        // over the lowered buffer.
        if let Some(first) = content.split(". ").next()
            && !first.is_empty()
        {
            return truncate_with_ellipsis(first.trim(), KEY_FINDING_CHARS);
        }
        "Key finding not extracted".to_string()
    }
}

/// Text artifacts derived from the ranked document set.
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    pub primary_recommendation: String,
    pub supporting_evidence: Vec<SupportingEvidence>,
    pub contraindications: Vec<String>,
    pub follow_up_actions: Vec<String>,
}

/// Synthesize recommendation text from ranked documents using the default
/// finding extractor.
pub fn synthesize(query: &str, documents: &[EvidenceDocument]) -> SynthesisOutput {
    synthesize_with(&PatternFindingExtractor, query, documents)
}

/// Synthesize with a caller-supplied finding extractor.
pub fn synthesize_with(
    extractor: &dyn FindingExtractor,
    query: &str,
    documents: &[EvidenceDocument],
) -> SynthesisOutput {
    debug!(documents = documents.len(), "synthesizing recommendation");
    SynthesisOutput {
        primary_recommendation: primary_recommendation(documents),
        supporting_evidence: supporting_evidence(extractor, documents),
        contraindications: contraindications(documents),
        follow_up_actions: follow_up_actions(query),
    }
}

/// The fixed safety response for the no-evidence path. Bypasses all
/// scoring; a terminal outcome, not an error.
pub fn no_evidence_recommendation(
    config: &ScoringConfig,
    processing_time: f64,
) -> ClinicalRecommendation {
    ClinicalRecommendation {
        primary_recommendation: "Insufficient evidence found. Please consult with a healthcare \
             provider."
            .to_string(),
        evidence_level: EvidenceLevel::Low,
        confidence_score: config.no_evidence_confidence,
        supporting_evidence: Vec::new(),
        contraindications: vec![
            "Consult healthcare provider before any clinical decisions".to_string(),
        ],
        follow_up_actions: vec!["Seek professional medical advice".to_string()],
        evidence_summary: "No relevant evidence retrieved".to_string(),
        disclaimer: DISCLAIMER.to_string(),
        processing_time,
    }
}

fn primary_recommendation(documents: &[EvidenceDocument]) -> String {
    let mut findings: Vec<String> = Vec::new();

    for doc in documents.iter().take(TOP_DOCS_FOR_TEXT) {
        let content = doc.content.to_lowercase();
        for family in CLAUSE_FAMILIES.iter() {
            for m in family.find_iter(&content).take(MATCHES_PER_FAMILY) {
                findings.push(m.as_str().trim().to_string());
            }
        }
    }

    if findings.is_empty() {
        return GENERIC_RECOMMENDATION.to_string();
    }

    let mut parts = vec![
        "Based on current medical literature:".to_string(),
        format!("Evidence from {} recent studies suggests:", documents.len()),
    ];
    for (i, finding) in findings.iter().take(MAX_PRIMARY_FINDINGS).enumerate() {
        parts.push(format!("{}. {}", i + 1, finding));
    }
    parts.push(CLOSING_CAVEAT.to_string());
    parts.join(" ")
}

fn supporting_evidence(
    extractor: &dyn FindingExtractor,
    documents: &[EvidenceDocument],
) -> Vec<SupportingEvidence> {
    documents
        .iter()
        .take(MAX_SUPPORTING_EVIDENCE)
        .map(|doc| SupportingEvidence {
            id: doc.doc_id(),
            title: doc.title.clone(),
            journal: doc.journal.clone(),
            pub_date: doc.pub_date.clone(),
            relevance: doc.relevance,
            key_finding: extractor.extract_finding(&doc.content),
            study_type: study_type(doc).to_string(),
        })
        .collect()
}

/// Infer the study design label from title + content; first match wins.
pub fn study_type(doc: &EvidenceDocument) -> &'static str {
    let text = format!("{} {}", doc.title, doc.content).to_lowercase();
    STUDY_TYPE_LABELS
        .iter()
        .find(|(pattern, _)| text.contains(pattern))
        .map(|(_, label)| *label)
        .unwrap_or(DEFAULT_STUDY_TYPE)
}

fn contraindications(documents: &[EvidenceDocument]) -> Vec<String> {
    let mut out: Vec<String> = BOILERPLATE_CONTRAINDICATIONS
        .iter()
        .map(|s| s.to_string())
        .collect();

    for doc in documents.iter().take(TOP_DOCS_FOR_TEXT) {
        let content = doc.content.to_lowercase();
        for pattern in CONTRAINDICATION_PATTERNS.iter() {
            for m in pattern.find_iter(&content).take(MATCHES_PER_FAMILY) {
                let clause = m.as_str().trim();
                if clause.len() > MIN_CONTRAINDICATION_CHARS {
                    out.push(truncate_chars(clause, CONTRAINDICATION_CHARS));
                }
            }
        }
    }

    out.truncate(MAX_CONTRAINDICATIONS);
    out
}

fn follow_up_actions(query: &str) -> Vec<String> {
    let mut actions: Vec<String> = BASELINE_ACTIONS.iter().map(|s| s.to_string()).collect();

    let query_lower = query.to_lowercase();
    for (keywords, family_actions) in ACTION_FAMILIES {
        if keywords.iter().any(|k| query_lower.contains(k)) {
            actions.extend(family_actions.iter().map(|s| s.to_string()));
        }
    }

    actions.truncate(MAX_FOLLOW_UP_ACTIONS);
    actions
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        format!("{s}...")
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}...")
    }
}
