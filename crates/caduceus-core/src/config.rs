//! Scoring and retrieval configuration.
//!
//! Every threshold and weight in the evidence-grading and confidence
//! formulas lives here as a named field, so the scoring policy stays
//! auditable and testable in one place instead of scattered literals.

use serde::{Deserialize, Serialize};

/// Journals on the fixed high-impact allow-list. Matching is a
/// case-insensitive substring test, not a dynamic impact-factor lookup.
pub const HIGH_IMPACT_JOURNALS: &[&str] = &[
    "new england journal of medicine",
    "lancet",
    "jama",
    "bmj",
    "nature medicine",
    "cell",
    "science",
    "nature",
];

/// Study designs in detection priority order: first matching pattern wins.
/// Each entry is (lower-cased substring pattern, human label, quality bonus).
pub const STUDY_DESIGNS: &[(&str, &str, u32)] = &[
    ("randomized controlled trial", "RCT", 5),
    ("systematic review", "Systematic Review", 4),
    ("meta-analysis", "Meta-Analysis", 4),
    ("cohort study", "Cohort Study", 3),
    ("case-control study", "Case-Control Study", 2),
    ("case series", "Case Series", 1),
    ("case report", "Case Report", 1),
];

/// Tunables for evidence retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Papers requested per literature fetch.
    pub fetch_limit: usize,
    /// Days-back window for the literature fetch.
    pub days_back: i64,
    /// Top-k cap for the semantic query.
    pub max_search_results: usize,
    /// Documents below this similarity are dropped from retrieval results.
    pub similarity_threshold: f32,
    /// Publication-year floor: current year minus this many years.
    pub recency_floor_years: i32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            fetch_limit: 20,
            days_back: 30,
            max_search_results: 10,
            similarity_threshold: 0.7,
            recency_floor_years: 5,
        }
    }
}

/// Thresholds and weights for evidence grading and confidence scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// `High` requires average score >= this AND enough high-impact papers.
    pub high_min_average: f64,
    pub high_min_impact_count: usize,
    /// `Moderate` requires average score >= this AND enough papers.
    pub moderate_min_average: f64,
    pub moderate_min_documents: usize,
    /// `Low` requires average score >= this; anything else is `Very Low`.
    pub low_min_average: f64,

    /// Journal bonus added to a per-document score on an allow-list match.
    pub high_impact_bonus: u32,
    /// Bonus for publication in the current calendar year.
    pub current_year_bonus: u32,

    /// Confidence floor every recommendation starts from.
    pub confidence_base: f32,
    /// Evidence-level terms: High, Moderate, Low, Very Low.
    pub confidence_level_high: f32,
    pub confidence_level_moderate: f32,
    pub confidence_level_low: f32,
    pub confidence_level_very_low: f32,
    /// Volume terms by document count: >=5, >=3, >=1.
    pub confidence_volume_large: f32,
    pub confidence_volume_medium: f32,
    pub confidence_volume_small: f32,
    /// Weight on the recent-documents ratio.
    pub confidence_recency_weight: f32,
    /// Weight on the high-impact ratio.
    pub confidence_impact_weight: f32,
    /// Hard cap: the system never returns certainty.
    pub confidence_cap: f32,
    /// Fixed confidence on the no-evidence fallback path.
    pub no_evidence_confidence: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            high_min_average: 6.0,
            high_min_impact_count: 2,
            moderate_min_average: 4.0,
            moderate_min_documents: 3,
            low_min_average: 2.0,
            high_impact_bonus: 2,
            current_year_bonus: 1,
            confidence_base: 0.3,
            confidence_level_high: 0.4,
            confidence_level_moderate: 0.3,
            confidence_level_low: 0.2,
            confidence_level_very_low: 0.1,
            confidence_volume_large: 0.3,
            confidence_volume_medium: 0.2,
            confidence_volume_small: 0.1,
            confidence_recency_weight: 0.2,
            confidence_impact_weight: 0.1,
            confidence_cap: 0.95,
            no_evidence_confidence: 0.1,
        }
    }
}

impl ScoringConfig {
    /// True when the journal name matches the high-impact allow-list.
    pub fn is_high_impact(&self, journal: &str) -> bool {
        let journal = journal.to_lowercase();
        HIGH_IMPACT_JOURNALS.iter().any(|j| journal.contains(j))
    }
}
