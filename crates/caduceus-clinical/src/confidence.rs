//! Confidence scoring for a synthesized recommendation.

use caduceus_core::{EvidenceAssessment, EvidenceLevel, ScoringConfig};

/// Compute the confidence score for an assessed document set.
///
/// A weighted sum over evidence level, document volume, recency ratio and
/// high-impact ratio, clamped at the configured cap so the system never
/// reports certainty.
pub fn score(assessment: &EvidenceAssessment, config: &ScoringConfig) -> f32 {
    if assessment.total_documents == 0 {
        return config.no_evidence_confidence;
    }

    let mut confidence = config.confidence_base;

    confidence += match assessment.level {
        EvidenceLevel::High => config.confidence_level_high,
        EvidenceLevel::Moderate => config.confidence_level_moderate,
        EvidenceLevel::Low => config.confidence_level_low,
        EvidenceLevel::VeryLow => config.confidence_level_very_low,
    };

    confidence += if assessment.total_documents >= 5 {
        config.confidence_volume_large
    } else if assessment.total_documents >= 3 {
        config.confidence_volume_medium
    } else {
        config.confidence_volume_small
    };

    let total = assessment.total_documents as f32;
    confidence += config.confidence_recency_weight * (assessment.recent_documents as f32 / total);
    confidence += config.confidence_impact_weight
        * (assessment.high_impact_documents as f32 / total);

    confidence.min(config.confidence_cap)
}
