//! Evidence quality assessment over a retrieved document set.

use caduceus_core::config::STUDY_DESIGNS;
use caduceus_core::{EvidenceAssessment, EvidenceDocument, EvidenceLevel, ScoringConfig};
use chrono::{Datelike, Utc};

/// Assess the aggregate quality of a document set.
pub fn assess(documents: &[EvidenceDocument], config: &ScoringConfig) -> EvidenceAssessment {
    assess_at(documents, config, Utc::now().year())
}

/// Assessment with an explicit current year, for deterministic tests.
pub fn assess_at(
    documents: &[EvidenceDocument],
    config: &ScoringConfig,
    current_year: i32,
) -> EvidenceAssessment {
    let mut total_score: u64 = 0;
    let mut recent_documents = 0;
    let mut high_impact_documents = 0;

    for doc in documents {
        let mut score: u32 = 1;

        if config.is_high_impact(&doc.journal) {
            score += config.high_impact_bonus;
            high_impact_documents += 1;
        }

        score += study_design_bonus(doc);

        // Current-year papers score; last year's count as recent only.
        match doc.pub_year() {
            Some(y) if y == current_year => {
                score += config.current_year_bonus;
                recent_documents += 1;
            }
            Some(y) if y == current_year - 1 => recent_documents += 1,
            _ => {}
        }

        total_score += u64::from(score);
    }

    let total_documents = documents.len();
    let average_score = if total_documents > 0 {
        total_score as f64 / total_documents as f64
    } else {
        0.0
    };

    // Threshold order matters: High is gated on both average and impact
    // count, so one strong paper alone cannot reach it.
    let level = if average_score >= config.high_min_average
        && high_impact_documents >= config.high_min_impact_count
    {
        EvidenceLevel::High
    } else if average_score >= config.moderate_min_average
        && total_documents >= config.moderate_min_documents
    {
        EvidenceLevel::Moderate
    } else if average_score >= config.low_min_average {
        EvidenceLevel::Low
    } else {
        EvidenceLevel::VeryLow
    };

    EvidenceAssessment {
        level,
        average_score,
        total_documents,
        recent_documents,
        high_impact_documents,
        summary: format!(
            "Evidence based on {total_documents} papers, {recent_documents} recent, \
             {high_impact_documents} from high-impact journals"
        ),
    }
}

/// First matching study design wins, in priority order.
fn study_design_bonus(doc: &EvidenceDocument) -> u32 {
    let text = format!("{} {}", doc.title, doc.content).to_lowercase();
    STUDY_DESIGNS
        .iter()
        .find(|(pattern, _, _)| text.contains(pattern))
        .map(|(_, _, bonus)| *bonus)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEAR: i32 = 2026;

    fn doc(journal: &str, text: &str, year: i32) -> EvidenceDocument {
        EvidenceDocument {
            pmid: Some("1".into()),
            title: String::new(),
            content: text.into(),
            journal: journal.into(),
            pub_date: format!("{year}-05"),
            ..Default::default()
        }
    }

    fn cfg() -> ScoringConfig {
        ScoringConfig::default()
    }

    #[test]
    fn empty_set_is_very_low() {
        let a = assess_at(&[], &cfg(), YEAR);
        assert_eq!(a.level, EvidenceLevel::VeryLow);
        assert_eq!(a.average_score, 0.0);
        assert_eq!(a.total_documents, 0);
    }

    #[test]
    fn base_score_is_one() {
        // Plain paper: no journal bonus, no study design, not recent.
        let a = assess_at(&[doc("Obscure Journal", "plain text", YEAR - 3)], &cfg(), YEAR);
        assert_eq!(a.average_score, 1.0);
        assert_eq!(a.level, EvidenceLevel::VeryLow);
    }

    #[test]
    fn first_matching_study_design_wins() {
        // Mentions both RCT and cohort study; RCT has priority.
        let d = doc(
            "Obscure Journal",
            "a randomized controlled trial extending an earlier cohort study",
            YEAR - 3,
        );
        // 1 base + 5 RCT = 6.
        let a = assess_at(std::slice::from_ref(&d), &cfg(), YEAR);
        assert_eq!(a.average_score, 6.0);
    }

    #[test]
    fn current_year_scores_previous_year_counts_as_recent_only() {
        let this_year = doc("J", "x", YEAR);
        let last_year = doc("J", "x", YEAR - 1);
        let a = assess_at(&[this_year, last_year], &cfg(), YEAR);
        assert_eq!(a.recent_documents, 2);
        // 2 (base+recency) and 1 (base only).
        assert_eq!(a.average_score, 1.5);
    }

    #[test]
    fn single_strong_paper_does_not_reach_high() {
        // Average over 6 but only one high-impact paper: threshold order
        // keeps this out of High.
        let d = doc("The Lancet", "a randomized controlled trial", YEAR);
        // 1 + 2 + 5 + 1 = 9.
        let a = assess_at(std::slice::from_ref(&d), &cfg(), YEAR);
        assert_eq!(a.average_score, 9.0);
        assert_eq!(a.high_impact_documents, 1);
        assert_ne!(a.level, EvidenceLevel::High);
        // One document also fails the Moderate count gate.
        assert_eq!(a.level, EvidenceLevel::Low);
    }

    #[test]
    fn high_needs_average_and_impact_count() {
        let docs = vec![
            doc("The Lancet", "a randomized controlled trial", YEAR),
            doc("JAMA", "a randomized controlled trial", YEAR),
        ];
        let a = assess_at(&docs, &cfg(), YEAR);
        assert_eq!(a.high_impact_documents, 2);
        assert!(a.average_score >= 6.0);
        assert_eq!(a.level, EvidenceLevel::High);
    }

    #[test]
    fn moderate_needs_three_documents() {
        let mk = || doc("Obscure Journal", "a cohort study", YEAR);
        // 1 + 3 + 1 = 5 each.
        let two = assess_at(&[mk(), mk()], &cfg(), YEAR);
        assert_eq!(two.level, EvidenceLevel::Low);
        let three = assess_at(&[mk(), mk(), mk()], &cfg(), YEAR);
        assert_eq!(three.level, EvidenceLevel::Moderate);
    }

    #[test]
    fn assessment_is_deterministic() {
        let docs = vec![
            doc("The Lancet", "a systematic review", YEAR),
            doc("Nowhere Quarterly", "a case report", YEAR - 2),
        ];
        let a = assess_at(&docs, &cfg(), YEAR);
        let b = assess_at(&docs, &cfg(), YEAR);
        assert_eq!(a.level, b.level);
        assert_eq!(a.average_score, b.average_score);
    }

    #[test]
    fn scenario_six_rcts_two_high_impact() {
        // 6 documents, 2 high-impact, all RCT, 3 current year.
        let mut docs = Vec::new();
        for i in 0..6 {
            let journal = if i < 2 { "The Lancet" } else { "Minor Journal" };
            let year = if i < 3 { YEAR } else { YEAR - 1 };
            docs.push(doc(journal, "a randomized controlled trial", year));
        }
        let a = assess_at(&docs, &cfg(), YEAR);
        // High-impact current-year RCT scores 9; all papers at least 6.
        assert!(a.average_score >= 6.0);
        assert_eq!(a.high_impact_documents, 2);
        assert_eq!(a.recent_documents, 6);
        assert_eq!(a.level, EvidenceLevel::High);
    }

    #[test]
    fn summary_reports_counts() {
        let a = assess_at(&[doc("The Lancet", "x", YEAR)], &cfg(), YEAR);
        assert_eq!(
            a.summary,
            "Evidence based on 1 papers, 1 recent, 1 from high-impact journals"
        );
    }
}
