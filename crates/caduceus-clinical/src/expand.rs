//! Entity-aware query expansion.
//!
//! Runs the fixed entity battery over the query, folds in patient context,
//! and produces the search-term list, enhanced query text, and retrieval
//! filters. Expansion never fails outward: if anything goes wrong it
//! degrades to the identity expansion instead of surfacing an error —
//! availability over precision.

use caduceus_core::{ExpandedQuery, PatientContext, RetrievalConfig, SearchFilters};
use chrono::{Datelike, Utc};
use tracing::debug;

use crate::patterns::ENTITY_PATTERNS;

/// Maximum number of search terms forwarded to the literature source.
pub const MAX_SEARCH_TERMS: usize = 10;

/// Expand a clinical query with extracted entities and patient context.
pub fn expand(
    query: &str,
    patient: Option<&PatientContext>,
    config: &RetrievalConfig,
) -> ExpandedQuery {
    expand_at(query, patient, config, Utc::now().year())
}

/// Expansion with an explicit current year, for deterministic tests.
pub fn expand_at(
    query: &str,
    patient: Option<&PatientContext>,
    config: &RetrievalConfig,
    current_year: i32,
) -> ExpandedQuery {
    match try_expand(query, patient, config, current_year) {
        Some(expanded) => expanded,
        None => {
            debug!("entity battery unavailable, using identity expansion");
            ExpandedQuery::identity(query)
        }
    }
}

fn try_expand(
    query: &str,
    patient: Option<&PatientContext>,
    config: &RetrievalConfig,
    current_year: i32,
) -> Option<ExpandedQuery> {
    // An empty battery means pattern compilation failed; degrade rather
    // than silently extracting nothing.
    if ENTITY_PATTERNS.iter().all(|(_, rs)| rs.is_empty()) {
        return None;
    }

    let entities = extract_entities(&query.to_lowercase());
    let search_terms = build_search_terms(query, &entities, patient);
    let enhanced_query = build_enhanced_query(query, &entities, patient);

    Some(ExpandedQuery {
        original_query: query.to_string(),
        enhanced_query,
        search_terms,
        clinical_entities: entities,
        filters: SearchFilters {
            min_year: Some(current_year - config.recency_floor_years),
        },
    })
}

/// Run every category of the battery and union the matches, deduplicated
/// in first-seen order.
fn extract_entities(query_lower: &str) -> Vec<String> {
    let mut entities: Vec<String> = Vec::new();
    for (_, patterns) in ENTITY_PATTERNS.iter() {
        for pattern in patterns {
            for m in pattern.find_iter(query_lower) {
                let hit = m.as_str().to_string();
                if !entities.contains(&hit) {
                    entities.push(hit);
                }
            }
        }
    }
    entities
}

/// Age bucket used as a search term: pediatric / adult / geriatric.
fn age_group(age: u32) -> &'static str {
    if age < 18 {
        "pediatric"
    } else if age < 65 {
        "adult"
    } else {
        "geriatric"
    }
}

fn build_search_terms(
    query: &str,
    entities: &[String],
    patient: Option<&PatientContext>,
) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    let mut push = |term: &str| {
        let term = term.trim();
        if !term.is_empty() && !terms.iter().any(|t| t == term) {
            terms.push(term.to_string());
        }
    };

    push(query);
    for entity in entities {
        push(entity);
    }
    if let Some(p) = patient {
        if let Some(age) = p.age {
            push(age_group(age));
        }
        if let Some(gender) = &p.gender {
            push(gender);
        }
        for condition in &p.existing_conditions {
            push(condition);
        }
    }

    terms.truncate(MAX_SEARCH_TERMS);
    terms
}

fn build_enhanced_query(
    query: &str,
    entities: &[String],
    patient: Option<&PatientContext>,
) -> String {
    let mut parts = vec![query.to_string()];

    if !entities.is_empty() {
        parts.push(format!("Medical entities: {}", entities.join(", ")));
    }

    if let Some(p) = patient {
        let mut context_parts: Vec<String> = Vec::new();
        if let Some(age) = p.age {
            context_parts.push(format!("age {age}"));
        }
        if let Some(gender) = &p.gender {
            context_parts.push(gender.clone());
        }
        if !p.existing_conditions.is_empty() {
            context_parts.push(format!("conditions: {}", p.existing_conditions.join(", ")));
        }
        if !context_parts.is_empty() {
            parts.push(format!("Patient context: {}", context_parts.join(", ")));
        }
    }

    parts.join(". ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> RetrievalConfig {
        RetrievalConfig::default()
    }

    #[test]
    fn no_entity_match_yields_query_only_terms() {
        let e = expand_at("how do I file my taxes", None, &cfg(), 2026);
        assert!(e.clinical_entities.is_empty());
        assert_eq!(e.search_terms, vec!["how do I file my taxes".to_string()]);
        assert_eq!(e.enhanced_query, "how do I file my taxes");
    }

    #[test]
    fn extracts_entities_across_categories() {
        let e = expand_at(
            "metformin dosing for diabetes patients with elevated blood pressure",
            None,
            &cfg(),
            2026,
        );
        assert!(e.clinical_entities.contains(&"diabetes".to_string()));
        assert!(e.clinical_entities.contains(&"metformin".to_string()));
        assert!(e.clinical_entities.contains(&"blood pressure".to_string()));
    }

    #[test]
    fn entities_matched_case_insensitively() {
        let e = expand_at("Hypertension and ASPIRIN", None, &cfg(), 2026);
        assert!(e.clinical_entities.contains(&"hypertension".to_string()));
        assert!(e.clinical_entities.contains(&"aspirin".to_string()));
    }

    #[test]
    fn search_terms_dedup_preserves_first_seen_order() {
        let e = expand_at("aspirin aspirin for stroke", None, &cfg(), 2026);
        let aspirin_count = e.search_terms.iter().filter(|t| *t == "aspirin").count();
        assert_eq!(aspirin_count, 1);
        assert_eq!(e.search_terms[0], "aspirin aspirin for stroke");
    }

    #[test]
    fn search_terms_capped_at_ten() {
        let patient = PatientContext {
            age: Some(70),
            gender: Some("female".into()),
            existing_conditions: (0..12).map(|i| format!("condition {i}")).collect(),
            ..Default::default()
        };
        let e = expand_at(
            "hypertension diabetes asthma copd cancer pneumonia sepsis stroke",
            Some(&patient),
            &cfg(),
            2026,
        );
        assert!(e.search_terms.len() <= MAX_SEARCH_TERMS);
    }

    #[test]
    fn age_buckets() {
        assert_eq!(age_group(7), "pediatric");
        assert_eq!(age_group(17), "pediatric");
        assert_eq!(age_group(18), "adult");
        assert_eq!(age_group(64), "adult");
        assert_eq!(age_group(65), "geriatric");
        assert_eq!(age_group(70), "geriatric");
    }

    #[test]
    fn geriatric_term_for_age_seventy() {
        let patient = PatientContext {
            age: Some(70),
            ..Default::default()
        };
        let e = expand_at("hypertension treatment", Some(&patient), &cfg(), 2026);
        assert!(e.search_terms.contains(&"geriatric".to_string()));
    }

    #[test]
    fn enhanced_query_lists_entities_and_context() {
        let patient = PatientContext {
            age: Some(58),
            gender: Some("male".into()),
            existing_conditions: vec!["chronic kidney disease".into()],
            ..Default::default()
        };
        let e = expand_at("lisinopril for hypertension", Some(&patient), &cfg(), 2026);
        assert!(e.enhanced_query.starts_with("lisinopril for hypertension. "));
        assert!(e.enhanced_query.contains("Medical entities: "));
        assert!(e.enhanced_query.contains("lisinopril"));
        assert!(
            e.enhanced_query
                .contains("Patient context: age 58, male, conditions: chronic kidney disease")
        );
    }

    #[test]
    fn filters_carry_recency_floor() {
        let e = expand_at("sepsis management", None, &cfg(), 2026);
        assert_eq!(e.filters.min_year, Some(2021));
    }
}
