//! Pure pipeline stages: entity-aware query expansion, evidence-quality
//! assessment, recommendation synthesis and confidence scoring.
//!
//! Everything here is deterministic and side-effect free; retrieval and
//! indexing live in their own crates.

pub mod confidence;
pub mod expand;
pub mod patterns;
pub mod quality;
pub mod synthesize;

pub use confidence::score as confidence_score;
pub use expand::expand;
pub use quality::assess;
pub use synthesize::{
    no_evidence_recommendation, synthesize, FindingExtractor, PatternFindingExtractor,
    SynthesisOutput,
};
