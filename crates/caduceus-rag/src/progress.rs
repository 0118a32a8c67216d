//! Progress reporting for long-running query processing.

/// The five stages a query passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ExtractingEntities,
    SearchingLiterature,
    ProcessingDocuments,
    SemanticSearch,
    GeneratingRecommendations,
}

impl Stage {
    /// Human-readable status line for this stage.
    pub fn message(&self) -> &'static str {
        match self {
            Stage::ExtractingEntities => "Analyzing clinical query",
            Stage::SearchingLiterature => "Searching medical literature",
            Stage::ProcessingDocuments => "Processing retrieved documents",
            Stage::SemanticSearch => "Running semantic search",
            Stage::GeneratingRecommendations => "Generating recommendations",
        }
    }

    /// Rough completion percentage when this stage begins.
    pub fn percent(&self) -> u8 {
        match self {
            Stage::ExtractingEntities => 10,
            Stage::SearchingLiterature => 30,
            Stage::ProcessingDocuments => 50,
            Stage::SemanticSearch => 70,
            Stage::GeneratingRecommendations => 90,
        }
    }
}

/// Receiver for stage transitions. Implementations must be cheap; the
/// pipeline calls this inline.
pub trait ProgressSink: Send + Sync {
    fn report(&self, stage: Stage);
}

/// Sink that discards all progress events.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _stage: Stage) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages_increase_with_stage_order() {
        let stages = [
            Stage::ExtractingEntities,
            Stage::SearchingLiterature,
            Stage::ProcessingDocuments,
            Stage::SemanticSearch,
            Stage::GeneratingRecommendations,
        ];
        for pair in stages.windows(2) {
            assert!(pair[0].percent() < pair[1].percent());
        }
    }
}
