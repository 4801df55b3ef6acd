use serde::{Deserialize, Serialize};

/// Rubric configuration describing the component weights and strength bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub content_weight: f64,
    pub keyword_weight: f64,
    pub depth_weight: f64,
    pub communication_weight: f64,
    pub confidence_weight: f64,
    pub strong_threshold: f64,
    pub moderate_threshold: f64,
    pub neutral_confidence: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            content_weight: 0.40,
            keyword_weight: 0.20,
            depth_weight: 0.15,
            communication_weight: 0.15,
            confidence_weight: 0.10,
            strong_threshold: 80.0,
            moderate_threshold: 50.0,
            neutral_confidence: 50.0,
        }
    }
}

impl ScoringConfig {
    pub fn weighted_overall(
        &self,
        content: f64,
        keyword: f64,
        depth: f64,
        communication: f64,
        confidence: f64,
    ) -> f64 {
        content * self.content_weight
            + keyword * self.keyword_weight
            + depth * self.depth_weight
            + communication * self.communication_weight
            + confidence * self.confidence_weight
    }
}
