mod config;
mod instant;

pub use config::ScoringConfig;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::clock::round_tenth;
use super::domain::InterviewRound;
use super::model::AssessmentModel;
use super::similarity::SemanticSimilarity;

/// Qualitative band derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerStrength {
    Strong,
    Moderate,
    Weak,
}

impl AnswerStrength {
    pub const fn label(self) -> &'static str {
        match self {
            AnswerStrength::Strong => "strong",
            AnswerStrength::Moderate => "moderate",
            AnswerStrength::Weak => "weak",
        }
    }
}

/// Which scoring pass produced an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationPhase {
    Instant,
    Deep,
    DeepFailed,
}

impl EvaluationPhase {
    pub const fn label(self) -> &'static str {
        match self {
            EvaluationPhase::Instant => "instant",
            EvaluationPhase::Deep => "deep",
            EvaluationPhase::DeepFailed => "deep_failed",
        }
    }
}

/// Reviewer scores for a coding submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeEvaluation {
    pub correctness_score: f64,
    pub quality_score: f64,
    pub efficiency_score: f64,
    pub edge_case_score: f64,
    pub overall_score: f64,
    pub feedback: String,
    pub follow_up_questions: Vec<String>,
}

/// Component scores for one answer. Every field is always present; absent
/// signals are recorded as zeros or the neutral baseline, never as missing
/// keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub content_score: f64,
    pub keyword_score: f64,
    pub depth_score: f64,
    pub communication_score: f64,
    pub confidence_score: f64,
    pub overall_score: f64,
    pub similarity_score: f64,
    pub keyword_coverage: f64,
    pub keywords_matched: Vec<String>,
    pub keywords_missed: Vec<String>,
    pub feedback: String,
    pub answer_strength: AnswerStrength,
    pub phase: EvaluationPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_evaluation: Option<CodeEvaluation>,
}

impl Evaluation {
    pub fn empty_answer(keywords: &[String]) -> Self {
        Self {
            content_score: 0.0,
            keyword_score: 0.0,
            depth_score: 0.0,
            communication_score: 0.0,
            confidence_score: 0.0,
            overall_score: 0.0,
            similarity_score: 0.0,
            keyword_coverage: 0.0,
            keywords_matched: Vec::new(),
            keywords_missed: keywords.to_vec(),
            feedback: "No answer provided.".to_string(),
            answer_strength: AnswerStrength::Weak,
            phase: EvaluationPhase::Instant,
            code_evaluation: None,
        }
    }
}

pub(crate) fn strength_for(overall: f64, config: &ScoringConfig) -> AnswerStrength {
    if overall >= config.strong_threshold {
        AnswerStrength::Strong
    } else if overall >= config.moderate_threshold {
        AnswerStrength::Moderate
    } else {
        AnswerStrength::Weak
    }
}

/// Arithmetic mean of the overall scores, rounded to one decimal. Empty
/// input yields zero so terminal aggregation never fails on a round with no
/// answers.
pub fn round_score<'a, I>(evaluations: I) -> f64
where
    I: IntoIterator<Item = &'a Evaluation>,
{
    let mut sum = 0.0;
    let mut count = 0usize;
    for evaluation in evaluations {
        sum += evaluation.overall_score;
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    round_tenth(sum / count as f64)
}

/// Two-phase answer scorer.
///
/// The instant phase runs local heuristics only and stays deterministic; the
/// deep phase refines depth and feedback through the assessment model and
/// degrades back to the instant result when the model is unavailable.
pub struct AnswerScorer {
    similarity: Box<dyn SemanticSimilarity>,
    config: ScoringConfig,
}

impl AnswerScorer {
    pub fn new(similarity: Box<dyn SemanticSimilarity>, config: ScoringConfig) -> Self {
        Self { similarity, config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Phase 1: sub-second local scoring.
    pub fn instant(&self, ideal_answer: &str, answer: &str, keywords: &[String]) -> Evaluation {
        instant::score_answer(
            ideal_answer,
            answer,
            keywords,
            self.similarity.as_ref(),
            &self.config,
        )
    }

    /// Phase 2: model-assisted depth and feedback refinement.
    ///
    /// Never returns an error. A failed depth call falls back to a
    /// similarity-scaled estimate; when every model call fails the instant
    /// result is returned tagged `deep_failed`.
    pub async fn deep<M>(
        &self,
        model: &M,
        question: &str,
        answer: &str,
        round: InterviewRound,
        instant_result: &Evaluation,
    ) -> Evaluation
    where
        M: AssessmentModel + ?Sized,
    {
        let (depth_result, feedback_result) = tokio::join!(
            model.assess_depth(question, answer),
            model.generate_feedback(question, answer, instant_result.overall_score, round),
        );

        if depth_result.is_err() && feedback_result.is_err() {
            debug!("deep evaluation unavailable, keeping instant result");
            return Evaluation {
                phase: EvaluationPhase::DeepFailed,
                ..instant_result.clone()
            };
        }

        let depth = match depth_result {
            Ok(score) => score.clamp(0.0, 100.0),
            Err(err) => {
                debug!(error = %err, "depth assessment failed, scaling similarity instead");
                instant_result.similarity_score * 0.8
            }
        };

        let overall = self.config.weighted_overall(
            instant_result.content_score,
            instant_result.keyword_score,
            depth,
            instant_result.communication_score,
            instant_result.confidence_score,
        );

        let feedback = match feedback_result {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => fallback_feedback(overall),
        };

        Evaluation {
            depth_score: round_tenth(depth),
            overall_score: round_tenth(overall),
            feedback,
            answer_strength: strength_for(overall, &self.config),
            phase: EvaluationPhase::Deep,
            ..instant_result.clone()
        }
    }

    /// Deterministic coding path: reviewer scores from the model, or a
    /// similarity proxy with fixed moderate defaults when the reviewer is
    /// unreachable.
    pub async fn code<M>(
        &self,
        model: &M,
        question: &str,
        ideal_answer: &str,
        submitted_code: &str,
        language: &str,
    ) -> Evaluation
    where
        M: AssessmentModel + ?Sized,
    {
        let (review, phase) = match model
            .review_code(question, ideal_answer, submitted_code, language)
            .await
        {
            Ok(review) => (review, EvaluationPhase::Deep),
            Err(err) => {
                warn!(error = %err, "code review unavailable, falling back to similarity proxy");
                let proxy = self.similarity.score(ideal_answer, submitted_code);
                (
                    CodeEvaluation {
                        correctness_score: round_tenth(proxy),
                        quality_score: 50.0,
                        efficiency_score: 50.0,
                        edge_case_score: 40.0,
                        overall_score: round_tenth(proxy * 0.8),
                        feedback: "Code submitted. Review the expected solution for comparison."
                            .to_string(),
                        follow_up_questions: vec![
                            "Can you explain the time complexity of your solution?".to_string(),
                            "How would you handle edge cases?".to_string(),
                        ],
                    },
                    EvaluationPhase::DeepFailed,
                )
            }
        };

        let overall = review.overall_score;
        Evaluation {
            content_score: review.correctness_score,
            keyword_score: review.quality_score,
            depth_score: review.efficiency_score,
            communication_score: review.quality_score,
            confidence_score: self.config.neutral_confidence,
            overall_score: overall,
            similarity_score: review.correctness_score,
            keyword_coverage: 0.0,
            keywords_matched: Vec::new(),
            keywords_missed: Vec::new(),
            feedback: review.feedback.clone(),
            answer_strength: strength_for(overall, &self.config),
            phase,
            code_evaluation: Some(review),
        }
    }
}

fn fallback_feedback(score: f64) -> String {
    if score >= 70.0 {
        "Good answer with relevant details. Consider adding more specific examples to strengthen your response.".to_string()
    } else if score >= 40.0 {
        "Decent answer but could be more detailed. Include specific examples and demonstrate deeper knowledge.".to_string()
    } else {
        "Answer needs improvement. Focus on addressing the question directly with relevant examples and key concepts.".to_string()
    }
}
