use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{DifficultyLevel, InterviewRound, RoleAnalysis};
use super::scoring::CodeEvaluation;

/// Inputs for one adaptive question generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub job_role: String,
    pub job_description: String,
    pub experience_level: String,
    pub difficulty: DifficultyLevel,
    pub round: InterviewRound,
    /// Diversity exclusion set: this session's questions, peer sessions in
    /// the same assessment, and the candidate's past sessions for the role.
    pub exclude_questions: Vec<String>,
    pub previous_answers: Vec<String>,
    pub last_score: Option<f64>,
    #[serde(default)]
    pub analysis: Option<RoleAnalysis>,
    pub want_coding: bool,
}

/// Raw generator output before the selector validates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub ideal_answer: String,
    pub keywords: Vec<String>,
    pub is_coding: bool,
}

/// Error enumeration for assessment-model failures. These are always masked
/// by deterministic fallbacks before they reach a caller.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model backend unavailable: {0}")]
    Backend(String),
    #[error("model call timed out")]
    Timeout,
    #[error("model returned malformed output: {0}")]
    Malformed(String),
}

/// External language-model capabilities the engine consumes. Every method is
/// fallible; callers own the degradation policy.
#[async_trait]
pub trait AssessmentModel: Send + Sync {
    async fn generate_question(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedQuestion, ModelError>;

    /// Estimate depth of knowledge in `[0, 100]` for an answer.
    async fn assess_depth(&self, question: &str, answer: &str) -> Result<f64, ModelError>;

    async fn generate_feedback(
        &self,
        question: &str,
        answer: &str,
        score: f64,
        round: InterviewRound,
    ) -> Result<String, ModelError>;

    async fn review_code(
        &self,
        question: &str,
        ideal_answer: &str,
        submitted_code: &str,
        language: &str,
    ) -> Result<CodeEvaluation, ModelError>;

    /// Structured skill extraction from a job description. Best-effort; the
    /// session proceeds without it on failure.
    async fn analyze_role(
        &self,
        job_role: &str,
        job_description: &str,
    ) -> Result<RoleAnalysis, ModelError>;
}
