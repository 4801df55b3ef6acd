//! Adaptive two-round interview session engine.
//!
//! The state machine orchestrates the active-time clock, the two-phase
//! scorer, the diversity-aware question selector, and the round gate over a
//! pluggable session store and assessment model.

pub mod clock;
pub mod domain;
pub mod gate;
pub mod model;
pub mod ollama;
pub mod report;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod selector;
pub mod service;
pub mod similarity;

#[cfg(test)]
pub(crate) mod tests;

pub use clock::TimeStatus;
pub use domain::{
    AnswerPayload, DifficultyLevel, InterviewRound, InterviewSession, Question, QuestionId,
    Response, RoleAnalysis, RoleContext, SessionId, SessionStatus, TerminationReason,
};
pub use gate::GateDecision;
pub use model::{AssessmentModel, GeneratedQuestion, GenerationRequest, ModelError};
pub use ollama::OllamaModelClient;
pub use report::{
    build_report, progress_view, session_info, CandidateProgressView, InterviewReport,
    SessionInfoView,
};
pub use repository::{SessionStore, StoreError};
pub use router::interview_router;
pub use scoring::{
    round_score, AnswerScorer, AnswerStrength, CodeEvaluation, Evaluation, EvaluationPhase,
    ScoringConfig,
};
pub use selector::{next_difficulty, QuestionSelector};
pub use service::{
    EndOutcome, InterviewService, InterviewServiceError, JoinOutcome, StartInterview,
    StartOutcome, SubmitOutcome,
};
pub use similarity::{LexicalSimilarity, SemanticSimilarity};
