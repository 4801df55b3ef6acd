use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::scoring::Evaluation;

/// Identifier wrapper for interview sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Identifier wrapper for generated questions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionId(pub String);

impl QuestionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// The two ordered assessment rounds. Technical always precedes HR and the
/// transition never reverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterviewRound {
    Technical,
    #[serde(rename = "HR")]
    Hr,
}

impl InterviewRound {
    pub const fn label(self) -> &'static str {
        match self {
            InterviewRound::Technical => "Technical",
            InterviewRound::Hr => "HR",
        }
    }
}

/// High level lifecycle status for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
}

impl SessionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
        }
    }
}

/// Difficulty tier attached to every generated question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
}

impl DifficultyLevel {
    pub const fn label(self) -> &'static str {
        match self {
            DifficultyLevel::Easy => "easy",
            DifficultyLevel::Medium => "medium",
            DifficultyLevel::Hard => "hard",
        }
    }
}

/// First-class terminal outcomes. These are results, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    TimeExpired,
    TechnicalCutoffNotMet,
    EndedByRequest,
}

impl TerminationReason {
    pub const fn label(self) -> &'static str {
        match self {
            TerminationReason::TimeExpired => "time_expired",
            TerminationReason::TechnicalCutoffNotMet => "technical_cutoff_not_met",
            TerminationReason::EndedByRequest => "ended_by_request",
        }
    }
}

/// Structured skill extraction produced by best-effort role analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleAnalysis {
    pub required_skills: Vec<String>,
    pub key_responsibilities: Vec<String>,
    pub tools_and_frameworks: Vec<String>,
    pub soft_skills: Vec<String>,
    pub experience_expectations: String,
    pub technical_topics: Vec<String>,
    pub hr_topics: Vec<String>,
}

/// Target-role context the session interviews against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleContext {
    pub job_role: String,
    pub job_description: String,
    pub experience_level: String,
    #[serde(default)]
    pub analysis: Option<RoleAnalysis>,
}

/// A generated question together with its evaluation reference material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    pub ideal_answer: String,
    pub keywords: Vec<String>,
    pub difficulty: DifficultyLevel,
    pub round: InterviewRound,
    pub is_coding: bool,
}

/// Payload submitted by the candidate for the current question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerPayload {
    pub answer_text: String,
    #[serde(default)]
    pub code_text: Option<String>,
    #[serde(default)]
    pub code_language: Option<String>,
}

/// A scored answer. Appended exactly once per question, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub question_id: QuestionId,
    pub answer_text: String,
    #[serde(default)]
    pub code_text: Option<String>,
    #[serde(default)]
    pub code_language: Option<String>,
    pub evaluation: Evaluation,
    pub answered_at: DateTime<Utc>,
}

/// The unit of work owned by the state machine.
///
/// Invariant: `responses.len() <= questions.len()`; while in progress one
/// question is queued ahead of the answered count, and the two lengths match
/// once the session completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSession {
    pub id: SessionId,
    pub invite_token: String,
    pub assessment_id: String,
    pub candidate_name: String,
    pub candidate_email: String,
    pub role: RoleContext,
    pub difficulty: DifficultyLevel,
    pub status: SessionStatus,
    pub current_round: InterviewRound,
    pub duration_minutes: u32,
    pub processing_overhead_seconds: f64,
    pub questions: Vec<Question>,
    pub responses: Vec<Response>,
    pub technical_score: Option<f64>,
    pub hr_score: Option<f64>,
    pub termination_reason: Option<TerminationReason>,
    pub created_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl InterviewSession {
    /// The queued question awaiting an answer, if any.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.responses.len())
    }

    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| &question.id == id)
    }

    /// Ordinal of the question the candidate would answer next (1-based).
    pub fn current_question_number(&self) -> usize {
        self.responses.len() + 1
    }

    pub fn responses_for_round(&self, round: InterviewRound) -> Vec<&Response> {
        self.responses
            .iter()
            .filter(|response| {
                self.question(&response.question_id)
                    .map(|question| question.round == round)
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn answered_in_round(&self, round: InterviewRound) -> usize {
        self.responses_for_round(round).len()
    }

    pub fn asked_prompts(&self) -> Vec<String> {
        self.questions
            .iter()
            .map(|question| question.prompt.clone())
            .collect()
    }

    pub fn answer_texts(&self) -> Vec<String> {
        self.responses
            .iter()
            .map(|response| response.answer_text.clone())
            .collect()
    }
}
