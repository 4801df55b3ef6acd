use tracing::warn;

use super::domain::{DifficultyLevel, InterviewRound, Question, QuestionId};
use super::model::{AssessmentModel, GeneratedQuestion, GenerationRequest};

const HR_FALLBACKS: [&str; 6] = [
    "Tell me about a time when you had to handle a conflict with a team member.",
    "What motivates you to excel in your career?",
    "Describe a situation where you demonstrated leadership.",
    "Where do you see yourself in five years?",
    "How do you handle pressure and tight deadlines?",
    "Tell me about a challenging project and how you managed it.",
];

const FALLBACK_KEYWORDS: [&str; 5] = ["experience", "skills", "knowledge", "examples", "approach"];

/// Map the last overall score to the next difficulty tier.
pub fn next_difficulty(last_score: f64) -> DifficultyLevel {
    if last_score >= 80.0 {
        DifficultyLevel::Hard
    } else if last_score >= 50.0 {
        DifficultyLevel::Medium
    } else {
        DifficultyLevel::Easy
    }
}

/// Adaptive, diversity-aware question selection.
///
/// Delegates to the assessment model and validates the output against the
/// exclusion set; malformed or duplicate generations drop to a static
/// per-round pool so selection never fails.
#[derive(Debug, Default, Clone)]
pub struct QuestionSelector;

impl QuestionSelector {
    pub async fn next<M>(&self, model: &M, request: &GenerationRequest) -> Question
    where
        M: AssessmentModel + ?Sized,
    {
        match model.generate_question(request).await {
            Ok(generated) => self.accept(generated, request).unwrap_or_else(|| {
                warn!(
                    round = request.round.label(),
                    "generator output rejected, using static pool"
                );
                self.fallback(request)
            }),
            Err(err) => {
                warn!(error = %err, round = request.round.label(), "question generation failed, using static pool");
                self.fallback(request)
            }
        }
    }

    /// Validate a raw generation: non-empty prompt and not a repeat of any
    /// excluded question.
    pub fn accept(
        &self,
        generated: GeneratedQuestion,
        request: &GenerationRequest,
    ) -> Option<Question> {
        let prompt = generated.question.trim();
        if prompt.is_empty() {
            return None;
        }
        if request
            .exclude_questions
            .iter()
            .any(|excluded| excluded == prompt)
        {
            return None;
        }

        let keywords = if generated.keywords.is_empty() {
            default_keywords()
        } else {
            generated.keywords
        };

        Some(Question {
            id: QuestionId::generate(),
            prompt: prompt.to_string(),
            ideal_answer: generated.ideal_answer,
            keywords,
            difficulty: request.difficulty,
            round: request.round,
            is_coding: generated.is_coding,
        })
    }

    /// First pool entry not already excluded; cycles back to the first entry
    /// when every option has been asked.
    pub fn fallback(&self, request: &GenerationRequest) -> Question {
        let pool = match request.round {
            InterviewRound::Technical => technical_fallbacks(&request.job_role),
            InterviewRound::Hr => HR_FALLBACKS.iter().map(|text| text.to_string()).collect(),
        };

        let prompt = pool
            .iter()
            .find(|candidate| {
                !request
                    .exclude_questions
                    .iter()
                    .any(|excluded| excluded == *candidate)
            })
            .unwrap_or(&pool[0])
            .clone();

        Question {
            id: QuestionId::generate(),
            prompt,
            ideal_answer:
                "A strong answer should cover relevant experience, specific examples, and demonstrate domain knowledge."
                    .to_string(),
            keywords: default_keywords(),
            difficulty: request.difficulty,
            round: request.round,
            is_coding: false,
        }
    }
}

fn technical_fallbacks(job_role: &str) -> Vec<String> {
    vec![
        format!("Explain the core concepts and best practices of {job_role}."),
        format!("Describe a challenging technical problem you solved as a {job_role}."),
        format!("What tools and technologies do you use most as a {job_role}?"),
        format!("Walk me through how you would design a system for a common {job_role} task."),
        "What is your approach to debugging and troubleshooting?".to_string(),
        "Explain a complex concept from your domain in simple terms.".to_string(),
    ]
}

fn default_keywords() -> Vec<String> {
    FALLBACK_KEYWORDS.iter().map(|word| word.to_string()).collect()
}
