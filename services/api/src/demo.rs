use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use clap::Args;
use interview_ai::config::EngineConfig;
use interview_ai::error::AppError;
use interview_ai::workflows::interview::{
    AnswerPayload, AnswerScorer, AssessmentModel, CodeEvaluation, GeneratedQuestion,
    GenerationRequest, InterviewRound, InterviewService, LexicalSimilarity, ModelError,
    RoleAnalysis, RoleContext, ScoringConfig, StartInterview,
};

use crate::infra::InMemorySessionStore;

const TECHNICAL_IDEAL: &str = "Start from the access patterns. Firstly, measure the hot paths and add an index where reads dominate. However, every index taxes writes, so monitoring guides the tradeoff. For example, a covering index removed our worst scan. Therefore we review query plans after each release.";

const HR_IDEAL: &str = "Describe the situation and the task you owned. Firstly, I aligned the team on the goal. However, one stakeholder disagreed, so I listened and adjusted the plan. For example, we split the rollout into two phases. Therefore the project landed on time and the relationship improved.";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Role the scripted candidate interviews for
    #[arg(long, default_value = "Backend Engineer")]
    pub(crate) job_role: String,
    /// Configured session length in minutes
    #[arg(long, default_value_t = 20)]
    pub(crate) duration_minutes: u32,
    /// Number of scripted answers to submit
    #[arg(long, default_value_t = 4)]
    pub(crate) answers: usize,
}

/// Offline stand-in for the model backend so the demo runs without Ollama.
struct CannedModel {
    generated: AtomicUsize,
}

impl CannedModel {
    fn new() -> Self {
        Self {
            generated: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AssessmentModel for CannedModel {
    async fn generate_question(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedQuestion, ModelError> {
        let serial = self.generated.fetch_add(1, Ordering::Relaxed) + 1;
        let (question, ideal_answer, keywords): (String, &str, &[&str]) = match request.round {
            InterviewRound::Technical => (
                format!(
                    "Question {serial}: how would you keep read latency predictable for a growing {} workload?",
                    request.job_role
                ),
                TECHNICAL_IDEAL,
                &["index", "monitoring", "tradeoff", "query", "rollout"],
            ),
            InterviewRound::Hr => (
                format!(
                    "Question {serial}: tell me about a time you changed course after stakeholder pushback."
                ),
                HR_IDEAL,
                &["situation", "task", "stakeholder", "plan", "outcome"],
            ),
        };

        Ok(GeneratedQuestion {
            question,
            ideal_answer: ideal_answer.to_string(),
            keywords: keywords.iter().map(|word| word.to_string()).collect(),
            is_coding: false,
        })
    }

    async fn assess_depth(&self, _question: &str, answer: &str) -> Result<f64, ModelError> {
        Ok((answer.split_whitespace().count() as f64 * 2.0).min(95.0))
    }

    async fn generate_feedback(
        &self,
        _question: &str,
        _answer: &str,
        score: f64,
        _round: InterviewRound,
    ) -> Result<String, ModelError> {
        Ok(if score >= 70.0 {
            "Well structured; the concrete example carried the answer.".to_string()
        } else {
            "Ground the answer in one specific project and name the tradeoffs.".to_string()
        })
    }

    async fn review_code(
        &self,
        _question: &str,
        _ideal_answer: &str,
        _submitted_code: &str,
        _language: &str,
    ) -> Result<CodeEvaluation, ModelError> {
        Err(ModelError::Backend("offline demo".to_string()))
    }

    async fn analyze_role(
        &self,
        _job_role: &str,
        _job_description: &str,
    ) -> Result<RoleAnalysis, ModelError> {
        Err(ModelError::Backend("offline demo".to_string()))
    }
}

fn scripted_answer(round: InterviewRound, index: usize) -> String {
    // Alternate strong and shallow answers so the difficulty adapter and
    // both feedback branches show up in the transcript.
    if index % 2 == 0 {
        match round {
            InterviewRound::Technical => TECHNICAL_IDEAL.to_string(),
            InterviewRound::Hr => HR_IDEAL.to_string(),
        }
    } else {
        "We usually just add more servers until it works.".to_string()
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(InMemorySessionStore::default());
    let service = InterviewService::new(
        store,
        Arc::new(CannedModel::new()),
        AnswerScorer::new(Box::new(LexicalSimilarity), ScoringConfig::default()),
        EngineConfig::default(),
    );

    println!("Adaptive interview demo ({})", args.job_role);

    let start = service
        .start(StartInterview {
            invite_token: "demo-candidate".to_string(),
            assessment_id: "demo-assessment".to_string(),
            candidate_name: "Demo Candidate".to_string(),
            candidate_email: "demo@example.com".to_string(),
            role: RoleContext {
                job_role: args.job_role.clone(),
                job_description: String::new(),
                experience_level: "Mid".to_string(),
                analysis: None,
            },
            duration_minutes: Some(args.duration_minutes),
        })
        .await?;

    println!(
        "Session {} started: {} minutes, round {}",
        start.session_id.0,
        start.duration_minutes,
        start.round.label()
    );

    let mut question = start.question;
    for index in 0..args.answers {
        println!("\nQ{}: {}", index + 1, question.prompt);
        let answer = scripted_answer(question.round, index);
        let outcome = service
            .submit(
                "demo-candidate",
                &question.id,
                AnswerPayload {
                    answer_text: answer,
                    code_text: None,
                    code_language: None,
                },
            )
            .await?;

        println!(
            "  overall {:.1} ({}), phase {}, remaining {:.1} min",
            outcome.evaluation.overall_score,
            outcome.evaluation.answer_strength.label(),
            outcome.evaluation.phase.label(),
            outcome.time_status.remaining_minutes
        );
        println!("  feedback: {}", outcome.evaluation.feedback);

        if outcome.is_complete {
            println!(
                "\nSession ended early: {}",
                outcome
                    .termination_reason
                    .map(|reason| reason.label())
                    .unwrap_or("unknown")
            );
            break;
        }

        match outcome.next_question {
            Some(next) => question = next,
            None => break,
        }
    }

    let end = service.end("demo-candidate")?;
    let report = service.report("demo-candidate")?;

    println!("\nFinal scores: technical {:.1}, hr {:.1}", end.technical_score, end.hr_score);
    println!("Recommendation: {}", report.recommendation);
    for strength in &report.strengths {
        println!("  + {strength}");
    }
    for suggestion in &report.improvement_suggestions {
        println!("  > {suggestion}");
    }

    Ok(())
}
