use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::EngineConfig;
use crate::workflows::interview::domain::{
    InterviewRound, InterviewSession, RoleAnalysis, RoleContext, SessionId,
};
use crate::workflows::interview::model::{
    AssessmentModel, GeneratedQuestion, GenerationRequest, ModelError,
};
use crate::workflows::interview::repository::{SessionStore, StoreError};
use crate::workflows::interview::scoring::{AnswerScorer, CodeEvaluation, ScoringConfig};
use crate::workflows::interview::service::{InterviewService, StartInterview};
use crate::workflows::interview::similarity::LexicalSimilarity;

/// Reference answer every unscripted generation hands out, so tests can
/// submit a lexically identical "strong" answer.
pub(crate) const STRONG_IDEAL: &str = "Scaling reads starts with an index and a cache. However, monitoring guides every tradeoff. For example, we shard once replicas saturate. Therefore capacity planning stays ahead of growth. Specifically, we review percentiles weekly.";

pub(crate) const WEAK_ANSWER: &str = "I am not sure.";

pub(crate) fn strong_answer() -> String {
    STRONG_IDEAL.to_string()
}

fn scripted_keywords() -> Vec<String> {
    ["scaling", "cache", "index", "monitoring", "tradeoff"]
        .iter()
        .map(|word| word.to_string())
        .collect()
}

/// Deterministic fake of the assessment model. Unset capabilities fail with
/// a backend error so degradation paths are easy to exercise.
#[derive(Default)]
pub(crate) struct ScriptedModel {
    question: Option<String>,
    depth: Option<f64>,
    feedback: Option<String>,
    code_review: Option<CodeEvaluation>,
    analysis: Option<RoleAnalysis>,
    delay: Option<Duration>,
    fail_generation: bool,
    generated: AtomicUsize,
}

impl ScriptedModel {
    pub(crate) fn with_question(mut self, question: &str) -> Self {
        self.question = Some(question.to_string());
        self
    }

    pub(crate) fn with_depth(mut self, depth: f64) -> Self {
        self.depth = Some(depth);
        self
    }

    pub(crate) fn with_feedback(mut self, feedback: &str) -> Self {
        self.feedback = Some(feedback.to_string());
        self
    }

    pub(crate) fn with_code_review(mut self, review: CodeEvaluation) -> Self {
        self.code_review = Some(review);
        self
    }

    pub(crate) fn with_analysis(mut self, analysis: RoleAnalysis) -> Self {
        self.analysis = Some(analysis);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn with_failing_generation(mut self) -> Self {
        self.fail_generation = true;
        self
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl AssessmentModel for ScriptedModel {
    async fn generate_question(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedQuestion, ModelError> {
        self.pause().await;
        if self.fail_generation {
            return Err(ModelError::Backend("generation offline".to_string()));
        }
        let serial = self.generated.fetch_add(1, Ordering::Relaxed) + 1;
        let question = self.question.clone().unwrap_or_else(|| {
            format!(
                "{} question {serial} for a {}",
                request.round.label(),
                request.job_role
            )
        });
        Ok(GeneratedQuestion {
            question,
            ideal_answer: STRONG_IDEAL.to_string(),
            keywords: scripted_keywords(),
            is_coding: false,
        })
    }

    async fn assess_depth(&self, _question: &str, _answer: &str) -> Result<f64, ModelError> {
        self.pause().await;
        self.depth
            .ok_or_else(|| ModelError::Backend("depth scoring offline".to_string()))
    }

    async fn generate_feedback(
        &self,
        _question: &str,
        _answer: &str,
        _score: f64,
        _round: InterviewRound,
    ) -> Result<String, ModelError> {
        self.pause().await;
        self.feedback
            .clone()
            .ok_or_else(|| ModelError::Backend("feedback offline".to_string()))
    }

    async fn review_code(
        &self,
        _question: &str,
        _ideal_answer: &str,
        _submitted_code: &str,
        _language: &str,
    ) -> Result<CodeEvaluation, ModelError> {
        self.pause().await;
        self.code_review
            .clone()
            .ok_or_else(|| ModelError::Backend("code review offline".to_string()))
    }

    async fn analyze_role(
        &self,
        _job_role: &str,
        _job_description: &str,
    ) -> Result<RoleAnalysis, ModelError> {
        self.pause().await;
        self.analysis
            .clone()
            .ok_or_else(|| ModelError::Backend("analysis offline".to_string()))
    }
}

/// Model with every capability down.
pub(crate) struct FailingModel;

#[async_trait]
impl AssessmentModel for FailingModel {
    async fn generate_question(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GeneratedQuestion, ModelError> {
        Err(ModelError::Backend("model offline".to_string()))
    }

    async fn assess_depth(&self, _question: &str, _answer: &str) -> Result<f64, ModelError> {
        Err(ModelError::Backend("model offline".to_string()))
    }

    async fn generate_feedback(
        &self,
        _question: &str,
        _answer: &str,
        _score: f64,
        _round: InterviewRound,
    ) -> Result<String, ModelError> {
        Err(ModelError::Backend("model offline".to_string()))
    }

    async fn review_code(
        &self,
        _question: &str,
        _ideal_answer: &str,
        _submitted_code: &str,
        _language: &str,
    ) -> Result<CodeEvaluation, ModelError> {
        Err(ModelError::Backend("model offline".to_string()))
    }

    async fn analyze_role(
        &self,
        _job_role: &str,
        _job_description: &str,
    ) -> Result<RoleAnalysis, ModelError> {
        Err(ModelError::Backend("model offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(crate) struct MemorySessionStore {
    sessions: Arc<Mutex<HashMap<String, InterviewSession>>>,
}

impl SessionStore for MemorySessionStore {
    fn insert(&self, session: InterviewSession) -> Result<InterviewSession, StoreError> {
        let mut guard = self.sessions.lock().expect("store mutex poisoned");
        if guard.contains_key(&session.invite_token) {
            return Err(StoreError::Conflict);
        }
        guard.insert(session.invite_token.clone(), session.clone());
        Ok(session)
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<InterviewSession>, StoreError> {
        let guard = self.sessions.lock().expect("store mutex poisoned");
        Ok(guard.values().find(|session| &session.id == id).cloned())
    }

    fn fetch_by_token(&self, token: &str) -> Result<Option<InterviewSession>, StoreError> {
        let guard = self.sessions.lock().expect("store mutex poisoned");
        Ok(guard.get(token).cloned())
    }

    fn update(
        &self,
        session: InterviewSession,
        expected_responses: usize,
    ) -> Result<(), StoreError> {
        let mut guard = self.sessions.lock().expect("store mutex poisoned");
        let stored = guard
            .get(&session.invite_token)
            .ok_or(StoreError::NotFound)?;
        if stored.responses.len() != expected_responses {
            return Err(StoreError::Conflict);
        }
        guard.insert(session.invite_token.clone(), session);
        Ok(())
    }

    fn in_assessment(&self, assessment_id: &str) -> Result<Vec<InterviewSession>, StoreError> {
        let guard = self.sessions.lock().expect("store mutex poisoned");
        Ok(guard
            .values()
            .filter(|session| session.assessment_id == assessment_id)
            .cloned()
            .collect())
    }

    fn completed_for_candidate(
        &self,
        candidate_email: &str,
        job_role: &str,
    ) -> Result<Vec<InterviewSession>, StoreError> {
        let guard = self.sessions.lock().expect("store mutex poisoned");
        Ok(guard
            .values()
            .filter(|session| {
                session.completed_at.is_some()
                    && session.candidate_email == candidate_email
                    && session.role.job_role == job_role
            })
            .cloned()
            .collect())
    }
}

pub(crate) fn scorer() -> AnswerScorer {
    AnswerScorer::new(Box::new(LexicalSimilarity), ScoringConfig::default())
}

pub(crate) fn build_service(
    model: ScriptedModel,
    config: EngineConfig,
) -> (
    InterviewService<MemorySessionStore, ScriptedModel>,
    Arc<MemorySessionStore>,
    Arc<ScriptedModel>,
) {
    let store = Arc::new(MemorySessionStore::default());
    let model = Arc::new(model);
    let service = InterviewService::new(store.clone(), model.clone(), scorer(), config);
    (service, store, model)
}

pub(crate) fn start_request(token: &str) -> StartInterview {
    StartInterview {
        invite_token: token.to_string(),
        assessment_id: "assessment-1".to_string(),
        candidate_name: "Jordan Blake".to_string(),
        candidate_email: "jordan@example.com".to_string(),
        role: RoleContext {
            job_role: "Backend Engineer".to_string(),
            job_description: String::new(),
            experience_level: "Mid".to_string(),
            analysis: None,
        },
        duration_minutes: Some(20),
    }
}

pub(crate) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Shift a stored session's start time into the past so clock-dependent
/// paths can be exercised without sleeping.
pub(crate) fn backdate(store: &MemorySessionStore, token: &str, minutes: i64) {
    let mut session = store
        .fetch_by_token(token)
        .expect("store reachable")
        .expect("session exists");
    session.started_at = session.started_at - chrono::Duration::minutes(minutes);
    session.processing_overhead_seconds = 0.0;
    let expected = session.responses.len();
    store.update(session, expected).expect("backdate persists");
}
