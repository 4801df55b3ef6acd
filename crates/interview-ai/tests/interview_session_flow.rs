use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use interview_ai::config::EngineConfig;
use interview_ai::workflows::interview::{
    AnswerPayload, AnswerScorer, AssessmentModel, GeneratedQuestion, GenerationRequest,
    InterviewRound, InterviewService, InterviewSession, LexicalSimilarity, ModelError,
    RoleAnalysis, RoleContext, ScoringConfig, SessionId, SessionStatus, SessionStore,
    StartInterview, StoreError, TerminationReason,
};

const IDEAL: &str = "Scaling reads starts with an index and a cache. However, monitoring guides every tradeoff. For example, we shard once replicas saturate. Therefore capacity planning stays ahead of growth. Specifically, we review percentiles weekly.";

#[derive(Default, Clone)]
struct MemoryStore {
    sessions: Arc<Mutex<HashMap<String, InterviewSession>>>,
}

impl SessionStore for MemoryStore {
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

/// Model that always answers: unique questions sharing one reference answer,
/// a fixed depth estimate, and canned feedback.
struct SteadyModel;

#[async_trait]
impl AssessmentModel for SteadyModel {
    async fn generate_question(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedQuestion, ModelError> {
        let serial = request.exclude_questions.len() + 1;
        Ok(GeneratedQuestion {
            question: format!(
                "{} question {serial} for a {}",
                request.round.label(),
                request.job_role
            ),
            ideal_answer: IDEAL.to_string(),
            keywords: ["scaling", "cache", "index", "monitoring", "tradeoff"]
                .iter()
                .map(|word| word.to_string())
                .collect(),
            is_coding: false,
        })
    }

    async fn assess_depth(&self, _question: &str, _answer: &str) -> Result<f64, ModelError> {
        Ok(88.0)
    }

    async fn generate_feedback(
        &self,
        _question: &str,
        _answer: &str,
        _score: f64,
        _round: InterviewRound,
    ) -> Result<String, ModelError> {
        Ok("Well grounded in operational practice.".to_string())
    }

    async fn review_code(
        &self,
        _question: &str,
        _ideal_answer: &str,
        _submitted_code: &str,
        _language: &str,
    ) -> Result<interview_ai::workflows::interview::CodeEvaluation, ModelError> {
        Err(ModelError::Backend("not used in this scenario".to_string()))
    }

    async fn analyze_role(
        &self,
        _job_role: &str,
        _job_description: &str,
    ) -> Result<RoleAnalysis, ModelError> {
        Err(ModelError::Backend("not used in this scenario".to_string()))
    }
}

fn backdate(store: &MemoryStore, token: &str, minutes: i64) {
    let mut session = store
        .fetch_by_token(token)
        .expect("store reachable")
        .expect("session exists");
    session.started_at = session.started_at - chrono::Duration::minutes(minutes);
    session.processing_overhead_seconds = 0.0;
    let expected = session.responses.len();
    store.update(session, expected).expect("backdate persists");
}

fn strong_payload() -> AnswerPayload {
    AnswerPayload {
        answer_text: IDEAL.to_string(),
        code_text: None,
        code_language: None,
    }
}

#[tokio::test]
async fn full_session_passes_technical_and_expires_in_hr() {
    let store = Arc::new(MemoryStore::default());
    let service = InterviewService::new(
        store.clone(),
        Arc::new(SteadyModel),
        AnswerScorer::new(Box::new(LexicalSimilarity), ScoringConfig::default()),
        EngineConfig::default(),
    );

    let start = service
        .start(StartInterview {
            invite_token: "invite-42".to_string(),
            assessment_id: "hiring-round-7".to_string(),
            candidate_name: "Sam Rivera".to_string(),
            candidate_email: "sam@example.com".to_string(),
            role: RoleContext {
                job_role: "Platform Engineer".to_string(),
                job_description: String::new(),
                experience_level: "Senior".to_string(),
                analysis: None,
            },
            duration_minutes: Some(20),
        })
        .await
        .expect("session starts");

    assert_eq!(start.round, InterviewRound::Technical);

    // Two strong answers early in the technical round.
    let mut question = start.question;
    for _ in 0..2 {
        let outcome = service
            .submit("invite-42", &question.id, strong_payload())
            .await
            .expect("submit succeeds");
        assert!(!outcome.is_complete);
        assert_eq!(outcome.round, InterviewRound::Technical);
        assert!(outcome.evaluation.overall_score >= 80.0);
        question = outcome.next_question.expect("next question queued");
    }

    // Third strong answer lands at minute 13 of 20: the gate arms and the
    // candidate advances to HR.
    backdate(&store, "invite-42", 13);
    let outcome = service
        .submit("invite-42", &question.id, strong_payload())
        .await
        .expect("gate submit succeeds");

    assert_eq!(outcome.round, InterviewRound::Hr);
    assert!(outcome.technical_score.expect("technical score persisted") >= 70.0);
    let hr_question = outcome.next_question.expect("HR question queued");
    assert_eq!(hr_question.round, InterviewRound::Hr);

    // Answers continue until the clock runs out.
    backdate(&store, "invite-42", 21);
    let terminal = service
        .submit("invite-42", &hr_question.id, strong_payload())
        .await
        .expect("final submit succeeds");

    assert!(terminal.is_complete);
    assert_eq!(
        terminal.termination_reason,
        Some(TerminationReason::TimeExpired)
    );
    assert!(terminal.time_status.is_expired);
    assert!(terminal.technical_score.is_some());
    assert!(terminal.hr_score.is_some());
    assert!(terminal.next_question.is_none());

    let session = store
        .fetch_by_token("invite-42")
        .expect("store reachable")
        .expect("session persisted");
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.questions.len(), session.responses.len());
    assert!(session.hr_score.expect("hr aggregated") > 0.0);

    let report = service.report("invite-42").expect("report builds");
    assert_eq!(report.technical_questions, 3);
    assert_eq!(report.hr_questions, 1);
    assert!(report.round_summary.technical.passed);
}
