use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;

use super::clock::{self, TimeStatus};
use super::domain::{
    AnswerPayload, DifficultyLevel, InterviewRound, InterviewSession, Question, QuestionId,
    RoleContext, SessionId, SessionStatus, TerminationReason,
};
use super::gate::{self, GateDecision};
use super::model::{AssessmentModel, GeneratedQuestion, GenerationRequest};
use super::report::{self, CandidateProgressView, InterviewReport, SessionInfoView};
use super::repository::{SessionStore, StoreError};
use super::scoring::{round_score, AnswerScorer, Evaluation, EvaluationPhase};
use super::selector::{next_difficulty, QuestionSelector};

/// Request to start (or resume) a session for an invite token.
#[derive(Debug, Clone)]
pub struct StartInterview {
    pub invite_token: String,
    pub assessment_id: String,
    pub candidate_name: String,
    pub candidate_email: String,
    pub role: RoleContext,
    pub duration_minutes: Option<u32>,
}

/// Externally visible result of `start`.
#[derive(Debug, Clone)]
pub struct StartOutcome {
    pub session_id: SessionId,
    pub question: Question,
    pub question_number: usize,
    pub round: InterviewRound,
    pub duration_minutes: u32,
    pub resumed: bool,
    pub time_status: TimeStatus,
}

/// Externally visible result of one answer submission.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub session_id: SessionId,
    pub evaluation: Evaluation,
    pub next_question: Option<Question>,
    pub question_number: usize,
    pub round: InterviewRound,
    pub time_status: TimeStatus,
    pub is_complete: bool,
    pub termination_reason: Option<TerminationReason>,
    pub technical_score: Option<f64>,
    pub hr_score: Option<f64>,
    pub degraded: bool,
}

/// Result of force-ending a session.
#[derive(Debug, Clone)]
pub struct EndOutcome {
    pub session_id: SessionId,
    pub technical_score: f64,
    pub hr_score: f64,
}

/// Joined result of the concurrent deep-evaluation and next-question calls.
/// `degraded` records that at least one side fell back, so tests can assert
/// the fallback path without simulating real network failure.
#[derive(Debug)]
pub struct JoinOutcome {
    pub deep: Option<Evaluation>,
    pub next_question: Option<GeneratedQuestion>,
    pub degraded: bool,
}

/// Error raised by the session state machine. Upstream model failures never
/// appear here; they are masked by deterministic fallbacks.
#[derive(Debug, thiserror::Error)]
pub enum InterviewServiceError {
    #[error("interview session not found")]
    SessionNotFound,
    #[error("question not found in this session")]
    QuestionNotFound,
    #[error("interview already completed")]
    SessionCompleted,
    #[error("answer submitted out of turn")]
    OutOfTurn,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Session state machine orchestrating the clock, scorer, selector, and
/// round gate over a persistent store.
pub struct InterviewService<S, M> {
    store: Arc<S>,
    model: Arc<M>,
    scorer: AnswerScorer,
    selector: QuestionSelector,
    config: EngineConfig,
}

impl<S, M> InterviewService<S, M>
where
    S: SessionStore + 'static,
    M: AssessmentModel + 'static,
{
    pub fn new(store: Arc<S>, model: Arc<M>, scorer: AnswerScorer, config: EngineConfig) -> Self {
        Self {
            store,
            model,
            scorer,
            selector: QuestionSelector,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Start a session, or resume the unfinished one already bound to this
    /// invite token. The time spent analyzing the role and generating the
    /// first question is charged to processing overhead, not the candidate.
    pub async fn start(
        &self,
        request: StartInterview,
    ) -> Result<StartOutcome, InterviewServiceError> {
        let clock_start = Instant::now();

        if let Some(existing) = self.store.fetch_by_token(&request.invite_token)? {
            return self.resume(existing);
        }

        let mut role = request.role;
        if role.analysis.is_none() && !role.job_description.trim().is_empty() {
            match self
                .model
                .analyze_role(&role.job_role, &role.job_description)
                .await
            {
                Ok(analysis) => role.analysis = Some(analysis),
                Err(err) => {
                    debug!(error = %err, "role analysis failed, continuing without it");
                }
            }
        }

        let peer_prompts = self.diversity_exclusions(
            &request.assessment_id,
            &request.invite_token,
            &request.candidate_email,
            &role.job_role,
        );

        let duration = request
            .duration_minutes
            .unwrap_or(self.config.default_duration_minutes);

        let generation = GenerationRequest {
            job_role: role.job_role.clone(),
            job_description: role.job_description.clone(),
            experience_level: role.experience_level.clone(),
            difficulty: DifficultyLevel::Medium,
            round: InterviewRound::Technical,
            exclude_questions: peer_prompts,
            previous_answers: Vec::new(),
            last_score: None,
            analysis: role.analysis.clone(),
            want_coding: false,
        };
        let question = self.selector.next(self.model.as_ref(), &generation).await;

        let now = Utc::now();
        let session = InterviewSession {
            id: SessionId::generate(),
            invite_token: request.invite_token.clone(),
            assessment_id: request.assessment_id,
            candidate_name: request.candidate_name,
            candidate_email: request.candidate_email,
            role,
            difficulty: DifficultyLevel::Medium,
            status: SessionStatus::InProgress,
            current_round: InterviewRound::Technical,
            duration_minutes: duration,
            processing_overhead_seconds: clock_start.elapsed().as_secs_f64(),
            questions: vec![question.clone()],
            responses: Vec::new(),
            technical_score: None,
            hr_score: None,
            termination_reason: None,
            created_at: now,
            started_at: now,
            completed_at: None,
        };

        let session = match self.store.insert(session) {
            Ok(session) => session,
            Err(StoreError::Conflict) => {
                // Lost a racing start for the same token; resume the winner.
                let existing = self
                    .store
                    .fetch_by_token(&request.invite_token)?
                    .ok_or(InterviewServiceError::SessionNotFound)?;
                return self.resume(existing);
            }
            Err(other) => return Err(other.into()),
        };

        info!(
            session = %session.id.0,
            role = %session.role.job_role,
            duration_minutes = duration,
            "interview session started"
        );

        Ok(StartOutcome {
            time_status: self.time_status_of(&session),
            session_id: session.id,
            question,
            question_number: 1,
            round: InterviewRound::Technical,
            duration_minutes: duration,
            resumed: false,
        })
    }

    fn resume(&self, session: InterviewSession) -> Result<StartOutcome, InterviewServiceError> {
        if session.status == SessionStatus::Completed {
            return Err(InterviewServiceError::SessionCompleted);
        }
        let question = session
            .current_question()
            .cloned()
            .ok_or(InterviewServiceError::QuestionNotFound)?;

        debug!(session = %session.id.0, "resuming in-progress session");

        Ok(StartOutcome {
            time_status: self.time_status_of(&session),
            question_number: session.current_question_number(),
            round: session.current_round,
            duration_minutes: session.duration_minutes,
            resumed: true,
            question,
            session_id: session.id,
        })
    }

    /// Score the current question's answer and advance the session.
    ///
    /// The deep evaluation and the next-question generation run concurrently
    /// and are joined under the configured timeout; on timeout the instant
    /// evaluation stands and the next question is generated sequentially as
    /// a recovery step. The whole operation's wall time is added to the
    /// session's processing overhead before the clock is re-read.
    pub async fn submit(
        &self,
        invite_token: &str,
        question_id: &QuestionId,
        payload: AnswerPayload,
    ) -> Result<SubmitOutcome, InterviewServiceError> {
        let clock_start = Instant::now();

        let mut session = self
            .store
            .fetch_by_token(invite_token)?
            .ok_or(InterviewServiceError::SessionNotFound)?;
        if session.status == SessionStatus::Completed {
            return Err(InterviewServiceError::SessionCompleted);
        }

        let observed_responses = session.responses.len();
        let current = session
            .current_question()
            .cloned()
            .ok_or(InterviewServiceError::QuestionNotFound)?;
        if current.id != *question_id {
            return Err(if session.question(question_id).is_some() {
                InterviewServiceError::OutOfTurn
            } else {
                InterviewServiceError::QuestionNotFound
            });
        }

        let peer_prompts = self.diversity_exclusions(
            &session.assessment_id,
            &session.invite_token,
            &session.candidate_email,
            &session.role.job_role,
        );

        let has_code = payload
            .code_text
            .as_deref()
            .map(|code| !code.trim().is_empty())
            .unwrap_or(false);

        let (evaluation, pre_generated, degraded) = if current.is_coding && has_code {
            let code = payload.code_text.as_deref().unwrap_or_default();
            let language = payload.code_language.as_deref().unwrap_or("python");
            let evaluation = self
                .scorer
                .code(
                    self.model.as_ref(),
                    &current.prompt,
                    &current.ideal_answer,
                    code,
                    language,
                )
                .await;
            let degraded = evaluation.phase == EvaluationPhase::DeepFailed;
            (evaluation, None, degraded)
        } else {
            let instant = self.scorer.instant(
                &current.ideal_answer,
                &payload.answer_text,
                &current.keywords,
            );
            let generation = self.generation_request(
                &session,
                &peer_prompts,
                Some(&payload.answer_text),
                Some(instant.overall_score),
                session.current_round,
                next_difficulty(instant.overall_score),
            );
            let join = self
                .bounded_join(&current, &payload.answer_text, &instant, &generation)
                .await;
            let evaluation = join.deep.unwrap_or(instant);
            (evaluation, join.next_question, join.degraded)
        };

        session.responses.push(super::domain::Response {
            question_id: current.id.clone(),
            answer_text: payload.answer_text,
            code_text: payload.code_text,
            code_language: payload.code_language,
            evaluation: evaluation.clone(),
            answered_at: Utc::now(),
        });

        session.processing_overhead_seconds += clock_start.elapsed().as_secs_f64();
        let time_status = self.time_status_of(&session);

        if time_status.is_expired {
            self.complete(&mut session, TerminationReason::TimeExpired, Utc::now());
            self.store.update(session.clone(), observed_responses)?;
            info!(session = %session.id.0, "session ended, time expired");
            return Ok(terminal_outcome(session, evaluation, time_status, degraded));
        }

        let mut pre_generated = pre_generated;
        if session.current_round == InterviewRound::Technical {
            let technical_score = round_score(
                session
                    .responses_for_round(InterviewRound::Technical)
                    .into_iter()
                    .map(|response| &response.evaluation),
            );
            let decision = gate::evaluate(
                session.current_round,
                session.answered_in_round(InterviewRound::Technical),
                technical_score,
                &time_status,
                session.duration_minutes,
                &self.config,
            );
            match decision {
                GateDecision::Terminate { technical_score } => {
                    self.complete(
                        &mut session,
                        TerminationReason::TechnicalCutoffNotMet,
                        Utc::now(),
                    );
                    session.technical_score = Some(technical_score);
                    self.store.update(session.clone(), observed_responses)?;
                    info!(
                        session = %session.id.0,
                        technical_score,
                        "session ended, technical cutoff not met"
                    );
                    return Ok(terminal_outcome(session, evaluation, time_status, degraded));
                }
                GateDecision::AdvanceToHr { technical_score } => {
                    session.current_round = InterviewRound::Hr;
                    session.technical_score = Some(technical_score);
                    // Any question generated concurrently targeted the
                    // Technical round and is now stale.
                    pre_generated = None;
                    info!(
                        session = %session.id.0,
                        technical_score,
                        "technical round passed, advancing to HR"
                    );
                }
                GateDecision::Continue => {}
            }
        }

        let difficulty = next_difficulty(evaluation.overall_score);
        let generation = self.generation_request(
            &session,
            &peer_prompts,
            None,
            Some(evaluation.overall_score),
            session.current_round,
            difficulty,
        );
        let next_question = match pre_generated
            .and_then(|generated| self.selector.accept(generated, &generation))
        {
            Some(question) => question,
            None => self.selector.next(self.model.as_ref(), &generation).await,
        };

        session.difficulty = difficulty;
        session.questions.push(next_question.clone());
        self.store.update(session.clone(), observed_responses)?;

        Ok(SubmitOutcome {
            question_number: session.current_question_number(),
            round: session.current_round,
            technical_score: session.technical_score,
            hr_score: session.hr_score,
            session_id: session.id,
            evaluation,
            next_question: Some(next_question),
            time_status,
            is_complete: false,
            termination_reason: None,
            degraded,
        })
    }

    /// Force-terminate with round aggregation, regardless of round or clock.
    pub fn end(&self, invite_token: &str) -> Result<EndOutcome, InterviewServiceError> {
        let mut session = self
            .store
            .fetch_by_token(invite_token)?
            .ok_or(InterviewServiceError::SessionNotFound)?;

        if session.status == SessionStatus::Completed {
            return Ok(EndOutcome {
                technical_score: session.technical_score.unwrap_or(0.0),
                hr_score: session.hr_score.unwrap_or(0.0),
                session_id: session.id,
            });
        }

        let observed_responses = session.responses.len();
        self.complete(&mut session, TerminationReason::EndedByRequest, Utc::now());
        self.store.update(session.clone(), observed_responses)?;
        info!(session = %session.id.0, "session ended by request");

        Ok(EndOutcome {
            technical_score: session.technical_score.unwrap_or(0.0),
            hr_score: session.hr_score.unwrap_or(0.0),
            session_id: session.id,
        })
    }

    /// Read-only projection of the clock over stored state.
    pub fn time_status(&self, invite_token: &str) -> Result<TimeStatus, InterviewServiceError> {
        let session = self
            .store
            .fetch_by_token(invite_token)?
            .ok_or(InterviewServiceError::SessionNotFound)?;
        Ok(self.time_status_of(&session))
    }

    pub fn session(&self, invite_token: &str) -> Result<InterviewSession, InterviewServiceError> {
        self.store
            .fetch_by_token(invite_token)?
            .ok_or(InterviewServiceError::SessionNotFound)
    }

    pub fn sessions_in_assessment(
        &self,
        assessment_id: &str,
    ) -> Result<Vec<InterviewSession>, InterviewServiceError> {
        Ok(self.store.in_assessment(assessment_id)?)
    }

    /// Full report for a session, computed from stored state.
    pub fn report(&self, invite_token: &str) -> Result<InterviewReport, InterviewServiceError> {
        let session = self.session(invite_token)?;
        Ok(report::build_report(
            &session,
            self.config.technical_cutoff,
            Utc::now(),
        ))
    }

    /// Monitoring rows for every session in a parent assessment.
    pub fn progress(
        &self,
        assessment_id: &str,
    ) -> Result<Vec<CandidateProgressView>, InterviewServiceError> {
        Ok(self
            .sessions_in_assessment(assessment_id)?
            .iter()
            .map(|session| report::progress_view(session, self.time_status_of(session)))
            .collect())
    }

    pub fn info(&self, invite_token: &str) -> Result<SessionInfoView, InterviewServiceError> {
        let session = self.session(invite_token)?;
        let time_status = self.time_status_of(&session);
        Ok(report::session_info(&session, time_status))
    }

    pub fn time_status_of(&self, session: &InterviewSession) -> TimeStatus {
        clock::status(
            session.started_at,
            session.duration_minutes,
            session.processing_overhead_seconds,
            Utc::now(),
        )
    }

    async fn bounded_join(
        &self,
        question: &Question,
        answer: &str,
        instant_result: &Evaluation,
        generation: &GenerationRequest,
    ) -> JoinOutcome {
        let joined = tokio::time::timeout(self.config.join_timeout, async {
            tokio::join!(
                self.scorer.deep(
                    self.model.as_ref(),
                    &question.prompt,
                    answer,
                    question.round,
                    instant_result,
                ),
                self.model.generate_question(generation),
            )
        })
        .await;

        match joined {
            Ok((deep, generated)) => {
                let degraded = deep.phase == EvaluationPhase::DeepFailed || generated.is_err();
                JoinOutcome {
                    deep: Some(deep),
                    next_question: generated.ok(),
                    degraded,
                }
            }
            Err(_) => {
                // Outstanding calls are dropped, not awaited further.
                warn!(
                    question = %question.id.0,
                    "deep evaluation and generation join timed out, keeping instant result"
                );
                JoinOutcome {
                    deep: None,
                    next_question: None,
                    degraded: true,
                }
            }
        }
    }

    fn generation_request(
        &self,
        session: &InterviewSession,
        peer_prompts: &[String],
        pending_answer: Option<&str>,
        last_score: Option<f64>,
        round: InterviewRound,
        difficulty: DifficultyLevel,
    ) -> GenerationRequest {
        let mut exclude_questions = session.asked_prompts();
        for prompt in peer_prompts {
            if !exclude_questions.contains(prompt) {
                exclude_questions.push(prompt.clone());
            }
        }

        let mut previous_answers = session.answer_texts();
        if let Some(answer) = pending_answer {
            previous_answers.push(answer.to_string());
        }

        GenerationRequest {
            job_role: session.role.job_role.clone(),
            job_description: session.role.job_description.clone(),
            experience_level: session.role.experience_level.clone(),
            difficulty,
            round,
            exclude_questions,
            previous_answers,
            last_score,
            analysis: session.role.analysis.clone(),
            want_coding: false,
        }
    }

    /// Peer and retake prompts for the diversity exclusion set. Failures are
    /// logged and swallowed; enrichment never blocks the session.
    fn diversity_exclusions(
        &self,
        assessment_id: &str,
        invite_token: &str,
        candidate_email: &str,
        job_role: &str,
    ) -> Vec<String> {
        let mut prompts: Vec<String> = Vec::new();

        match self.store.in_assessment(assessment_id) {
            Ok(peers) => {
                for peer in peers {
                    if peer.invite_token == invite_token {
                        continue;
                    }
                    for question in &peer.questions {
                        if !prompts.contains(&question.prompt) {
                            prompts.push(question.prompt.clone());
                        }
                    }
                }
            }
            Err(err) => debug!(error = %err, "peer question collection failed"),
        }

        match self
            .store
            .completed_for_candidate(candidate_email, job_role)
        {
            Ok(past_sessions) => {
                for past in past_sessions {
                    for question in &past.questions {
                        if !prompts.contains(&question.prompt) {
                            prompts.push(question.prompt.clone());
                        }
                    }
                }
            }
            Err(err) => debug!(error = %err, "past session collection failed"),
        }

        prompts
    }

    fn complete(
        &self,
        session: &mut InterviewSession,
        reason: TerminationReason,
        now: DateTime<Utc>,
    ) {
        session.technical_score = Some(round_score(
            session
                .responses_for_round(InterviewRound::Technical)
                .into_iter()
                .map(|response| &response.evaluation),
        ));
        session.hr_score = Some(round_score(
            session
                .responses_for_round(InterviewRound::Hr)
                .into_iter()
                .map(|response| &response.evaluation),
        ));
        session.status = SessionStatus::Completed;
        session.termination_reason = Some(session.termination_reason.unwrap_or(reason));
        session.completed_at = Some(now);
    }
}

fn terminal_outcome(
    session: InterviewSession,
    evaluation: Evaluation,
    time_status: TimeStatus,
    degraded: bool,
) -> SubmitOutcome {
    SubmitOutcome {
        question_number: session.current_question_number(),
        round: session.current_round,
        technical_score: session.technical_score,
        hr_score: session.hr_score,
        termination_reason: session.termination_reason,
        session_id: session.id,
        evaluation,
        next_question: None,
        time_status,
        is_complete: true,
        degraded,
    }
}
