use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::clock::TimeStatus;
use super::domain::{AnswerPayload, InterviewRound, Question, QuestionId, RoleContext};
use super::model::AssessmentModel;
use super::repository::{SessionStore, StoreError};
use super::scoring::Evaluation;
use super::service::{
    InterviewService, InterviewServiceError, StartInterview, StartOutcome, SubmitOutcome,
};

/// Router builder exposing the session lifecycle over HTTP.
pub fn interview_router<S, M>(service: Arc<InterviewService<S, M>>) -> Router
where
    S: SessionStore + 'static,
    M: AssessmentModel + 'static,
{
    Router::new()
        .route(
            "/api/v1/interviews/:token/info",
            get(info_handler::<S, M>),
        )
        .route(
            "/api/v1/interviews/:token/start",
            post(start_handler::<S, M>),
        )
        .route(
            "/api/v1/interviews/:token/answer",
            post(answer_handler::<S, M>),
        )
        .route(
            "/api/v1/interviews/:token/time",
            get(time_handler::<S, M>),
        )
        .route("/api/v1/interviews/:token/end", post(end_handler::<S, M>))
        .route(
            "/api/v1/interviews/:token/report",
            get(report_handler::<S, M>),
        )
        .route(
            "/api/v1/assessments/:assessment_id/progress",
            get(progress_handler::<S, M>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub candidate_name: String,
    #[serde(default)]
    pub candidate_email: String,
    #[serde(default)]
    pub assessment_id: Option<String>,
    pub job_role: String,
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub question_id: String,
    pub question: String,
    pub difficulty: &'static str,
    pub question_number: usize,
    pub round: InterviewRound,
    pub is_coding: bool,
    pub is_wrap_up: bool,
}

impl QuestionView {
    fn from_question(question: &Question, question_number: usize, is_wrap_up: bool) -> Self {
        Self {
            question_id: question.id.0.clone(),
            question: question.prompt.clone(),
            difficulty: question.difficulty.label(),
            question_number,
            round: question.round,
            is_coding: question.is_coding,
            is_wrap_up,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub session_id: String,
    pub question: QuestionView,
    pub resumed: bool,
    pub round: InterviewRound,
    pub duration_minutes: u32,
    pub time_status: TimeStatus,
}

impl StartResponse {
    fn from_outcome(outcome: StartOutcome) -> Self {
        let question = QuestionView::from_question(
            &outcome.question,
            outcome.question_number,
            outcome.time_status.is_wrap_up,
        );
        Self {
            session_id: outcome.session_id.0,
            question,
            resumed: outcome.resumed,
            round: outcome.round,
            duration_minutes: outcome.duration_minutes,
            time_status: outcome.time_status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question_id: String,
    pub answer_text: String,
    #[serde(default)]
    pub code_text: Option<String>,
    #[serde(default)]
    pub code_language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub session_id: String,
    pub evaluation: Evaluation,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_question: Option<QuestionView>,
    pub round: InterviewRound,
    pub time_status: TimeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr_score: Option<f64>,
    pub degraded: bool,
}

impl AnswerResponse {
    fn from_outcome(outcome: SubmitOutcome) -> Self {
        let is_wrap_up = outcome.time_status.is_wrap_up;
        let next_question = outcome
            .next_question
            .as_ref()
            .map(|question| {
                QuestionView::from_question(question, outcome.question_number, is_wrap_up)
            });
        Self {
            session_id: outcome.session_id.0,
            evaluation: outcome.evaluation,
            is_complete: outcome.is_complete,
            reason: outcome.termination_reason.map(|reason| reason.label()),
            next_question,
            round: outcome.round,
            time_status: outcome.time_status,
            technical_score: outcome.technical_score,
            hr_score: outcome.hr_score,
            degraded: outcome.degraded,
        }
    }
}

pub(crate) async fn start_handler<S, M>(
    State(service): State<Arc<InterviewService<S, M>>>,
    Path(token): Path<String>,
    axum::Json(request): axum::Json<StartRequest>,
) -> Response
where
    S: SessionStore + 'static,
    M: AssessmentModel + 'static,
{
    let assessment_id = request
        .assessment_id
        .clone()
        .unwrap_or_else(|| token.clone());
    let start = StartInterview {
        invite_token: token,
        assessment_id,
        candidate_name: request.candidate_name,
        candidate_email: request.candidate_email,
        role: RoleContext {
            job_role: request.job_role,
            job_description: request.job_description,
            experience_level: request.experience_level,
            analysis: None,
        },
        duration_minutes: request.duration_minutes,
    };

    match service.start(start).await {
        Ok(outcome) => {
            (StatusCode::OK, axum::Json(StartResponse::from_outcome(outcome))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn answer_handler<S, M>(
    State(service): State<Arc<InterviewService<S, M>>>,
    Path(token): Path<String>,
    axum::Json(request): axum::Json<AnswerRequest>,
) -> Response
where
    S: SessionStore + 'static,
    M: AssessmentModel + 'static,
{
    let question_id = QuestionId(request.question_id);
    let payload = AnswerPayload {
        answer_text: request.answer_text,
        code_text: request.code_text,
        code_language: request.code_language,
    };

    match service.submit(&token, &question_id, payload).await {
        Ok(outcome) => {
            (StatusCode::OK, axum::Json(AnswerResponse::from_outcome(outcome))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn info_handler<S, M>(
    State(service): State<Arc<InterviewService<S, M>>>,
    Path(token): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    M: AssessmentModel + 'static,
{
    match service.info(&token) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn time_handler<S, M>(
    State(service): State<Arc<InterviewService<S, M>>>,
    Path(token): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    M: AssessmentModel + 'static,
{
    match service.time_status(&token) {
        Ok(status) => (StatusCode::OK, axum::Json(status)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn end_handler<S, M>(
    State(service): State<Arc<InterviewService<S, M>>>,
    Path(token): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    M: AssessmentModel + 'static,
{
    match service.end(&token) {
        Ok(outcome) => {
            let payload = json!({
                "detail": "Interview ended",
                "session_id": outcome.session_id.0,
                "technical_score": outcome.technical_score,
                "hr_score": outcome.hr_score,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn report_handler<S, M>(
    State(service): State<Arc<InterviewService<S, M>>>,
    Path(token): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    M: AssessmentModel + 'static,
{
    match service.report(&token) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn progress_handler<S, M>(
    State(service): State<Arc<InterviewService<S, M>>>,
    Path(assessment_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    M: AssessmentModel + 'static,
{
    match service.progress(&assessment_id) {
        Ok(rows) => (StatusCode::OK, axum::Json(rows)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: InterviewServiceError) -> Response {
    let status = match &error {
        InterviewServiceError::SessionNotFound | InterviewServiceError::QuestionNotFound => {
            StatusCode::NOT_FOUND
        }
        InterviewServiceError::OutOfTurn => StatusCode::CONFLICT,
        InterviewServiceError::SessionCompleted => StatusCode::BAD_REQUEST,
        InterviewServiceError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        InterviewServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        InterviewServiceError::Store(StoreError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
