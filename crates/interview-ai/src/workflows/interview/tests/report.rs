use chrono::Utc;

use crate::workflows::interview::clock;
use crate::workflows::interview::domain::{
    DifficultyLevel, InterviewRound, InterviewSession, Question, QuestionId, Response,
    RoleContext, SessionId, SessionStatus, TerminationReason,
};
use crate::workflows::interview::report::{build_report, progress_view, session_info};
use crate::workflows::interview::scoring::{AnswerStrength, Evaluation, EvaluationPhase};

fn evaluation(overall: f64, communication: f64, strength: AnswerStrength) -> Evaluation {
    Evaluation {
        content_score: overall,
        keyword_score: overall,
        depth_score: overall,
        communication_score: communication,
        confidence_score: 50.0,
        overall_score: overall,
        similarity_score: overall,
        keyword_coverage: overall,
        keywords_matched: Vec::new(),
        keywords_missed: Vec::new(),
        feedback: "feedback".to_string(),
        answer_strength: strength,
        phase: EvaluationPhase::Deep,
        code_evaluation: None,
    }
}

fn question(id: &str, round: InterviewRound) -> Question {
    Question {
        id: QuestionId(id.to_string()),
        prompt: format!("prompt {id}"),
        ideal_answer: "ideal".to_string(),
        keywords: Vec::new(),
        difficulty: DifficultyLevel::Medium,
        round,
        is_coding: false,
    }
}

fn response(id: &str, evaluation: Evaluation) -> Response {
    Response {
        question_id: QuestionId(id.to_string()),
        answer_text: format!("answer {id}"),
        code_text: None,
        code_language: None,
        evaluation,
        answered_at: Utc::now(),
    }
}

fn completed_session() -> InterviewSession {
    InterviewSession {
        id: SessionId("session-1".to_string()),
        invite_token: "tok-1".to_string(),
        assessment_id: "assessment-1".to_string(),
        candidate_name: "Jordan Blake".to_string(),
        candidate_email: "jordan@example.com".to_string(),
        role: RoleContext {
            job_role: "Backend Engineer".to_string(),
            job_description: String::new(),
            experience_level: "Mid".to_string(),
            analysis: None,
        },
        difficulty: DifficultyLevel::Hard,
        status: SessionStatus::Completed,
        current_round: InterviewRound::Hr,
        duration_minutes: 20,
        processing_overhead_seconds: 30.0,
        questions: vec![
            question("t1", InterviewRound::Technical),
            question("t2", InterviewRound::Technical),
            question("h1", InterviewRound::Hr),
        ],
        responses: vec![
            response("t1", evaluation(80.0, 85.0, AnswerStrength::Strong)),
            response("t2", evaluation(70.0, 75.0, AnswerStrength::Moderate)),
            response("h1", evaluation(60.0, 65.0, AnswerStrength::Moderate)),
        ],
        technical_score: Some(75.0),
        hr_score: Some(60.0),
        termination_reason: Some(TerminationReason::TimeExpired),
        created_at: Utc::now(),
        started_at: Utc::now(),
        completed_at: Some(Utc::now()),
    }
}

#[test]
fn report_averages_rounds_and_recommends_selection() {
    let session = completed_session();
    let report = build_report(&session, 70.0, Utc::now());

    assert_eq!(report.total_questions, 3);
    assert_eq!(report.technical_questions, 2);
    assert_eq!(report.hr_questions, 1);
    assert_eq!(report.technical_score, 75.0);
    assert_eq!(report.hr_score, 60.0);
    assert_eq!(report.overall_score, 70.0);
    assert!(report.round_summary.technical.passed);
    assert!(report.round_summary.hr.passed);
    assert_eq!(report.recommendation, "Selected");
    assert_eq!(report.question_evaluations.len(), 3);
}

#[test]
fn report_flags_technical_only_candidates() {
    let mut session = completed_session();
    session.responses[2] = response("h1", evaluation(30.0, 40.0, AnswerStrength::Weak));
    let report = build_report(&session, 70.0, Utc::now());

    assert!(report.round_summary.technical.passed);
    assert!(!report.round_summary.hr.passed);
    assert_eq!(report.recommendation, "Maybe - HR skills need improvement");
}

#[test]
fn report_on_empty_session_is_all_zeros() {
    let mut session = completed_session();
    session.questions.clear();
    session.responses.clear();
    let report = build_report(&session, 70.0, Utc::now());

    assert_eq!(report.total_questions, 0);
    assert_eq!(report.technical_score, 0.0);
    assert_eq!(report.hr_score, 0.0);
    assert_eq!(report.overall_score, 0.0);
    assert_eq!(report.recommendation, "Not Selected");
    assert!(!report.strengths.is_empty());
    assert!(!report.improvement_suggestions.is_empty());
}

#[test]
fn report_counts_majority_weak_answers() {
    let mut session = completed_session();
    session.responses = vec![
        response("t1", evaluation(20.0, 30.0, AnswerStrength::Weak)),
        response("t2", evaluation(25.0, 30.0, AnswerStrength::Weak)),
        response("h1", evaluation(60.0, 65.0, AnswerStrength::Moderate)),
    ];
    let report = build_report(&session, 70.0, Utc::now());

    assert!(report
        .weaknesses
        .iter()
        .any(|weakness| weakness.contains("Struggled with 2 out of 3")));
}

#[test]
fn report_skips_responses_without_questions() {
    let mut session = completed_session();
    session.responses.push(response(
        "ghost",
        evaluation(100.0, 100.0, AnswerStrength::Strong),
    ));
    let report = build_report(&session, 70.0, Utc::now());
    assert_eq!(report.total_questions, 4);
    assert_eq!(report.question_evaluations.len(), 3);
}

#[test]
fn progress_view_surfaces_monitoring_fields() {
    let session = completed_session();
    let time_status = clock::status(
        session.started_at,
        session.duration_minutes,
        session.processing_overhead_seconds,
        Utc::now(),
    );
    let view = progress_view(&session, time_status);

    assert_eq!(view.candidate_name, "Jordan Blake");
    assert_eq!(view.status, "completed");
    assert_eq!(view.answered, 3);
    assert_eq!(view.avg_scores.overall_score, 70.0);
    assert_eq!(view.termination_reason, Some("time_expired"));
    assert!(view.current_question.is_none());
    assert!(view.latest_evaluation.is_some());
}

#[test]
fn session_info_projects_without_responses() {
    let mut session = completed_session();
    session.status = SessionStatus::InProgress;
    session.termination_reason = None;
    let time_status = clock::status(
        session.started_at,
        session.duration_minutes,
        session.processing_overhead_seconds,
        Utc::now(),
    );
    let view = session_info(&session, time_status);

    assert_eq!(view.job_role, "Backend Engineer");
    assert_eq!(view.status, "in_progress");
    assert_eq!(view.duration_minutes, 20);
    assert!(view.termination_reason.is_none());
}
