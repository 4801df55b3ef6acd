use chrono::{DateTime, Utc};
use serde::Serialize;

use super::clock::{round_tenth, TimeStatus};
use super::domain::{InterviewRound, InterviewSession};
use super::scoring::{AnswerStrength, Evaluation};

const HR_PASS_THRESHOLD: f64 = 60.0;

/// Averaged component scores across a set of responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComponentAverages {
    pub content_score: f64,
    pub keyword_score: f64,
    pub depth_score: f64,
    pub communication_score: f64,
    pub confidence_score: f64,
    pub overall_score: f64,
}

/// One answered question as it appears in the final report.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionEvaluationView {
    pub question: String,
    pub answer: String,
    pub ideal_answer: String,
    pub round: InterviewRound,
    pub difficulty: &'static str,
    pub evaluation: Evaluation,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundOutcomeView {
    pub score: f64,
    pub questions_asked: usize,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundSummaryView {
    pub technical: RoundOutcomeView,
    pub hr: RoundOutcomeView,
}

/// Full two-round report folded from stored session state.
#[derive(Debug, Clone, Serialize)]
pub struct InterviewReport {
    pub session_id: String,
    pub candidate_name: String,
    pub job_role: String,
    pub total_questions: usize,
    pub technical_questions: usize,
    pub hr_questions: usize,
    pub technical_score: f64,
    pub hr_score: f64,
    pub overall_score: f64,
    pub overall_scores: ComponentAverages,
    pub question_evaluations: Vec<QuestionEvaluationView>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub improvement_suggestions: Vec<String>,
    pub communication_feedback: String,
    pub confidence_analysis: String,
    pub recommendation: String,
    pub round_summary: RoundSummaryView,
    pub generated_at: DateTime<Utc>,
}

/// Fold all responses into the final report. Pure over stored state.
pub fn build_report(
    session: &InterviewSession,
    technical_cutoff: f64,
    generated_at: DateTime<Utc>,
) -> InterviewReport {
    let mut technical = Vec::new();
    let mut hr = Vec::new();

    for response in &session.responses {
        let Some(question) = session.question(&response.question_id) else {
            continue;
        };
        let view = QuestionEvaluationView {
            question: question.prompt.clone(),
            answer: response.answer_text.clone(),
            ideal_answer: question.ideal_answer.clone(),
            round: question.round,
            difficulty: question.difficulty.label(),
            evaluation: response.evaluation.clone(),
        };
        match question.round {
            InterviewRound::Hr => hr.push(view),
            InterviewRound::Technical => technical.push(view),
        }
    }

    let technical_score = safe_avg(technical.iter().map(|view| view.evaluation.overall_score));
    let hr_score = safe_avg(hr.iter().map(|view| view.evaluation.overall_score));
    let overall_score = safe_avg(
        technical
            .iter()
            .chain(hr.iter())
            .map(|view| view.evaluation.overall_score),
    );

    let all: Vec<QuestionEvaluationView> = technical
        .iter()
        .cloned()
        .chain(hr.iter().cloned())
        .collect();
    let overall_scores = component_averages(&all, overall_score);

    let (strengths, weaknesses, improvement_suggestions) =
        analyze_performance(&overall_scores, &all);

    let (recommendation, confidence_analysis) =
        recommend(technical_score, hr_score, technical_cutoff);

    InterviewReport {
        session_id: session.id.0.clone(),
        candidate_name: session.candidate_name.clone(),
        job_role: session.role.job_role.clone(),
        total_questions: session.responses.len(),
        technical_questions: technical.len(),
        hr_questions: hr.len(),
        technical_score,
        hr_score,
        overall_score,
        communication_feedback: communication_feedback(overall_scores.communication_score),
        round_summary: RoundSummaryView {
            technical: RoundOutcomeView {
                score: technical_score,
                questions_asked: technical.len(),
                passed: technical_score >= technical_cutoff,
            },
            hr: RoundOutcomeView {
                score: hr_score,
                questions_asked: hr.len(),
                passed: hr_score >= HR_PASS_THRESHOLD,
            },
        },
        overall_scores,
        question_evaluations: all,
        strengths,
        weaknesses,
        improvement_suggestions,
        confidence_analysis,
        recommendation,
        generated_at,
    }
}

fn component_averages(views: &[QuestionEvaluationView], overall: f64) -> ComponentAverages {
    ComponentAverages {
        content_score: safe_avg(views.iter().map(|view| view.evaluation.content_score)),
        keyword_score: safe_avg(views.iter().map(|view| view.evaluation.keyword_score)),
        depth_score: safe_avg(views.iter().map(|view| view.evaluation.depth_score)),
        communication_score: safe_avg(
            views.iter().map(|view| view.evaluation.communication_score),
        ),
        confidence_score: safe_avg(views.iter().map(|view| view.evaluation.confidence_score)),
        overall_score: overall,
    }
}

fn safe_avg<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        sum += value;
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    round_tenth(sum / count as f64)
}

fn recommend(technical_score: f64, hr_score: f64, cutoff: f64) -> (String, String) {
    if technical_score >= cutoff && hr_score >= HR_PASS_THRESHOLD {
        (
            "Selected".to_string(),
            "Strong candidate with good technical and interpersonal skills.".to_string(),
        )
    } else if technical_score >= cutoff {
        (
            "Maybe - HR skills need improvement".to_string(),
            "Technically strong but needs improvement in soft skills.".to_string(),
        )
    } else if technical_score >= 50.0 {
        (
            "Not Selected - Below threshold".to_string(),
            "Candidate shows potential but did not meet the required technical cutoff.".to_string(),
        )
    } else {
        (
            "Not Selected".to_string(),
            "Candidate needs significant improvement in technical knowledge.".to_string(),
        )
    }
}

fn communication_feedback(communication_avg: f64) -> String {
    if communication_avg >= 80.0 {
        "Excellent communication skills. Answers are well-structured and articulate.".to_string()
    } else if communication_avg >= 60.0 {
        "Good communication. Could improve answer structure and depth.".to_string()
    } else if communication_avg >= 40.0 {
        "Average communication. Needs to practice structuring responses clearly.".to_string()
    } else {
        "Communication needs significant improvement. Practice the STAR method for behavioral questions."
            .to_string()
    }
}

fn analyze_performance(
    averages: &ComponentAverages,
    evaluations: &[QuestionEvaluationView],
) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    let mut suggestions = Vec::new();

    if averages.content_score >= 70.0 {
        strengths.push("Strong technical knowledge and relevant answers".to_string());
    } else {
        weaknesses.push("Content could be more relevant and detailed".to_string());
        suggestions
            .push("Study core concepts for your target role and practice explaining them".to_string());
    }

    if averages.communication_score >= 70.0 {
        strengths.push("Good communication skills and structured responses".to_string());
    } else {
        weaknesses.push("Communication needs improvement".to_string());
        suggestions.push(
            "Practice structuring answers using the STAR method (Situation, Task, Action, Result)"
                .to_string(),
        );
    }

    if averages.depth_score >= 70.0 {
        strengths.push("Demonstrates deep understanding of concepts".to_string());
    } else {
        weaknesses.push("Answers lack depth and practical examples".to_string());
        suggestions.push(
            "Include specific examples, metrics, and real-world scenarios in your answers"
                .to_string(),
        );
    }

    if averages.keyword_score >= 70.0 {
        strengths.push("Good use of industry terminology and keywords".to_string());
    } else {
        weaknesses.push("Missing key industry terms and technical vocabulary".to_string());
        suggestions.push("Review job descriptions and use relevant technical terminology".to_string());
    }

    if averages.overall_score >= 75.0 {
        strengths.push("Overall strong interview performance".to_string());
    } else if averages.overall_score < 40.0 {
        weaknesses.push("Overall performance needs significant improvement".to_string());
        suggestions.push("Practice with mock interviews daily and review ideal answers".to_string());
    }

    let weak_count = evaluations
        .iter()
        .filter(|view| view.evaluation.answer_strength == AnswerStrength::Weak)
        .count();
    if !evaluations.is_empty() && weak_count * 2 > evaluations.len() {
        weaknesses.push(format!(
            "Struggled with {weak_count} out of {} questions",
            evaluations.len()
        ));
        suggestions.push("Focus on your weak areas and build confidence through practice".to_string());
    }

    if strengths.is_empty() {
        strengths.push("Willingness to practice and improve".to_string());
    }
    if suggestions.is_empty() {
        suggestions.push("Keep practicing to maintain your performance level".to_string());
    }

    (strengths, weaknesses, suggestions)
}

/// Averages surfaced on the monitoring endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProgressAverages {
    pub content_score: f64,
    pub communication_score: f64,
    pub overall_score: f64,
    pub keyword_coverage: f64,
}

/// Per-candidate monitoring row for a parent assessment.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateProgressView {
    pub session_id: String,
    pub invite_token: String,
    pub candidate_name: String,
    pub candidate_email: String,
    pub status: &'static str,
    pub current_round: InterviewRound,
    pub answered: usize,
    pub avg_scores: ProgressAverages,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_evaluation: Option<Evaluation>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_reason: Option<&'static str>,
    pub time_status: TimeStatus,
}

pub fn progress_view(session: &InterviewSession, time_status: TimeStatus) -> CandidateProgressView {
    let avg_scores = ProgressAverages {
        content_score: safe_avg(
            session
                .responses
                .iter()
                .map(|response| response.evaluation.content_score),
        ),
        communication_score: safe_avg(
            session
                .responses
                .iter()
                .map(|response| response.evaluation.communication_score),
        ),
        overall_score: safe_avg(
            session
                .responses
                .iter()
                .map(|response| response.evaluation.overall_score),
        ),
        keyword_coverage: safe_avg(
            session
                .responses
                .iter()
                .map(|response| response.evaluation.keyword_coverage),
        ),
    };

    CandidateProgressView {
        session_id: session.id.0.clone(),
        invite_token: session.invite_token.clone(),
        candidate_name: session.candidate_name.clone(),
        candidate_email: session.candidate_email.clone(),
        status: session.status.label(),
        current_round: session.current_round,
        answered: session.responses.len(),
        avg_scores,
        current_question: session
            .current_question()
            .map(|question| question.prompt.clone()),
        latest_evaluation: session
            .responses
            .last()
            .map(|response| response.evaluation.clone()),
        started_at: session.started_at,
        completed_at: session.completed_at,
        technical_score: session.technical_score,
        hr_score: session.hr_score,
        termination_reason: session.termination_reason.map(|reason| reason.label()),
        time_status,
    }
}

/// Pre-start/resume projection of a session bound to an invite token.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfoView {
    pub session_id: String,
    pub job_role: String,
    pub experience_level: String,
    pub duration_minutes: u32,
    pub status: &'static str,
    pub current_round: InterviewRound,
    pub answered: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_reason: Option<&'static str>,
    pub time_status: TimeStatus,
}

pub fn session_info(session: &InterviewSession, time_status: TimeStatus) -> SessionInfoView {
    SessionInfoView {
        session_id: session.id.0.clone(),
        job_role: session.role.job_role.clone(),
        experience_level: session.role.experience_level.clone(),
        duration_minutes: session.duration_minutes,
        status: session.status.label(),
        current_round: session.current_round,
        answered: session.responses.len(),
        termination_reason: session.termination_reason.map(|reason| reason.label()),
        time_status,
    }
}
