use super::config::ScoringConfig;
use super::{strength_for, Evaluation, EvaluationPhase};
use crate::workflows::interview::clock::round_tenth;
use crate::workflows::interview::similarity::SemanticSimilarity;

const STRUCTURE_MARKERS: [&str; 12] = [
    "firstly",
    "secondly",
    "however",
    "moreover",
    "for example",
    "in addition",
    "furthermore",
    "therefore",
    "in conclusion",
    "on the other hand",
    "specifically",
    "for instance",
];

/// Instant-phase scoring. Local heuristics only, no external calls.
pub(crate) fn score_answer(
    ideal_answer: &str,
    answer: &str,
    keywords: &[String],
    similarity: &dyn SemanticSimilarity,
    config: &ScoringConfig,
) -> Evaluation {
    if answer.trim().is_empty() {
        return Evaluation::empty_answer(keywords);
    }

    let similarity_score = similarity.score(ideal_answer, answer);

    let answer_lower = answer.to_lowercase();
    let (matched, missed): (Vec<String>, Vec<String>) = keywords
        .iter()
        .cloned()
        .partition(|keyword| answer_lower.contains(&keyword.to_lowercase()));
    let keyword_pct = (matched.len() as f64 / keywords.len().max(1) as f64) * 100.0;

    let word_count = answer.split_whitespace().count();
    let sentence_count = answer
        .split('.')
        .filter(|sentence| !sentence.trim().is_empty())
        .count();

    let communication = communication_score(&answer_lower, word_count, sentence_count);
    let depth = (similarity_score * 0.5 + keyword_pct * 0.3 + word_count.min(100) as f64 * 0.2)
        .min(100.0);
    let content = similarity_score * 0.6 + keyword_pct * 0.4;
    let confidence = config.neutral_confidence;

    let overall = config.weighted_overall(content, keyword_pct, depth, communication, confidence);

    let feedback = feedback_text(
        similarity_score,
        keyword_pct,
        word_count,
        sentence_count,
        overall,
        &missed,
    );

    Evaluation {
        content_score: round_tenth(content),
        keyword_score: round_tenth(keyword_pct),
        depth_score: round_tenth(depth),
        communication_score: round_tenth(communication),
        confidence_score: round_tenth(confidence),
        overall_score: round_tenth(overall),
        similarity_score: round_tenth(similarity_score),
        keyword_coverage: round_tenth(keyword_pct),
        keywords_matched: matched,
        keywords_missed: missed,
        feedback,
        answer_strength: strength_for(overall, config),
        phase: EvaluationPhase::Instant,
        code_evaluation: None,
    }
}

/// Monotonic step function of answer length plus structure bonuses.
fn communication_score(answer_lower: &str, word_count: usize, sentence_count: usize) -> f64 {
    let mut score: f64 = match word_count {
        0..=9 => 15.0,
        10..=19 => 35.0,
        20..=49 => 55.0,
        50..=99 => 70.0,
        100..=199 => 82.0,
        _ => 88.0,
    };

    if sentence_count >= 3 {
        score = (score + 8.0).min(100.0);
    }
    if sentence_count >= 5 {
        score = (score + 5.0).min(100.0);
    }

    let marker_count = STRUCTURE_MARKERS
        .iter()
        .filter(|marker| answer_lower.contains(**marker))
        .count();
    (score + marker_count as f64 * 3.0).min(100.0)
}

fn feedback_text(
    similarity: f64,
    keyword_pct: f64,
    word_count: usize,
    sentence_count: usize,
    overall: f64,
    missed: &[String],
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if similarity >= 70.0 {
        parts.push("Your answer aligns well with the expected response.".to_string());
    } else if similarity >= 40.0 {
        parts.push("Your answer partially covers the expected content.".to_string());
    } else {
        parts.push("Your answer doesn't closely match what was expected.".to_string());
    }

    if keyword_pct >= 70.0 {
        parts.push("Good use of relevant technical terminology.".to_string());
    } else if !missed.is_empty() {
        let preview: Vec<&str> = missed.iter().take(3).map(String::as_str).collect();
        parts.push(format!("Consider mentioning: {}.", preview.join(", ")));
    }

    if word_count < 30 {
        parts.push(
            "Try to elaborate more, providing specific examples and details.".to_string(),
        );
    } else if sentence_count < 3 {
        parts.push("Structure your answer into multiple points for clarity.".to_string());
    }

    if overall >= 75.0 {
        parts.push("Strong response overall!".to_string());
    } else if overall < 40.0 {
        parts.push("Review the core concepts and practice with concrete examples.".to_string());
    }

    parts.join(" ")
}
