use crate::config::EngineConfig;

use super::clock::TimeStatus;
use super::domain::InterviewRound;

/// Outcome of evaluating the Technical→HR transition after an answer.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Continue,
    AdvanceToHr { technical_score: f64 },
    Terminate { technical_score: f64 },
}

/// Evaluate the round gate against the latest recomputed time status.
///
/// The check only arms once the round holds a minimum sample of answers and
/// the active clock has consumed the configured fraction of the session.
/// Below-cutoff averages terminate; everything else advances. The HR round
/// has no gate of its own.
pub fn evaluate(
    round: InterviewRound,
    answered_in_round: usize,
    technical_score: f64,
    time_status: &TimeStatus,
    duration_minutes: u32,
    config: &EngineConfig,
) -> GateDecision {
    if round != InterviewRound::Technical {
        return GateDecision::Continue;
    }

    let time_threshold = f64::from(duration_minutes) * config.technical_time_fraction;
    if answered_in_round < config.min_round_answers || time_status.elapsed_minutes < time_threshold
    {
        return GateDecision::Continue;
    }

    if technical_score < config.technical_cutoff {
        GateDecision::Terminate { technical_score }
    } else {
        GateDecision::AdvanceToHr { technical_score }
    }
}
