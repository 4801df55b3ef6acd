use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived view of the session clock. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeStatus {
    pub elapsed_minutes: f64,
    pub remaining_minutes: f64,
    pub remaining_seconds: u64,
    pub is_expired: bool,
    pub is_wrap_up: bool,
    pub progress_pct: f64,
    pub wall_elapsed_minutes: f64,
}

/// Compute the session clock from active time only.
///
/// Cumulative processing overhead (scoring and generation latency) is
/// subtracted from the wall-clock elapsed time so the candidate is never
/// charged for it. Callers must accumulate the overhead before calling; this
/// function never estimates it.
pub fn status(
    started_at: DateTime<Utc>,
    duration_minutes: u32,
    processing_overhead_seconds: f64,
    now: DateTime<Utc>,
) -> TimeStatus {
    let wall_elapsed = (now - started_at).num_milliseconds() as f64 / 60_000.0;
    let active_elapsed = (wall_elapsed - processing_overhead_seconds / 60.0).max(0.0);
    let duration = f64::from(duration_minutes);
    let remaining = (duration - active_elapsed).max(0.0);

    let progress_pct = ((active_elapsed / duration.max(1.0)) * 100.0).min(100.0);

    TimeStatus {
        elapsed_minutes: round_tenth(active_elapsed),
        remaining_minutes: round_tenth(remaining),
        remaining_seconds: (remaining * 60.0) as u64,
        is_expired: remaining <= 0.0,
        is_wrap_up: remaining > 0.0 && remaining < 2.0,
        progress_pct: round_tenth(progress_pct),
        wall_elapsed_minutes: round_tenth(wall_elapsed),
    }
}

pub(crate) fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
