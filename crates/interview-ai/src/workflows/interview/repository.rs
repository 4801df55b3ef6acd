use super::domain::{InterviewSession, SessionId};

/// Storage abstraction so the session engine can be exercised in isolation.
///
/// Updates are optimistic: callers pass the response count they observed and
/// the store must reject the write with [`StoreError::Conflict`] when the
/// persisted session has moved on. That compare-and-swap is the single-writer
/// discipline for concurrent submissions.
pub trait SessionStore: Send + Sync {
    /// Persist a new session. The invite token is unique; a second insert for
    /// the same token fails with [`StoreError::Conflict`].
    fn insert(&self, session: InterviewSession) -> Result<InterviewSession, StoreError>;

    fn fetch(&self, id: &SessionId) -> Result<Option<InterviewSession>, StoreError>;

    fn fetch_by_token(&self, token: &str) -> Result<Option<InterviewSession>, StoreError>;

    /// Replace a stored session if its response count still equals
    /// `expected_responses`.
    fn update(
        &self,
        session: InterviewSession,
        expected_responses: usize,
    ) -> Result<(), StoreError>;

    /// Every session belonging to a parent assessment, for peer-diversity
    /// exclusion and progress monitoring.
    fn in_assessment(&self, assessment_id: &str) -> Result<Vec<InterviewSession>, StoreError>;

    /// Completed sessions the candidate already finished for the same role,
    /// for anti-repeat exclusion across retakes.
    fn completed_for_candidate(
        &self,
        candidate_email: &str,
        job_role: &str,
    ) -> Result<Vec<InterviewSession>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session already exists or was modified concurrently")]
    Conflict,
    #[error("session not found")]
    NotFound,
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}
