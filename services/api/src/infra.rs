use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use interview_ai::workflows::interview::{
    InterviewSession, SessionId, SessionStore, StoreError,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Mutex-guarded map keyed by invite token. The token-unique insert and the
/// response-count compare-and-swap give the engine its single-writer
/// guarantee without any external database.
#[derive(Default, Clone)]
pub(crate) struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<String, InterviewSession>>>,
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, session: InterviewSession) -> Result<InterviewSession, StoreError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        if guard.contains_key(&session.invite_token) {
            return Err(StoreError::Conflict);
        }
        guard.insert(session.invite_token.clone(), session.clone());
        Ok(session)
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<InterviewSession>, StoreError> {
        let guard = self.sessions.lock().expect("session mutex poisoned");
        Ok(guard.values().find(|session| &session.id == id).cloned())
    }

    fn fetch_by_token(&self, token: &str) -> Result<Option<InterviewSession>, StoreError> {
        let guard = self.sessions.lock().expect("session mutex poisoned");
        Ok(guard.get(token).cloned())
    }

    fn update(
        &self,
        session: InterviewSession,
        expected_responses: usize,
    ) -> Result<(), StoreError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
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
        let guard = self.sessions.lock().expect("session mutex poisoned");
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
        let guard = self.sessions.lock().expect("session mutex poisoned");
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
