//! Session lifecycle over a store and a catalog.
//!
//! [`AssessmentService`] is the load → core → persist wrapper: it loads a
//! session, runs the pure selection or recording logic on it, and writes it
//! back with the version it was loaded at.

use std::sync::Arc;

use tracing::info;

use crate::catalog::Catalog;
use crate::error::{AdaptestError, RecordKind, Result};
use crate::recorder::record_response;
use crate::selector::{CandidateScore, SelectionStrategy, select_next_task};
use crate::session::{Progress, ResponseInput, Session};
use crate::store::SessionStore;
use crate::types::{SessionId, StudentId, TaskId};

pub struct AssessmentService {
    store: Arc<dyn SessionStore>,
    catalog: Arc<dyn Catalog>,
    default_strategy: SelectionStrategy,
}

impl AssessmentService {
    pub fn new(store: Arc<dyn SessionStore>, catalog: Arc<dyn Catalog>) -> Self {
        Self {
            store,
            catalog,
            default_strategy: SelectionStrategy::default(),
        }
    }

    /// Strategy for sessions created without one.
    pub fn with_default_strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    // === Commands (write the session) ===

    /// Create and store a new session.
    pub async fn create_session(
        &self,
        student_id: StudentId,
        task_ids: Vec<TaskId>,
        strategy: Option<SelectionStrategy>,
    ) -> Result<Session> {
        let strategy = strategy.unwrap_or(self.default_strategy);
        let session = Session::new(student_id, task_ids, strategy)?;
        self.store.insert(&session).await?;
        info!(
            session_id = %session.id,
            student_id = %session.student_id,
            strategy = %strategy,
            tasks = session.task_ids.len(),
            "Created session"
        );
        Ok(session)
    }

    /// Validate and record a response, then persist the session.
    pub async fn submit_response(&self, id: SessionId, input: ResponseInput) -> Result<Session> {
        let mut session = self.load(id).await?;
        let expected = session.version;
        record_response(&mut session, input, self.catalog.as_ref())?;
        self.persist(&mut session, expected).await?;
        Ok(session)
    }

    /// Close a session and lock its responses.
    pub async fn finish_session(&self, id: SessionId) -> Result<Session> {
        let mut session = self.load(id).await?;
        if session.is_completed {
            return Ok(session);
        }
        let expected = session.version;
        session.finish();
        self.persist(&mut session, expected).await?;
        info!(session_id = %id, responses = session.responses.len(), "Finished session");
        Ok(session)
    }

    // === Queries (never write) ===

    pub async fn get_session(&self, id: SessionId) -> Result<Session> {
        self.load(id).await
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionId>> {
        self.store.list().await
    }

    /// The task to administer next, or `None` when nothing remains.
    pub async fn next_task(&self, id: SessionId) -> Result<Option<TaskId>> {
        let session = self.load(id).await?;
        Ok(select_next_task(&session, self.catalog.as_ref()))
    }

    /// Candidate scores behind the next selection.
    pub async fn explain(&self, id: SessionId) -> Result<Vec<CandidateScore>> {
        let session = self.load(id).await?;
        Ok(session
            .selection_strategy
            .selector()
            .score_candidates(&session, self.catalog.as_ref()))
    }

    pub async fn progress(&self, id: SessionId) -> Result<Progress> {
        Ok(self.load(id).await?.progress())
    }

    async fn load(&self, id: SessionId) -> Result<Session> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| AdaptestError::not_found(RecordKind::Session, id))
    }

    async fn persist(&self, session: &mut Session, expected: u64) -> Result<()> {
        session.version = expected + 1;
        self.store.save(session, expected).await
    }
}
