//! Session and response records.
//!
//! A session is the whole document the store loads and persists per call. It
//! exclusively owns its responses and its [`StudentModel`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::StudentModel;
use crate::selector::SelectionStrategy;
use crate::types::{EvidenceId, ObservationId, QuestionId, SessionId, StudentId, TaskId};

/// One examinee submission.
///
/// Created once per submission. Only `locked` changes afterwards, when the
/// session finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub task_id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<QuestionId>,
    #[serde(default)]
    pub raw_answer: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_id: Option<ObservationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scored_value: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_id: Option<EvidenceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric_level: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub locked: bool,
}

impl Response {
    /// Whether the response scored as correct.
    pub fn is_correct(&self) -> bool {
        self.scored_value == Some(1)
    }
}

/// A submission as received from the caller, before the server stamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInput {
    pub task_id: TaskId,
    #[serde(default)]
    pub question_id: Option<QuestionId>,
    #[serde(default)]
    pub raw_answer: serde_json::Value,
    #[serde(default)]
    pub observation_id: Option<ObservationId>,
    #[serde(default)]
    pub scored_value: Option<u8>,
    #[serde(default)]
    pub evidence_id: Option<EvidenceId>,
    #[serde(default)]
    pub rubric_level: Option<String>,
}

impl ResponseInput {
    pub fn new(task_id: impl Into<TaskId>) -> Self {
        Self {
            task_id: task_id.into(),
            question_id: None,
            raw_answer: serde_json::Value::Null,
            observation_id: None,
            scored_value: None,
            evidence_id: None,
            rubric_level: None,
        }
    }

    pub(crate) fn into_response(self, timestamp: DateTime<Utc>) -> Response {
        Response {
            task_id: self.task_id,
            question_id: self.question_id,
            raw_answer: self.raw_answer,
            observation_id: self.observation_id,
            scored_value: self.scored_value,
            evidence_id: self.evidence_id,
            rubric_level: self.rubric_level,
            timestamp,
            locked: false,
        }
    }
}

/// Answered/remaining counts for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub student_id: StudentId,
    pub task_ids: Vec<TaskId>,
    #[serde(default)]
    pub responses: Vec<Response>,
    #[serde(default)]
    pub current_task_index: usize,
    pub selection_strategy: SelectionStrategy,
    #[serde(default)]
    pub student_model: StudentModel,
    #[serde(default)]
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Incremented by the store on every successful save
    #[serde(default)]
    pub version: u64,
}

impl Session {
    /// Start a session over `task_ids`, administered under `strategy`.
    ///
    /// Task ids must be non-empty and unique.
    pub fn new(
        student_id: StudentId,
        task_ids: Vec<TaskId>,
        strategy: SelectionStrategy,
    ) -> Result<Self, ValidationError> {
        if task_ids.is_empty() {
            return Err(ValidationError::EmptyTaskList);
        }
        let mut seen = HashSet::with_capacity(task_ids.len());
        if let Some(dup) = task_ids.iter().find(|id| !seen.insert(*id)) {
            return Err(ValidationError::DuplicateTask(dup.clone()));
        }

        let now = Utc::now();
        Ok(Self {
            id: SessionId::new(),
            student_id,
            task_ids,
            responses: Vec::new(),
            current_task_index: 0,
            selection_strategy: strategy,
            student_model: StudentModel::new(),
            is_completed: false,
            created_at: now,
            updated_at: now,
            completed_at: None,
            version: 0,
        })
    }

    pub fn contains_task(&self, task_id: &TaskId) -> bool {
        self.task_ids.contains(task_id)
    }

    /// Task ids that have at least one response.
    pub fn answered_task_ids(&self) -> HashSet<&TaskId> {
        self.responses.iter().map(|r| &r.task_id).collect()
    }

    /// Unanswered task ids, in administration order.
    pub fn remaining_task_ids(&self) -> Vec<&TaskId> {
        let answered = self.answered_task_ids();
        self.task_ids
            .iter()
            .filter(|id| !answered.contains(id))
            .collect()
    }

    /// Counts only tasks in `task_ids`; responses naming other tasks are ignored.
    pub fn progress(&self) -> Progress {
        let total = self.task_ids.len();
        let remaining = self.remaining_task_ids().len();
        Progress {
            total,
            answered: total - remaining,
            remaining,
            is_completed: self.is_completed,
        }
    }

    /// Close the session and lock its responses. Finishing twice is a no-op.
    pub fn finish(&mut self) {
        if self.is_completed {
            return;
        }
        let now = Utc::now();
        self.is_completed = true;
        self.completed_at = Some(now);
        self.updated_at = now;
        self.responses.iter_mut().for_each(|r| r.locked = true);
    }
}
