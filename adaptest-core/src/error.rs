//! Error types for adaptest-core

use thiserror::Error;

use crate::types::{EvidenceId, NodeId, ObservationId, SessionId, TaskId};

/// Cross-reference or state violations caught before a session is mutated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The session has finished; its responses are locked
    #[error("session {0} is completed and no longer accepts responses")]
    SessionCompleted(SessionId),

    /// The response names a task the session does not administer
    #[error("task {0} is not part of this session")]
    UnknownTask(TaskId),

    /// The observation is not declared by any evidence model linked to the task
    #[error("observation {observation_id} is not defined for task {task_id}")]
    UnknownObservation {
        task_id: TaskId,
        observation_id: ObservationId,
    },

    /// The evidence is not declared by any evidence model linked to the task
    #[error("evidence {evidence_id} is not defined for task {task_id}")]
    UnknownEvidence {
        task_id: TaskId,
        evidence_id: EvidenceId,
    },

    /// The observation has no rubric, or its rubric lacks the level
    #[error("rubric level {level:?} is not defined for observation {observation_id}")]
    UnknownRubricLevel {
        observation_id: ObservationId,
        level: String,
    },

    /// Session task lists must not repeat a task
    #[error("task {0} appears more than once in the session")]
    DuplicateTask(TaskId),

    /// A session needs at least one task
    #[error("a session needs at least one task")]
    EmptyTaskList,

    /// Scored values are dichotomous
    #[error("scored value {0} is not 0 or 1")]
    InvalidScore(u8),

    /// Node posteriors lie strictly between 0 and 1
    #[error("posterior {value} for node {node} is outside (0, 1)")]
    InvalidPosterior { node: NodeId, value: f64 },
}

/// Kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Session,
    Task,
    TaskModel,
    Question,
    EvidenceModel,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Session => "session",
            Self::Task => "task",
            Self::TaskModel => "task model",
            Self::Question => "question",
            Self::EvidenceModel => "evidence model",
        };
        f.write_str(name)
    }
}

/// Error type for engine and store operations
#[derive(Debug, Error)]
pub enum AdaptestError {
    /// Input rejected before any mutation
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced record is absent from the store or catalog
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    /// The stored session changed since it was loaded
    #[error("session {session_id} was modified concurrently (expected version {expected}, found {found})")]
    Conflict {
        session_id: SessionId,
        expected: u64,
        found: u64,
    },

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AdaptestError {
    pub(crate) fn not_found(kind: RecordKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Result type alias for adaptest operations
pub type Result<T> = std::result::Result<T, AdaptestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_reference() {
        let err = ValidationError::UnknownTask(TaskId::from("t9"));
        assert_eq!(err.to_string(), "task t9 is not part of this session");
    }

    #[test]
    fn test_validation_converts_into_crate_error() {
        let err: AdaptestError = ValidationError::EmptyTaskList.into();
        assert!(matches!(err, AdaptestError::Validation(_)));
    }

    #[test]
    fn test_invalid_posterior_names_node() {
        let err = ValidationError::InvalidPosterior {
            node: NodeId::from("o1"),
            value: 1.5,
        };
        assert_eq!(err.to_string(), "posterior 1.5 for node o1 is outside (0, 1)");
    }

    #[test]
    fn test_not_found_display() {
        let err = AdaptestError::not_found(RecordKind::TaskModel, "tm-1");
        assert_eq!(err.to_string(), "task model not found: tm-1");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AdaptestError = io_err.into();
        assert!(matches!(err, AdaptestError::Io(_)));
    }
}
