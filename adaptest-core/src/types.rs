//! Identifier types shared across the engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an assessment session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new session ID with a UUIDv7 (time-ordered).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse from the hyphenated string form.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declares a string-backed identifier.
///
/// Catalog records are keyed by ids assigned by the admin collaborator, so
/// they stay opaque strings here.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Examinee identifier.
    StudentId
);
string_id!(
    /// Task identifier; a session administers an ordered list of these.
    TaskId
);
string_id!(
    /// Task model identifier.
    TaskModelId
);
string_id!(
    /// Question (item) identifier.
    QuestionId
);
string_id!(
    /// Evidence model identifier.
    EvidenceModelId
);
string_id!(
    /// Observation identifier. Observations double as Bayesian-network nodes.
    ObservationId
);
string_id!(
    /// Evidence identifier.
    EvidenceId
);
string_id!(
    /// Construct (measured trait) identifier.
    ConstructId
);

/// Bayesian-network node ids are the ids of the observations that feed them.
pub type NodeId = ObservationId;
