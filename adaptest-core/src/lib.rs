//! adaptest-core - next-task selection and student-model engine
//!
//! Runs adaptive assessment sessions: keeps a per-session estimate of the
//! examinee (an IRT ability and Bayesian-network mastery posteriors), records
//! responses, and picks the next task by fixed order, ability targeting, or
//! expected information gain.
//!
//! # Architecture
//!
//! - **Core** ([`select_next_task`], [`record_response`]) is pure: it works on
//!   an in-memory [`Session`] and a read-only [`Catalog`].
//! - **Store** ([`SessionStore`]) persists sessions as whole documents behind
//!   a version check.
//! - **Service** ([`AssessmentService`]) loads, runs the core, and persists.

pub mod bayes;
pub mod catalog;
pub mod config;
pub mod entropy;
pub mod error;
pub mod irt;
pub mod model;
pub mod recorder;
pub mod selector;
pub mod service;
pub mod session;
pub mod store;
pub mod types;

pub use bayes::{expected_gain, node_gain};
pub use catalog::{
    Catalog, Cpt, Evidence, EvidenceModel, ExpectedObservation, InMemoryCatalog, ItemParameters,
    MeasurementModel, Observation, Question, Rubric, RubricLevel, Task, TaskModel,
};
pub use config::{AdaptestConfig, StoreConfig};
pub use entropy::binary_entropy;
pub use error::{AdaptestError, RecordKind, Result, ValidationError};
pub use irt::{IrtItem, LEARNING_RATE};
pub use model::{DEFAULT_POSTERIOR, DEFAULT_THETA, StudentModel};
pub use recorder::record_response;
pub use selector::{
    AbilityTargeting, CandidateScore, FixedOrder, InformationGain, SelectionStrategy, TaskSelector,
    select_next_task,
};
pub use service::AssessmentService;
pub use session::{Progress, Response, ResponseInput, Session};
pub use store::{InMemorySessionStore, JsonFileSessionStore, SessionStore};
pub use types::*;
