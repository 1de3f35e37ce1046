//! Next-task selection.
//!
//! A session picks one [`SelectionStrategy`] at creation. Each strategy maps
//! to a [`TaskSelector`] that reads the session and the catalog and never
//! writes, so asking for the next task twice without recording a response
//! returns the same answer.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bayes;
use crate::catalog::Catalog;
use crate::irt::IrtItem;
use crate::session::Session;
use crate::types::TaskId;

/// How a session chooses its next task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SelectionStrategy {
    /// Administer tasks in list order
    #[default]
    #[serde(rename = "fixed")]
    Fixed,
    /// Target the unanswered item whose difficulty is closest to theta
    #[serde(rename = "IRT")]
    Irt,
    /// Target the unanswered task with the largest expected information gain
    BayesianNetwork,
}

impl SelectionStrategy {
    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Irt => "IRT",
            Self::BayesianNetwork => "BayesianNetwork",
        }
    }

    /// Parse a strategy name, ignoring case and separators.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "fixed" => Some(Self::Fixed),
            "irt" => Some(Self::Irt),
            "bayesiannetwork" | "bn" => Some(Self::BayesianNetwork),
            _ => None,
        }
    }

    /// The selector implementing this strategy.
    pub fn selector(&self) -> &'static dyn TaskSelector {
        match self {
            Self::Fixed => &FixedOrder,
            Self::Irt => &AbilityTargeting,
            Self::BayesianNetwork => &InformationGain,
        }
    }
}

impl std::fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate task with the score its strategy ranks it by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateScore {
    pub task_id: TaskId,
    pub score: f64,
}

/// One selection strategy.
pub trait TaskSelector: Send + Sync {
    /// Candidates with their scores, in administration order.
    ///
    /// Candidates the strategy cannot score are left out.
    fn score_candidates(&self, session: &Session, catalog: &dyn Catalog) -> Vec<CandidateScore>;

    /// The next task, or `None` when no candidate remains.
    fn select(&self, session: &Session, catalog: &dyn Catalog) -> Option<TaskId>;
}

/// Choose the next task for `session` under its own strategy.
pub fn select_next_task(session: &Session, catalog: &dyn Catalog) -> Option<TaskId> {
    let next = session.selection_strategy.selector().select(session, catalog);
    debug!(
        session_id = %session.id,
        strategy = %session.selection_strategy,
        next = ?next.as_ref().map(TaskId::as_str),
        "Selected next task"
    );
    next
}

/// First candidate in scan order that strictly beats every earlier one.
fn first_best(
    candidates: Vec<CandidateScore>,
    better: impl Fn(f64, f64) -> bool,
) -> Option<TaskId> {
    let mut best: Option<CandidateScore> = None;
    for candidate in candidates {
        let replace = match &best {
            None => true,
            Some(current) => better(candidate.score, current.score),
        };
        if replace {
            best = Some(candidate);
        }
    }
    best.map(|c| c.task_id)
}

/// Tasks in list order, positioned by `currentTaskIndex`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedOrder;

impl TaskSelector for FixedOrder {
    fn score_candidates(&self, session: &Session, _catalog: &dyn Catalog) -> Vec<CandidateScore> {
        session
            .task_ids
            .iter()
            .enumerate()
            .skip(session.current_task_index)
            .map(|(index, task_id)| CandidateScore {
                task_id: task_id.clone(),
                score: index as f64,
            })
            .collect()
    }

    fn select(&self, session: &Session, _catalog: &dyn Catalog) -> Option<TaskId> {
        session.task_ids.get(session.current_task_index).cloned()
    }
}

/// Minimises |b - θ| over unanswered tasks with a numeric difficulty.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbilityTargeting;

impl AbilityTargeting {
    fn difficulty(task_id: &TaskId, catalog: &dyn Catalog) -> Option<f64> {
        let Some(task) = catalog.task(task_id) else {
            debug!(task_id = %task_id, "Task missing from catalog, skipping");
            return None;
        };
        let Some(question_id) = &task.question_id else {
            debug!(task_id = %task_id, "Task has no question, skipping");
            return None;
        };
        let Some(question) = catalog.question(question_id) else {
            debug!(task_id = %task_id, question_id = %question_id, "Question missing, skipping");
            return None;
        };
        let item = IrtItem::from_parameters(&question.metadata);
        if item.is_none() {
            debug!(
                task_id = %task_id,
                question_id = %question_id,
                "Item has no numeric difficulty, skipping"
            );
        }
        item.map(|item| item.b)
    }
}

impl TaskSelector for AbilityTargeting {
    fn score_candidates(&self, session: &Session, catalog: &dyn Catalog) -> Vec<CandidateScore> {
        let theta = session.student_model.theta();
        session
            .remaining_task_ids()
            .into_iter()
            .filter_map(|task_id| {
                Self::difficulty(task_id, catalog).map(|b| CandidateScore {
                    task_id: task_id.clone(),
                    score: (b - theta).abs(),
                })
            })
            .collect()
    }

    fn select(&self, session: &Session, catalog: &dyn Catalog) -> Option<TaskId> {
        first_best(self.score_candidates(session, catalog), |a, b| a < b)
    }
}

/// Maximises expected information gain over unanswered tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct InformationGain;

impl TaskSelector for InformationGain {
    fn score_candidates(&self, session: &Session, catalog: &dyn Catalog) -> Vec<CandidateScore> {
        session
            .remaining_task_ids()
            .into_iter()
            .filter_map(|task_id| {
                let Some(task) = catalog.task(task_id) else {
                    debug!(task_id = %task_id, "Task missing from catalog, skipping");
                    return None;
                };
                bayes::expected_gain(task, &session.student_model, catalog).map(|gain| {
                    CandidateScore {
                        task_id: task_id.clone(),
                        score: gain,
                    }
                })
            })
            .collect()
    }

    fn select(&self, session: &Session, catalog: &dyn Catalog) -> Option<TaskId> {
        first_best(self.score_candidates(session, catalog), |a, b| a > b)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::catalog::{
        Cpt, EvidenceModel, InMemoryCatalog, ItemParameters, MeasurementModel, Observation,
        Question, Task, TaskModel,
    };
    use crate::session::ResponseInput;
    use crate::types::{
        ConstructId, EvidenceModelId, NodeId, ObservationId, QuestionId, StudentId, TaskModelId,
    };

    fn session(strategy: SelectionStrategy, ids: &[&str]) -> Session {
        Session::new(
            StudentId::from("s1"),
            ids.iter().map(|id| TaskId::from(*id)).collect(),
            strategy,
        )
        .unwrap()
    }

    fn answer(session: &mut Session, task: &str) {
        session
            .responses
            .push(ResponseInput::new(task).into_response(Utc::now()));
        session.current_task_index = (session.current_task_index + 1).min(session.task_ids.len());
    }

    fn irt_catalog(difficulties: &[(&str, Option<f64>)]) -> InMemoryCatalog {
        let mut catalog = InMemoryCatalog::new();
        for (task, b) in difficulties {
            let question_id = QuestionId::new(format!("q-{task}"));
            catalog.insert_task(Task {
                id: TaskId::from(*task),
                task_model_id: TaskModelId::from("tm"),
                question_id: Some(question_id.clone()),
                title: None,
            });
            catalog.insert_question(Question {
                id: question_id,
                text: None,
                metadata: ItemParameters {
                    a: None,
                    b: *b,
                    c: None,
                },
            });
        }
        catalog
    }

    /// One task per entry, each with its own BN evidence model over `nodes`.
    fn bn_catalog(tasks: &[(&str, &[(&str, Cpt)])]) -> InMemoryCatalog {
        let mut catalog = InMemoryCatalog::new();
        for (task, nodes) in tasks {
            let tm_id = TaskModelId::new(format!("tm-{task}"));
            let em_id = EvidenceModelId::new(format!("em-{task}"));
            catalog.insert_task(Task {
                id: TaskId::from(*task),
                task_model_id: tm_id.clone(),
                question_id: None,
                title: None,
            });
            catalog.insert_task_model(TaskModel {
                id: tm_id,
                evidence_model_ids: vec![em_id.clone()],
                expected_observations: Vec::new(),
            });
            catalog.insert_evidence_model(EvidenceModel {
                id: em_id,
                observations: nodes
                    .iter()
                    .map(|(n, _)| Observation {
                        id: ObservationId::from(*n),
                        construct_id: ConstructId::from("c"),
                        rubric: None,
                    })
                    .collect(),
                evidences: Vec::new(),
                measurement_model: Some(MeasurementModel::BayesianNetwork {
                    cpts: nodes.iter().map(|(n, c)| (NodeId::from(*n), *c)).collect(),
                }),
            });
        }
        catalog
    }

    #[test]
    fn test_strategy_wire_names() {
        assert_eq!(serde_json::to_string(&SelectionStrategy::Fixed).unwrap(), "\"fixed\"");
        assert_eq!(serde_json::to_string(&SelectionStrategy::Irt).unwrap(), "\"IRT\"");
        assert_eq!(
            serde_json::from_str::<SelectionStrategy>("\"BayesianNetwork\"").unwrap(),
            SelectionStrategy::BayesianNetwork
        );
    }

    #[test]
    fn test_strategy_parse_is_lenient() {
        assert_eq!(SelectionStrategy::parse("IRT"), Some(SelectionStrategy::Irt));
        assert_eq!(
            SelectionStrategy::parse("bayesian-network"),
            Some(SelectionStrategy::BayesianNetwork)
        );
        assert_eq!(SelectionStrategy::parse("Fixed"), Some(SelectionStrategy::Fixed));
        assert_eq!(SelectionStrategy::parse("random"), None);
    }

    #[test]
    fn test_fixed_follows_current_index() {
        let catalog = InMemoryCatalog::new();
        let mut s = session(SelectionStrategy::Fixed, &["t1", "t2", "t3"]);
        answer(&mut s, "t1");
        assert_eq!(select_next_task(&s, &catalog), Some(TaskId::from("t2")));
    }

    #[test]
    fn test_fixed_returns_none_when_exhausted() {
        let catalog = InMemoryCatalog::new();
        let mut s = session(SelectionStrategy::Fixed, &["t1"]);
        answer(&mut s, "t1");
        assert_eq!(select_next_task(&s, &catalog), None);
    }

    #[test]
    fn test_irt_picks_closest_difficulty() {
        let catalog = irt_catalog(&[("easy", Some(-1.0)), ("mid", Some(0.0)), ("hard", Some(1.0))]);
        let mut s = session(SelectionStrategy::Irt, &["easy", "mid", "hard"]);
        s.student_model.set_theta(0.3);
        assert_eq!(select_next_task(&s, &catalog), Some(TaskId::from("mid")));
    }

    #[test]
    fn test_irt_defaults_theta_to_zero_and_breaks_ties_by_order() {
        let catalog = irt_catalog(&[("a", Some(0.5)), ("b", Some(-0.5)), ("c", Some(2.0))]);
        let s = session(SelectionStrategy::Irt, &["a", "b", "c"]);
        assert_eq!(select_next_task(&s, &catalog), Some(TaskId::from("a")));
    }

    #[test]
    fn test_irt_skips_answered_and_ineligible_tasks() {
        let catalog = irt_catalog(&[("a", Some(0.0)), ("b", None), ("c", Some(3.0))]);
        let mut s = session(SelectionStrategy::Irt, &["a", "b", "c", "unknown"]);
        answer(&mut s, "a");
        assert_eq!(select_next_task(&s, &catalog), Some(TaskId::from("c")));

        let scored = AbilityTargeting.score_candidates(&s, &catalog);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].task_id, TaskId::from("c"));
        assert!((scored[0].score - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_irt_returns_none_without_eligible_items() {
        let catalog = irt_catalog(&[("a", None)]);
        let s = session(SelectionStrategy::Irt, &["a"]);
        assert_eq!(select_next_task(&s, &catalog), None);
    }

    #[test]
    fn test_bn_picks_highest_gain() {
        let catalog = bn_catalog(&[
            ("weak", &[("n1", Cpt::new(0.6, 0.4))]),
            ("strong", &[("n2", Cpt::new(0.95, 0.05))]),
        ]);
        let s = session(SelectionStrategy::BayesianNetwork, &["weak", "strong"]);
        assert_eq!(select_next_task(&s, &catalog), Some(TaskId::from("strong")));
    }

    #[test]
    fn test_bn_all_zero_gain_still_selects_first() {
        let catalog = bn_catalog(&[
            ("a", &[("n1", Cpt::new(0.5, 0.5))]),
            ("b", &[("n2", Cpt::new(0.5, 0.5))]),
        ]);
        let s = session(SelectionStrategy::BayesianNetwork, &["a", "b"]);
        assert_eq!(select_next_task(&s, &catalog), Some(TaskId::from("a")));
    }

    #[test]
    fn test_bn_ties_resolved_by_order() {
        let catalog = bn_catalog(&[
            ("a", &[("n1", Cpt::new(0.8, 0.2))]),
            ("b", &[("n2", Cpt::new(0.8, 0.2))]),
        ]);
        let mut s = session(SelectionStrategy::BayesianNetwork, &["b", "a"]);
        assert_eq!(select_next_task(&s, &catalog), Some(TaskId::from("b")));
        answer(&mut s, "b");
        assert_eq!(select_next_task(&s, &catalog), Some(TaskId::from("a")));
        answer(&mut s, "a");
        assert_eq!(select_next_task(&s, &catalog), None);
    }

    #[test]
    fn test_selection_is_idempotent() {
        let catalog = irt_catalog(&[("a", Some(0.2)), ("b", Some(-0.1))]);
        let s = session(SelectionStrategy::Irt, &["a", "b"]);
        let before = s.clone();
        let first = select_next_task(&s, &catalog);
        let second = select_next_task(&s, &catalog);
        assert_eq!(first, second);
        assert_eq!(s, before);
    }
}
