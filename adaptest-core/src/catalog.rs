//! Read-only catalog records: tasks, task models, questions, evidence models.
//!
//! These are owned by the admin collaborator. The engine only reads them,
//! through the [`Catalog`] lookup trait.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::types::{
    ConstructId, EvidenceId, EvidenceModelId, NodeId, ObservationId, QuestionId, TaskId,
    TaskModelId,
};

/// A task administered within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub task_model_id: TaskModelId,
    /// Question whose item parameters drive IRT targeting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<QuestionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Evidence a task is expected to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedObservation {
    pub observation_id: ObservationId,
    pub evidence_id: EvidenceId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskModel {
    pub id: TaskModelId,
    #[serde(default)]
    pub evidence_model_ids: Vec<EvidenceModelId>,
    #[serde(default)]
    pub expected_observations: Vec<ExpectedObservation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricLevel {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    #[serde(default)]
    pub levels: Vec<RubricLevel>,
}

impl Rubric {
    pub fn has_level(&self, level: &str) -> bool {
        self.levels.iter().any(|l| l.level == level)
    }
}

/// A scorable signal tied to a construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: ObservationId,
    pub construct_id: ConstructId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric: Option<Rubric>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub id: EvidenceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Conditional probability of a positive observation given node state.
///
/// Either side may be missing; readers fall back to
/// [`Cpt::DEFAULT_GIVEN_MASTERED`] and [`Cpt::DEFAULT_GIVEN_UNMASTERED`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cpt {
    /// P(observed = 1 | node = 1)
    #[serde(default, rename = "p1", skip_serializing_if = "Option::is_none")]
    pub given_mastered: Option<f64>,
    /// P(observed = 1 | node = 0)
    #[serde(default, rename = "p0", skip_serializing_if = "Option::is_none")]
    pub given_unmastered: Option<f64>,
}

impl Cpt {
    pub const DEFAULT_GIVEN_MASTERED: f64 = 0.8;
    pub const DEFAULT_GIVEN_UNMASTERED: f64 = 0.2;

    pub fn new(given_mastered: f64, given_unmastered: f64) -> Self {
        Self {
            given_mastered: Some(given_mastered),
            given_unmastered: Some(given_unmastered),
        }
    }

    /// `(p1, p0)` with defaults applied.
    pub fn resolved(&self) -> (f64, f64) {
        (
            self.given_mastered.unwrap_or(Self::DEFAULT_GIVEN_MASTERED),
            self.given_unmastered
                .unwrap_or(Self::DEFAULT_GIVEN_UNMASTERED),
        )
    }
}

/// How an evidence model turns observations into construct estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MeasurementModel {
    BayesianNetwork {
        #[serde(rename = "CPTs", default)]
        cpts: HashMap<NodeId, Cpt>,
    },
    /// Any other measurement model; ignored by information-gain scoring
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceModel {
    pub id: EvidenceModelId,
    #[serde(default)]
    pub observations: Vec<Observation>,
    #[serde(default)]
    pub evidences: Vec<Evidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_model: Option<MeasurementModel>,
}

impl EvidenceModel {
    pub fn observation(&self, id: &ObservationId) -> Option<&Observation> {
        self.observations.iter().find(|o| &o.id == id)
    }

    pub fn has_evidence(&self, id: &EvidenceId) -> bool {
        self.evidences.iter().any(|e| &e.id == id)
    }

    /// CPTs when this model is a Bayesian network, `None` otherwise.
    pub fn bayes_net_cpts(&self) -> Option<&HashMap<NodeId, Cpt>> {
        match &self.measurement_model {
            Some(MeasurementModel::BayesianNetwork { cpts }) => Some(cpts),
            _ => None,
        }
    }
}

/// IRT item parameters as stored in question metadata.
///
/// Values that are missing or not numbers deserialize to `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemParameters {
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub b: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub c: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub metadata: ItemParameters,
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|v| v.is_finite()))
}

/// Read-only lookups the engine performs against the record store.
pub trait Catalog: Send + Sync {
    fn task(&self, id: &TaskId) -> Option<&Task>;

    fn task_model(&self, id: &TaskModelId) -> Option<&TaskModel>;

    fn question(&self, id: &QuestionId) -> Option<&Question>;

    fn evidence_model(&self, id: &EvidenceModelId) -> Option<&EvidenceModel>;

    /// Evidence models linked to a task model, in link order.
    ///
    /// Dangling links are skipped.
    fn evidence_models_for<'a>(&'a self, task_model: &'a TaskModel) -> Vec<&'a EvidenceModel> {
        task_model
            .evidence_model_ids
            .iter()
            .filter_map(|id| {
                let model = self.evidence_model(id);
                if model.is_none() {
                    debug!(
                        task_model_id = %task_model.id,
                        evidence_model_id = %id,
                        "Linked evidence model missing, skipping"
                    );
                }
                model
            })
            .collect()
    }
}

/// On-disk layout of a catalog file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogFile {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    task_models: Vec<TaskModel>,
    #[serde(default)]
    questions: Vec<Question>,
    #[serde(default)]
    evidence_models: Vec<EvidenceModel>,
}

/// Catalog held entirely in memory, typically loaded from a JSON file.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    tasks: HashMap<TaskId, Task>,
    task_models: HashMap<TaskModelId, TaskModel>,
    questions: HashMap<QuestionId, Question>,
    evidence_models: HashMap<EvidenceModelId, EvidenceModel>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        file.tasks.into_iter().for_each(|t| catalog.insert_task(t));
        file.task_models
            .into_iter()
            .for_each(|m| catalog.insert_task_model(m));
        file.questions
            .into_iter()
            .for_each(|q| catalog.insert_question(q));
        file.evidence_models
            .into_iter()
            .for_each(|m| catalog.insert_evidence_model(m));
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&contents)?;
        debug!(
            path = %path.display(),
            tasks = catalog.tasks.len(),
            questions = catalog.questions.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    pub fn insert_task(&mut self, task: Task) {
        self.tasks.insert(task.id.clone(), task);
    }

    pub fn insert_task_model(&mut self, model: TaskModel) {
        self.task_models.insert(model.id.clone(), model);
    }

    pub fn insert_question(&mut self, question: Question) {
        self.questions.insert(question.id.clone(), question);
    }

    pub fn insert_evidence_model(&mut self, model: EvidenceModel) {
        self.evidence_models.insert(model.id.clone(), model);
    }
}

impl Catalog for InMemoryCatalog {
    fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    fn task_model(&self, id: &TaskModelId) -> Option<&TaskModel> {
        self.task_models.get(id)
    }

    fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.get(id)
    }

    fn evidence_model(&self, id: &EvidenceModelId) -> Option<&EvidenceModel> {
        self.evidence_models.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG_JSON: &str = r#"{
        "tasks": [
            { "id": "t1", "taskModelId": "tm1", "questionId": "q1" }
        ],
        "taskModels": [
            {
                "id": "tm1",
                "evidenceModelIds": ["em1", "em-missing"],
                "expectedObservations": [{ "observationId": "o1", "evidenceId": "e1" }]
            }
        ],
        "questions": [
            { "id": "q1", "metadata": { "a": 1.2, "b": "hard", "c": 0.25 } }
        ],
        "evidenceModels": [
            {
                "id": "em1",
                "observations": [
                    { "id": "o1", "constructId": "fractions",
                      "rubric": { "levels": [{ "level": "partial" }] } }
                ],
                "evidences": [{ "id": "e1" }],
                "measurementModel": {
                    "type": "BayesianNetwork",
                    "CPTs": { "o1": { "p1": 0.9 } }
                }
            }
        ]
    }"#;

    #[test]
    fn test_catalog_parses_camel_case_records() {
        let catalog = InMemoryCatalog::from_json_str(CATALOG_JSON).unwrap();
        let task = catalog.task(&TaskId::from("t1")).unwrap();
        assert_eq!(task.task_model_id, TaskModelId::from("tm1"));
        assert_eq!(task.question_id, Some(QuestionId::from("q1")));
    }

    #[test]
    fn test_non_numeric_item_parameter_reads_as_missing() {
        let catalog = InMemoryCatalog::from_json_str(CATALOG_JSON).unwrap();
        let question = catalog.question(&QuestionId::from("q1")).unwrap();
        assert_eq!(question.metadata.a, Some(1.2));
        assert_eq!(question.metadata.b, None);
        assert_eq!(question.metadata.c, Some(0.25));
    }

    #[test]
    fn test_cpt_defaults_fill_missing_side() {
        let catalog = InMemoryCatalog::from_json_str(CATALOG_JSON).unwrap();
        let model = catalog.evidence_model(&EvidenceModelId::from("em1")).unwrap();
        let cpts = model.bayes_net_cpts().unwrap();
        let (p1, p0) = cpts[&ObservationId::from("o1")].resolved();
        assert!((p1 - 0.9).abs() < 1e-12);
        assert!((p0 - Cpt::DEFAULT_GIVEN_UNMASTERED).abs() < 1e-12);
    }

    #[test]
    fn test_other_measurement_models_have_no_cpts() {
        let json = r#"{ "id": "em2", "measurementModel": { "type": "Rubric", "weights": [1, 2] } }"#;
        let model: EvidenceModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.measurement_model, Some(MeasurementModel::Other));
        assert!(model.bayes_net_cpts().is_none());
    }

    #[test]
    fn test_evidence_models_for_skips_dangling_links() {
        let catalog = InMemoryCatalog::from_json_str(CATALOG_JSON).unwrap();
        let task_model = catalog.task_model(&TaskModelId::from("tm1")).unwrap();
        let models = catalog.evidence_models_for(task_model);
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].id, EvidenceModelId::from("em1"));
    }

    #[test]
    fn test_rubric_and_evidence_lookups() {
        let catalog = InMemoryCatalog::from_json_str(CATALOG_JSON).unwrap();
        let model = catalog.evidence_model(&EvidenceModelId::from("em1")).unwrap();
        let obs = model.observation(&ObservationId::from("o1")).unwrap();
        assert!(obs.rubric.as_ref().unwrap().has_level("partial"));
        assert!(!obs.rubric.as_ref().unwrap().has_level("full"));
        assert!(model.has_evidence(&EvidenceId::from("e1")));
        assert!(!model.has_evidence(&EvidenceId::from("e2")));
    }
}
