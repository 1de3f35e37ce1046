//! Expected information gain over Bayesian-network evidence models.
//!
//! Each observation node of a linked Bayesian-network evidence model is
//! treated as a single-parent network: the node's mastery posterior is the
//! prior, its CPT gives the likelihood of a positive observation, and one
//! Bayes step yields the posterior for each outcome. The gain of a node is
//! the drop from prior entropy to the mean of the two outcome entropies.
//!
//! The outcomes are weighted 1/2 each rather than by their marginal
//! likelihood. Stored scores depend on this weighting, so it stays.

use tracing::debug;

use crate::catalog::{Catalog, Cpt, EvidenceModel, Task};
use crate::entropy::binary_entropy;
use crate::model::StudentModel;
use crate::types::NodeId;

/// Weight given to each observation outcome in the expected entropy.
const OUTCOME_WEIGHT: f64 = 0.5;

/// P(node = 1 | observed = 1). Falls back to `prior` on a zero denominator.
pub fn posterior_given_positive(prior: f64, p1: f64, p0: f64) -> f64 {
    let denominator = p1 * prior + p0 * (1.0 - prior);
    if denominator == 0.0 {
        return prior;
    }
    p1 * prior / denominator
}

/// P(node = 1 | observed = 0). Falls back to `prior` on a zero denominator.
pub fn posterior_given_negative(prior: f64, p1: f64, p0: f64) -> f64 {
    let denominator = (1.0 - p1) * prior + (1.0 - p0) * (1.0 - prior);
    if denominator == 0.0 {
        return prior;
    }
    (1.0 - p1) * prior / denominator
}

/// Entropy reduction expected from observing one node.
pub fn node_gain(prior: f64, cpt: &Cpt) -> f64 {
    let (p1, p0) = cpt.resolved();
    let h_prior = binary_entropy(prior);
    let post_positive = posterior_given_positive(prior, p1, p0);
    let post_negative = posterior_given_negative(prior, p1, p0);
    let h_expected = OUTCOME_WEIGHT * binary_entropy(post_positive)
        + OUTCOME_WEIGHT * binary_entropy(post_negative);
    h_prior - h_expected
}

/// Gain contributed by one node of a task's evidence.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeContribution {
    pub node: NodeId,
    pub prior: f64,
    pub gain: f64,
}

/// Per-node gains of one evidence model; empty unless it is a Bayesian network.
///
/// Nodes without a CPT are skipped.
pub fn evidence_model_contributions(
    evidence_model: &EvidenceModel,
    student: &StudentModel,
) -> Vec<NodeContribution> {
    let Some(cpts) = evidence_model.bayes_net_cpts() else {
        return Vec::new();
    };

    evidence_model
        .observations
        .iter()
        .filter_map(|observation| {
            let node = &observation.id;
            let Some(cpt) = cpts.get(node) else {
                debug!(
                    evidence_model_id = %evidence_model.id,
                    node = %node,
                    "No CPT for node, skipping"
                );
                return None;
            };
            let prior = student.posterior(node);
            Some(NodeContribution {
                node: node.clone(),
                prior,
                gain: node_gain(prior, cpt),
            })
        })
        .collect()
}

/// Total expected information gain from administering `task`.
///
/// Sums node gains over every Bayesian-network evidence model linked to the
/// task's model. `None` when the task model cannot be resolved.
pub fn expected_gain(task: &Task, student: &StudentModel, catalog: &dyn Catalog) -> Option<f64> {
    let Some(task_model) = catalog.task_model(&task.task_model_id) else {
        debug!(
            task_id = %task.id,
            task_model_id = %task.task_model_id,
            "Task model missing, skipping"
        );
        return None;
    };

    let gain = catalog
        .evidence_models_for(task_model)
        .into_iter()
        .flat_map(|em| evidence_model_contributions(em, student))
        .map(|c| c.gain)
        .sum();
    Some(gain)
}
