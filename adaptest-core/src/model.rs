//! Per-session proficiency state.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::types::NodeId;

/// Ability read when no response has moved theta yet.
pub const DEFAULT_THETA: f64 = 0.0;

/// Mastery probability read for a node with no recorded posterior.
pub const DEFAULT_POSTERIOR: f64 = 0.5;

/// Scalar ability estimate plus node-level mastery posteriors.
///
/// Absent values mean "no evidence yet" and are only defaulted on read, so a
/// stored model distinguishes an untouched theta from a theta of zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irt_theta: Option<f64>,
    /// Each value lies strictly inside (0, 1); documents that break this are rejected.
    #[serde(default, deserialize_with = "deserialize_posteriors")]
    pub bn_posteriors: HashMap<NodeId, f64>,
}

fn is_valid_posterior(probability: f64) -> bool {
    probability > 0.0 && probability < 1.0
}

fn deserialize_posteriors<'de, D>(deserializer: D) -> Result<HashMap<NodeId, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let posteriors = HashMap::<NodeId, f64>::deserialize(deserializer)?;
    if let Some((node, &value)) = posteriors.iter().find(|(_, p)| !is_valid_posterior(**p)) {
        let err = ValidationError::InvalidPosterior {
            node: node.clone(),
            value,
        };
        return Err(serde::de::Error::custom(err));
    }
    Ok(posteriors)
}

impl StudentModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current ability, [`DEFAULT_THETA`] if unset.
    pub fn theta(&self) -> f64 {
        self.irt_theta.unwrap_or(DEFAULT_THETA)
    }

    pub fn set_theta(&mut self, theta: f64) {
        self.irt_theta = Some(theta);
    }

    /// Posterior for a node, [`DEFAULT_POSTERIOR`] if unset.
    pub fn posterior(&self, node: &NodeId) -> f64 {
        self.bn_posteriors
            .get(node)
            .copied()
            .unwrap_or(DEFAULT_POSTERIOR)
    }

    /// Record a node posterior, rejecting values outside (0, 1).
    pub fn set_posterior(
        &mut self,
        node: NodeId,
        probability: f64,
    ) -> Result<(), ValidationError> {
        if !is_valid_posterior(probability) {
            return Err(ValidationError::InvalidPosterior {
                node,
                value: probability,
            });
        }
        self.bn_posteriors.insert(node, probability);
        Ok(())
    }
}
