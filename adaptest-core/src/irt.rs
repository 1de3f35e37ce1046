//! Online ability estimation under the three-parameter logistic model.
//!
//! One response moves theta by a single stochastic-gradient step:
//!
//! ```text
//! P(y = 1 | θ) = c + (1 - c) / (1 + exp(-a(θ - b)))
//! θ' = θ + η · a · (y - P) · (1 - c)
//! ```
//!
//! Theta is not clamped; a long run of consistent responses drifts it without
//! bound. Full calibration happens outside this crate.

use crate::catalog::ItemParameters;

/// Step size of the theta update.
pub const LEARNING_RATE: f64 = 0.1;

/// Discrimination used when an item does not carry one.
pub const DEFAULT_DISCRIMINATION: f64 = 1.0;

/// Guessing floor used when an item does not carry one.
pub const DEFAULT_GUESSING: f64 = 0.0;

/// Item parameters with defaults applied; only items with a numeric
/// difficulty resolve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IrtItem {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl IrtItem {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// Resolve stored parameters. `None` when `b` is missing or not finite.
    pub fn from_parameters(params: &ItemParameters) -> Option<Self> {
        let b = params.b.filter(|b| b.is_finite())?;
        Some(Self {
            a: params.a.unwrap_or(DEFAULT_DISCRIMINATION),
            b,
            c: params.c.unwrap_or(DEFAULT_GUESSING),
        })
    }

    /// Probability of a correct response at ability `theta`.
    pub fn probability(&self, theta: f64) -> f64 {
        self.c + (1.0 - self.c) / (1.0 + (-self.a * (theta - self.b)).exp())
    }

    /// Theta after observing `correct` on this item.
    pub fn update(&self, theta: f64, correct: bool) -> f64 {
        let y = if correct { 1.0 } else { 0.0 };
        let p = self.probability(theta);
        let gradient = self.a * (y - p) * (1.0 - self.c);
        theta + LEARNING_RATE * gradient
    }
}
