use std::fmt;

use brickevo_engine::{Action, FEATURE_COUNT, Observation};
use serde::{Deserialize, Serialize};

/// Linear control policy with a dead-zone.
///
/// The policy computes `y = Σ weights[i] × observation[i]`. When `|y|` does not exceed
/// `dead_zone` the paddle stays; otherwise it moves in the direction of the sign of `y`.
///
/// A `Policy` is also the genotype evolved by the genetic algorithm. It is never
/// modified in place: genetic operators always build new policies.
///
/// # Example
///
/// ```
/// use brickevo_engine::{Action, Observation};
/// use brickevo_evaluator::policy::Policy;
///
/// // Only looks at the horizontal offset between ball and paddle.
/// let policy = Policy::new([0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0], 0.1);
///
/// let mut obs = Observation([0.0; 8]);
/// obs.0[5] = 0.5;
/// assert_eq!(policy.act(&obs), Action::Right);
/// obs.0[5] = -0.05;
/// assert_eq!(policy.act(&obs), Action::Stay);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    weights: [f64; FEATURE_COUNT],
    dead_zone: f64,
}

impl Policy {
    #[must_use]
    pub const fn new(weights: [f64; FEATURE_COUNT], dead_zone: f64) -> Self {
        Self { weights, dead_zone }
    }

    /// One weight per observation feature, in feature order.
    #[must_use]
    pub const fn weights(&self) -> &[f64; FEATURE_COUNT] {
        &self.weights
    }

    #[must_use]
    pub const fn dead_zone(&self) -> f64 {
        self.dead_zone
    }

    /// Weighted sum of the observation features.
    #[must_use]
    pub fn score(&self, observation: &Observation) -> f64 {
        self.weights
            .iter()
            .zip(observation.values())
            .map(|(w, x)| w * x)
            .sum()
    }

    #[must_use]
    pub fn act(&self, observation: &Observation) -> Action {
        let y = self.score(observation);
        if y.abs() <= self.dead_zone {
            Action::Stay
        } else {
            Action::from_sign(y)
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w=[")?;
        for (i, w) in self.weights.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{w:+.3}")?;
        }
        write!(f, "] dz={:.3}", self.dead_zone)
    }
}
