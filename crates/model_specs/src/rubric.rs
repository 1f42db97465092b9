//! Rubric configuration: hard constraints plus weighted scoring.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Weights must sum to 1.0 within this tolerance.
const WEIGHT_SUM_TOLERANCE: f32 = 1e-3;

/// Hard minimums a candidate must meet to stay champion-eligible.
///
/// Unset constraints are not enforced. When every candidate violates some
/// constraint, the rubric falls back to weighted ranking over all non-failed
/// candidates rather than leaving the bake-off without a champion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RubricConstraints {
    #[serde(default)]
    pub min_recall_at_review_rate: Option<f32>,
    #[serde(default)]
    pub min_precision_at_review_rate: Option<f32>,
    #[serde(default)]
    pub min_pr_auc: Option<f32>,
}

/// Non-negative weights over the comparison metrics, summing to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RubricWeights {
    pub recall_at_review_rate: f32,
    pub pr_auc: f32,
    pub precision_at_review_rate: f32,
    pub stability: f32,
    pub explainability: f32,
}

impl Default for RubricWeights {
    fn default() -> Self {
        Self {
            recall_at_review_rate: 0.35,
            pr_auc: 0.25,
            precision_at_review_rate: 0.15,
            stability: 0.15,
            explainability: 0.10,
        }
    }
}

impl RubricWeights {
    fn as_array(self) -> [f32; 5] {
        [
            self.recall_at_review_rate,
            self.pr_auc,
            self.precision_at_review_rate,
            self.stability,
            self.explainability,
        ]
    }
}

/// The full champion-selection configuration for one bake-off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RubricConfig {
    #[serde(default)]
    pub constraints: RubricConstraints,
    #[serde(default)]
    pub weights: RubricWeights,
}

impl RubricConfig {
    /// Checks weight non-negativity and the unit-sum invariant.
    ///
    /// # Errors
    ///
    /// Returns a validation error describing the violated invariant.
    pub fn validate(&self) -> CoreResult<()> {
        let weights = self.weights.as_array();
        if weights.iter().any(|w| *w < 0.0) {
            return Err(CoreError::validation("rubric weights must be non-negative"));
        }
        let sum: f32 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(CoreError::validation(format!(
                "rubric weights must sum to 1.0, got {sum:.4}"
            )));
        }
        Ok(())
    }
}
