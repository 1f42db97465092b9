//! Serializable trained-model artifacts.
//!
//! An artifact is everything scoring needs: the model parameters, the feature
//! schema it was trained on, and per-feature training means used for local
//! explanations. Artifacts serialize to JSON bytes and are stored in the
//! object store next to their `ModelVersion` row.

use serde::{Deserialize, Serialize};

use model_specs::{CoreError, CoreResult, FeatureSchema, FeatureWeight};

pub(crate) fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

/// Standardized logistic-regression model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub feature_names: Vec<String>,
    pub means: Vec<f32>,
    pub stds: Vec<f32>,
    pub weights: Vec<f32>,
    pub bias: f32,
}

impl LinearModel {
    #[must_use]
    pub fn predict(&self, features: &[f32]) -> f32 {
        let mut z = self.bias;
        for i in 0..self.weights.len() {
            let value = features.get(i).copied().unwrap_or(0.0);
            let std = self.stds.get(i).copied().unwrap_or(1.0);
            let mean = self.means.get(i).copied().unwrap_or(0.0);
            z += self.weights[i] * ((value - mean) / std);
        }
        sigmoid(z)
    }
}

/// One node of a binary decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        value: f32,
    },
    Split {
        feature: usize,
        threshold: f32,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    #[must_use]
    pub fn predict(&self, features: &[f32]) -> f32 {
        match self {
            Self::Leaf { value } => *value,
            Self::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                let value = features.get(*feature).copied().unwrap_or(0.0);
                if value <= *threshold {
                    left.predict(features)
                } else {
                    right.predict(features)
                }
            }
        }
    }
}

/// A fitted decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub root: TreeNode,
}

/// How an ensemble's tree outputs become one score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combine {
    /// Mean of tree outputs; trees predict probabilities directly.
    Average,
    /// Additive boosting: `sigmoid(base + shrinkage * sum)`.
    Logit { base: f32, shrinkage: f32 },
}

/// Tree-based model: single tree, bagged forest, or boosted stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub feature_names: Vec<String>,
    pub means: Vec<f32>,
    pub trees: Vec<Tree>,
    pub combine: Combine,
    /// Accumulated split gain per feature, for global importance.
    pub feature_gains: Vec<f32>,
}

impl TreeEnsemble {
    #[must_use]
    pub fn predict(&self, features: &[f32]) -> f32 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.trees.iter().map(|t| t.root.predict(features)).sum();
        match self.combine {
            Combine::Average => (sum / self.trees.len() as f32).clamp(0.0, 1.0),
            Combine::Logit { base, shrinkage } => sigmoid(base + shrinkage * sum),
        }
    }
}

/// The opaque serialized-artifact payload, typed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearModel),
    Trees(TreeEnsemble),
}

impl ModelArtifact {
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        match self {
            Self::Linear(m) => &m.feature_names,
            Self::Trees(m) => &m.feature_names,
        }
    }

    #[must_use]
    pub fn feature_means(&self) -> &[f32] {
        match self {
            Self::Linear(m) => &m.means,
            Self::Trees(m) => &m.means,
        }
    }

    /// The feature columns this model requires from a dataset.
    #[must_use]
    pub fn feature_schema(&self) -> FeatureSchema {
        FeatureSchema {
            features: self.feature_names().to_vec(),
            label_column: None,
        }
    }

    /// Risk score in [0, 1] for one feature vector.
    #[must_use]
    pub fn predict(&self, features: &[f32]) -> f32 {
        match self {
            Self::Linear(m) => m.predict(features),
            Self::Trees(m) => m.predict(features),
        }
    }

    /// Signed per-feature score contributions for one row: how much the score
    /// moves when the feature is replaced by its training mean.
    #[must_use]
    pub fn contributions(&self, features: &[f32]) -> Vec<f32> {
        let baseline = self.predict(features);
        let means = self.feature_means().to_vec();
        (0..self.feature_names().len())
            .map(|i| {
                let mut neutral = features.to_vec();
                if let (Some(slot), Some(mean)) = (neutral.get_mut(i), means.get(i)) {
                    *slot = *mean;
                }
                baseline - self.predict(&neutral)
            })
            .collect()
    }

    /// Global feature importance, sorted by descending magnitude.
    ///
    /// Linear models report signed normalized weights; tree models report
    /// normalized split gains (always non-negative).
    #[must_use]
    pub fn importance(&self) -> Vec<FeatureWeight> {
        let raw: Vec<f32> = match self {
            Self::Linear(m) => m.weights.clone(),
            Self::Trees(m) => m.feature_gains.clone(),
        };
        let total: f32 = raw.iter().map(|w| w.abs()).sum();

        let mut weights: Vec<FeatureWeight> = self
            .feature_names()
            .iter()
            .zip(&raw)
            .map(|(feature, weight)| FeatureWeight {
                feature: feature.clone(),
                weight: if total > 0.0 { weight / total } else { 0.0 },
            })
            .collect();
        weights.sort_by(|a, b| b.weight.abs().total_cmp(&a.weight.abs()));
        weights
    }

    /// Serializes the artifact for blob storage.
    ///
    /// # Errors
    ///
    /// Returns a pipeline error if serialization fails.
    pub fn to_bytes(&self) -> CoreResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| CoreError::Pipeline(format!("failed to serialize model artifact: {e}")))
    }

    /// Deserializes an artifact downloaded from blob storage.
    ///
    /// # Errors
    ///
    /// Returns a pipeline error if the bytes are not a valid artifact.
    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| CoreError::Pipeline(format!("corrupted model artifact: {e}")))
    }
}
