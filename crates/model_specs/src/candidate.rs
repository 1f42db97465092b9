//! Candidate configuration and training results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::algorithm::Algorithm;

/// Free-form hyperparameters for one candidate, keyed by name.
///
/// A `BTreeMap` keeps serialized configs byte-stable, which matters because
/// candidate configs are persisted in `BakeoffProgress` and re-read across
/// process restarts.
pub type Hyperparams = BTreeMap<String, serde_json::Value>;

/// One (algorithm, hyperparameters) pair to train within a bake-off.
///
/// Immutable once the bake-off starts; the position in the candidate list
/// defines the candidate index used by the exact-once training guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateConfig {
    pub algorithm: Algorithm,
    #[serde(default)]
    pub hyperparams: Hyperparams,
}

impl CandidateConfig {
    /// A candidate with default hyperparameters for the given algorithm.
    #[must_use]
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            hyperparams: Hyperparams::new(),
        }
    }
}

/// Evaluation metrics for one trained candidate, all in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetrics {
    /// Precision among the rows flagged at the target review rate.
    pub precision_at_review_rate: f32,
    /// Share of true anomalies captured at the target review rate.
    pub recall_at_review_rate: f32,
    /// Area under the precision-recall curve.
    pub pr_auc: f32,
    /// Agreement between train-split and validation-split behavior.
    pub stability: f32,
}

/// A single feature's global contribution to a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub feature: String,
    pub weight: f32,
}

/// The outcome of training one candidate.
///
/// `failed = true` means training errored; metrics are zeroed and the
/// artifact is empty. Failed candidates are kept for reporting but are never
/// eligible for champion selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    pub algorithm: Algorithm,
    pub hyperparams: Hyperparams,
    pub metrics: CandidateMetrics,
    pub importance: Vec<FeatureWeight>,
    /// Serialized model artifact, opaque to everything but the learners crate.
    pub artifact: Vec<u8>,
    pub failed: bool,
}

impl CandidateResult {
    /// A placeholder result for a candidate whose training errored.
    #[must_use]
    pub fn failed(config: &CandidateConfig) -> Self {
        Self {
            algorithm: config.algorithm,
            hyperparams: config.hyperparams.clone(),
            metrics: CandidateMetrics::default(),
            importance: Vec::new(),
            artifact: Vec::new(),
            failed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_is_zeroed() {
        let config = CandidateConfig::new(Algorithm::LogReg);
        let result = CandidateResult::failed(&config);
        assert!(result.failed);
        assert!(result.artifact.is_empty());
        assert!((result.metrics.pr_auc - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_candidate_config_serde_defaults_hyperparams() {
        let config: CandidateConfig =
            serde_json::from_str(r#"{"algorithm": "log_reg"}"#).expect("valid json");
        assert_eq!(config.algorithm, Algorithm::LogReg);
        assert!(config.hyperparams.is_empty());
    }
}
