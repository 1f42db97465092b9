//! Candidate model training.
//!
//! Each supported algorithm implements [`Learner`]; [`train_candidate`] wraps
//! a learner with the shared evaluation protocol: a deterministic 75/25
//! train/validation split, precision and recall at the review rate, PR AUC,
//! and a stability score comparing recall across the two splits.

pub mod artifact;
pub mod boosted;
pub mod eval;
pub mod forest;
pub mod logistic;
pub mod registry;
pub mod rng;
pub mod tree;

pub use artifact::{Combine, LinearModel, ModelArtifact, Tree, TreeEnsemble, TreeNode};
pub use boosted::GradientBoostedLearner;
pub use eval::{flagged_count, metrics_at_threshold, pr_auc, precision_recall_at_review_rate};
pub use forest::{ExtraTreesLearner, RandomForestLearner};
pub use logistic::LogRegLearner;
pub use registry::learner_for;
pub use tree::DecisionTreeLearner;

use model_specs::{
    Algorithm, CandidateConfig, CandidateMetrics, CoreError, CoreResult, FeatureWeight,
    Hyperparams,
};

use crate::rng::Lcg;

/// Fits a model artifact from a labeled feature matrix.
pub trait Learner: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    /// Trains on `x`/`y`. `feature_names` fixes both the width of `x` and the
    /// column order the artifact expects at scoring time.
    ///
    /// # Errors
    ///
    /// Returns a training error when the data cannot produce a model.
    fn fit(
        &self,
        x: &[Vec<f32>],
        y: &[f32],
        hyperparams: &Hyperparams,
        feature_names: &[String],
    ) -> CoreResult<ModelArtifact>;
}

/// Everything a finished training attempt hands back to the orchestrator.
#[derive(Debug, Clone)]
pub struct TrainedCandidate {
    pub metrics: CandidateMetrics,
    pub importance: Vec<FeatureWeight>,
    pub artifact: ModelArtifact,
}

/// Seed for the train/validation shuffle; fixed so retries reproduce the
/// same split.
const SPLIT_SEED: u64 = 42;

/// Below this row count the validation split degenerates, so the model is
/// evaluated on its own training data instead.
const MIN_ROWS_FOR_SPLIT: usize = 8;

/// Trains one candidate configuration and evaluates it at `review_rate`.
///
/// # Errors
///
/// Returns a training error for empty or unlabeled data, or when the
/// underlying learner fails.
pub fn train_candidate(
    config: &CandidateConfig,
    x: &[Vec<f32>],
    y: &[f32],
    feature_names: &[String],
    review_rate: f32,
) -> CoreResult<TrainedCandidate> {
    if x.is_empty() || x.len() != y.len() {
        return Err(CoreError::CandidateTraining(format!(
            "candidate {} needs labeled rows ({} rows, {} labels)",
            config.algorithm,
            x.len(),
            y.len()
        )));
    }

    let learner = registry::learner_for(config.algorithm);
    let (train_idx, valid_idx) = split_indices(x.len());

    let train_x: Vec<Vec<f32>> = train_idx.iter().map(|&i| x[i].clone()).collect();
    let train_y: Vec<f32> = train_idx.iter().map(|&i| y[i]).collect();
    let artifact = learner.fit(&train_x, &train_y, &config.hyperparams, feature_names)?;

    let train_scores: Vec<f32> = train_x.iter().map(|row| artifact.predict(row)).collect();
    let (_, train_recall) =
        eval::precision_recall_at_review_rate(&train_scores, &train_y, review_rate);

    // Headline metrics come from held-out rows when there are enough of them.
    let (eval_scores, eval_labels) = if valid_idx.is_empty() {
        (train_scores, train_y)
    } else {
        let valid_y: Vec<f32> = valid_idx.iter().map(|&i| y[i]).collect();
        let valid_scores: Vec<f32> = valid_idx.iter().map(|&i| artifact.predict(&x[i])).collect();
        (valid_scores, valid_y)
    };

    let (precision, recall) =
        eval::precision_recall_at_review_rate(&eval_scores, &eval_labels, review_rate);
    let auc = eval::pr_auc(&eval_scores, &eval_labels);
    let stability = (1.0 - (train_recall - recall).abs()).clamp(0.0, 1.0);

    Ok(TrainedCandidate {
        metrics: CandidateMetrics {
            precision_at_review_rate: precision,
            recall_at_review_rate: recall,
            pr_auc: auc,
            stability,
        },
        importance: artifact.importance(),
        artifact,
    })
}

/// Deterministic 75/25 split. Small datasets train on everything and get an
/// empty validation set.
fn split_indices(row_count: usize) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..row_count).collect();
    if row_count < MIN_ROWS_FOR_SPLIT {
        return (indices, Vec::new());
    }

    Lcg::new(SPLIT_SEED).shuffle(&mut indices);
    let cut = (row_count * 3) / 4;
    let valid = indices.split_off(cut);
    (indices, valid)
}

pub(crate) fn param_usize(hyperparams: &Hyperparams, key: &str, default: usize) -> usize {
    hyperparams
        .get(key)
        .and_then(serde_json::Value::as_u64)
        .map_or(default, |v| v as usize)
}

pub(crate) fn param_f32(hyperparams: &Hyperparams, key: &str, default: f32) -> f32 {
    hyperparams
        .get(key)
        .and_then(serde_json::Value::as_f64)
        .map_or(default, |v| v as f32)
}

pub(crate) fn column_means(x: &[Vec<f32>], feature_count: usize) -> Vec<f32> {
    if x.is_empty() {
        return vec![0.0; feature_count];
    }
    let n = x.len() as f32;
    (0..feature_count)
        .map(|i| x.iter().map(|row| row.get(i).copied().unwrap_or(0.0)).sum::<f32>() / n)
        .collect()
}
