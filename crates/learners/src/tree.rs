//! Decision-tree fitting shared by the single-tree, forest and boosted
//! learners.
//!
//! Trees are fitted by variance reduction on the target column, which serves
//! both probability targets (0/1 labels) and boosting residuals.

use model_specs::{Algorithm, CoreError, CoreResult, Hyperparams};

use crate::artifact::{Combine, ModelArtifact, Tree, TreeEnsemble, TreeNode};
use crate::rng::Lcg;
use crate::{Learner, column_means, param_usize};

/// Cap on deterministic candidate thresholds tried per feature.
const MAX_THRESHOLD_CANDIDATES: usize = 10;

/// Variance below which a node is considered pure.
const MIN_VARIANCE: f32 = 1e-7;

pub(crate) struct TreeFitConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Number of features considered per split; `None` means all.
    pub feature_subsample: Option<usize>,
    /// Extra-trees style single random threshold per feature.
    pub random_thresholds: bool,
}

/// Fits one tree over the rows in `indices`, accumulating split gains into
/// `gains`.
pub(crate) fn fit_tree(
    x: &[Vec<f32>],
    targets: &[f32],
    indices: &[usize],
    config: &TreeFitConfig,
    rng: &mut Lcg,
    gains: &mut [f32],
) -> Tree {
    let feature_count = gains.len();
    let root = build_node(x, targets, indices, config, rng, gains, feature_count, 0);
    Tree { root }
}

#[expect(clippy::too_many_arguments)]
fn build_node(
    x: &[Vec<f32>],
    targets: &[f32],
    indices: &[usize],
    config: &TreeFitConfig,
    rng: &mut Lcg,
    gains: &mut [f32],
    feature_count: usize,
    depth: usize,
) -> TreeNode {
    let mean = mean_target(targets, indices);
    if depth >= config.max_depth
        || indices.len() < 2 * config.min_samples_leaf
        || variance(targets, indices, mean) < MIN_VARIANCE
    {
        return TreeNode::Leaf { value: mean };
    }

    let candidates = candidate_features(feature_count, config.feature_subsample, rng);

    let mut best: Option<(usize, f32, f32)> = None;
    for feature in candidates {
        for threshold in candidate_thresholds(x, indices, feature, config.random_thresholds, rng) {
            if let Some(gain) = split_gain(x, targets, indices, feature, threshold, config) {
                if best.is_none_or(|(_, _, g)| gain > g) {
                    best = Some((feature, threshold, gain));
                }
            }
        }
    }

    let Some((feature, threshold, gain)) = best else {
        return TreeNode::Leaf { value: mean };
    };

    if let Some(slot) = gains.get_mut(feature) {
        *slot += gain;
    }

    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&idx| x[idx].get(feature).copied().unwrap_or(0.0) <= threshold);

    let left = build_node(x, targets, &left_indices, config, rng, gains, feature_count, depth + 1);
    let right = build_node(x, targets, &right_indices, config, rng, gains, feature_count, depth + 1);

    TreeNode::Split {
        feature,
        threshold,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn candidate_features(
    feature_count: usize,
    subsample: Option<usize>,
    rng: &mut Lcg,
) -> Vec<usize> {
    match subsample {
        Some(k) if k < feature_count => {
            let mut all: Vec<usize> = (0..feature_count).collect();
            rng.shuffle(&mut all);
            all.truncate(k.max(1));
            all
        }
        _ => (0..feature_count).collect(),
    }
}

fn candidate_thresholds(
    x: &[Vec<f32>],
    indices: &[usize],
    feature: usize,
    random: bool,
    rng: &mut Lcg,
) -> Vec<f32> {
    let mut values: Vec<f32> = indices
        .iter()
        .map(|&idx| x[idx].get(feature).copied().unwrap_or(0.0))
        .collect();
    values.sort_by(f32::total_cmp);
    values.dedup();

    if values.len() < 2 {
        return Vec::new();
    }

    let (min, max) = (values[0], values[values.len() - 1]);
    if random {
        return vec![min + (max - min) * rng.next_f32()];
    }

    // Midpoints of evenly spaced value pairs, capped for wide columns.
    let step = (values.len() / MAX_THRESHOLD_CANDIDATES).max(1);
    values
        .windows(2)
        .step_by(step)
        .map(|pair| (pair[0] + pair[1]) / 2.0)
        .collect()
}

fn split_gain(
    x: &[Vec<f32>],
    targets: &[f32],
    indices: &[usize],
    feature: usize,
    threshold: f32,
    config: &TreeFitConfig,
) -> Option<f32> {
    let mut left: Vec<usize> = Vec::new();
    let mut right: Vec<usize> = Vec::new();
    for &idx in indices {
        if x[idx].get(feature).copied().unwrap_or(0.0) <= threshold {
            left.push(idx);
        } else {
            right.push(idx);
        }
    }

    if left.len() < config.min_samples_leaf || right.len() < config.min_samples_leaf {
        return None;
    }

    let parent_mean = mean_target(targets, indices);
    let parent = variance(targets, indices, parent_mean) * indices.len() as f32;
    let left_mean = mean_target(targets, &left);
    let right_mean = mean_target(targets, &right);
    let children = variance(targets, &left, left_mean) * left.len() as f32
        + variance(targets, &right, right_mean) * right.len() as f32;

    let gain = parent - children;
    (gain > 0.0).then_some(gain)
}

fn mean_target(targets: &[f32], indices: &[usize]) -> f32 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&idx| targets[idx]).sum::<f32>() / indices.len() as f32
}

fn variance(targets: &[f32], indices: &[usize], mean: f32) -> f32 {
    if indices.is_empty() {
        return 0.0;
    }
    indices
        .iter()
        .map(|&idx| {
            let d = targets[idx] - mean;
            d * d
        })
        .sum::<f32>()
        / indices.len() as f32
}

/// Single CART-style decision tree.
pub struct DecisionTreeLearner;

impl Learner for DecisionTreeLearner {
    fn algorithm(&self) -> Algorithm {
        Algorithm::DecisionTree
    }

    fn fit(
        &self,
        x: &[Vec<f32>],
        y: &[f32],
        hyperparams: &Hyperparams,
        feature_names: &[String],
    ) -> CoreResult<ModelArtifact> {
        if x.is_empty() {
            return Err(CoreError::CandidateTraining(
                "no training rows for decision tree".into(),
            ));
        }

        let config = TreeFitConfig {
            max_depth: param_usize(hyperparams, "max_depth", 5),
            min_samples_leaf: param_usize(hyperparams, "min_samples_leaf", 2),
            feature_subsample: None,
            random_thresholds: false,
        };

        let indices: Vec<usize> = (0..x.len()).collect();
        let mut rng = Lcg::new(17);
        let mut gains = vec![0.0; feature_names.len()];
        let tree = fit_tree(x, y, &indices, &config, &mut rng, &mut gains);

        Ok(ModelArtifact::Trees(TreeEnsemble {
            feature_names: feature_names.to_vec(),
            means: column_means(x, feature_names.len()),
            trees: vec![tree],
            combine: Combine::Average,
            feature_gains: gains,
        }))
    }
}
