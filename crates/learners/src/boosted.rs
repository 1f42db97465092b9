//! Gradient-boosted trees on the logistic loss.
//!
//! Each stage fits a shallow regression tree to the residuals
//! `y - sigmoid(f)` of the current additive model; the ensemble combines as
//! `sigmoid(base + shrinkage * sum(tree outputs))`.

use model_specs::{Algorithm, CoreError, CoreResult, Hyperparams};

use crate::artifact::{Combine, ModelArtifact, Tree, TreeEnsemble, sigmoid};
use crate::rng::Lcg;
use crate::tree::{TreeFitConfig, fit_tree};
use crate::{Learner, column_means, param_f32, param_usize};

pub struct GradientBoostedLearner;

impl Learner for GradientBoostedLearner {
    fn algorithm(&self) -> Algorithm {
        Algorithm::GradientBoosted
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
                "no training rows for gradient boosting".into(),
            ));
        }

        let n_trees = param_usize(hyperparams, "n_trees", 40).max(1);
        let shrinkage = param_f32(hyperparams, "shrinkage", 0.1);
        let config = TreeFitConfig {
            max_depth: param_usize(hyperparams, "max_depth", 3),
            min_samples_leaf: param_usize(hyperparams, "min_samples_leaf", 2),
            feature_subsample: None,
            random_thresholds: false,
        };

        // Start from the log-odds of the base rate, clamped away from 0 and 1.
        let mean_y = (y.iter().sum::<f32>() / y.len() as f32).clamp(1e-4, 1.0 - 1e-4);
        let base = (mean_y / (1.0 - mean_y)).ln();

        let feature_count = feature_names.len();
        let indices: Vec<usize> = (0..x.len()).collect();
        let mut rng = Lcg::new(53);
        let mut gains = vec![0.0f32; feature_count];

        let mut logits = vec![base; x.len()];
        let mut residuals = vec![0.0f32; x.len()];
        let mut trees: Vec<Tree> = Vec::with_capacity(n_trees);

        for _ in 0..n_trees {
            for i in 0..x.len() {
                residuals[i] = y[i] - sigmoid(logits[i]);
            }
            let tree = fit_tree(x, &residuals, &indices, &config, &mut rng, &mut gains);
            for (i, row) in x.iter().enumerate() {
                logits[i] += shrinkage * tree.root.predict(row);
            }
            trees.push(tree);
        }

        Ok(ModelArtifact::Trees(TreeEnsemble {
            feature_names: feature_names.to_vec(),
            means: column_means(x, feature_count),
            trees,
            combine: Combine::Logit { base, shrinkage },
            feature_gains: gains,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boosting_learns_a_step_function() {
        let x: Vec<Vec<f32>> = (0..80).map(|i| vec![i as f32, (i % 6) as f32]).collect();
        let y: Vec<f32> = x.iter().map(|row| f32::from(row[0] > 40.0)).collect();
        let names = vec!["amount".to_string(), "noise".to_string()];

        let artifact = GradientBoostedLearner
            .fit(&x, &y, &Hyperparams::new(), &names)
            .expect("fit");

        assert!(artifact.predict(&[70.0, 1.0]) > 0.7);
        assert!(artifact.predict(&[5.0, 1.0]) < 0.3);
    }

    #[test]
    fn test_boosting_handles_single_class_labels() {
        let x: Vec<Vec<f32>> = (0..20).map(|i| vec![i as f32]).collect();
        let y = vec![0.0f32; 20];

        let artifact = GradientBoostedLearner
            .fit(&x, &y, &Hyperparams::new(), &["f".to_string()])
            .expect("fit");
        assert!(artifact.predict(&[10.0]) < 0.1);
    }
}
