//! Bagged tree ensembles: random forest and extremely randomized trees.

use model_specs::{Algorithm, CoreError, CoreResult, Hyperparams};

use crate::artifact::{Combine, ModelArtifact, Tree, TreeEnsemble};
use crate::rng::Lcg;
use crate::tree::{TreeFitConfig, fit_tree};
use crate::{Learner, column_means, param_usize};

/// Bootstrap-sampled forest with sqrt feature subsampling per split.
pub struct RandomForestLearner;

impl Learner for RandomForestLearner {
    fn algorithm(&self) -> Algorithm {
        Algorithm::RandomForest
    }

    fn fit(
        &self,
        x: &[Vec<f32>],
        y: &[f32],
        hyperparams: &Hyperparams,
        feature_names: &[String],
    ) -> CoreResult<ModelArtifact> {
        fit_forest(x, y, hyperparams, feature_names, ForestKind::Bootstrap)
    }
}

/// Extra-trees variant: no bootstrap, one random threshold per feature.
pub struct ExtraTreesLearner;

impl Learner for ExtraTreesLearner {
    fn algorithm(&self) -> Algorithm {
        Algorithm::ExtraTrees
    }

    fn fit(
        &self,
        x: &[Vec<f32>],
        y: &[f32],
        hyperparams: &Hyperparams,
        feature_names: &[String],
    ) -> CoreResult<ModelArtifact> {
        fit_forest(x, y, hyperparams, feature_names, ForestKind::Randomized)
    }
}

enum ForestKind {
    Bootstrap,
    Randomized,
}

fn fit_forest(
    x: &[Vec<f32>],
    y: &[f32],
    hyperparams: &Hyperparams,
    feature_names: &[String],
    kind: ForestKind,
) -> CoreResult<ModelArtifact> {
    if x.is_empty() {
        return Err(CoreError::CandidateTraining(
            "no training rows for forest".into(),
        ));
    }

    let n_trees = param_usize(hyperparams, "n_trees", 30).max(1);
    let feature_count = feature_names.len();
    let subsample = (feature_count as f32).sqrt().ceil() as usize;
    let config = TreeFitConfig {
        max_depth: param_usize(hyperparams, "max_depth", 8),
        min_samples_leaf: param_usize(hyperparams, "min_samples_leaf", 2),
        feature_subsample: Some(subsample.max(1)),
        random_thresholds: matches!(kind, ForestKind::Randomized),
    };

    let mut rng = Lcg::new(29);
    let mut gains = vec![0.0f32; feature_count];
    let all_indices: Vec<usize> = (0..x.len()).collect();

    let trees: Vec<Tree> = (0..n_trees)
        .map(|_| {
            let indices = match kind {
                ForestKind::Bootstrap => (0..x.len()).map(|_| rng.next_below(x.len())).collect(),
                ForestKind::Randomized => all_indices.clone(),
            };
            fit_tree(x, y, &indices, &config, &mut rng, &mut gains)
        })
        .collect();

    Ok(ModelArtifact::Trees(TreeEnsemble {
        feature_names: feature_names.to_vec(),
        means: column_means(x, feature_count),
        trees,
        combine: Combine::Average,
        feature_gains: gains,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (Vec<Vec<f32>>, Vec<f32>) {
        let x: Vec<Vec<f32>> = (0..80)
            .map(|i| vec![i as f32, (i % 9) as f32, (i % 4) as f32])
            .collect();
        let y: Vec<f32> = x.iter().map(|row| f32::from(row[0] > 40.0)).collect();
        (x, y)
    }

    #[test]
    fn test_random_forest_learns_a_step_function() {
        let (x, y) = step_data();
        let names = vec!["amount".to_string(), "a".to_string(), "b".to_string()];
        let artifact = RandomForestLearner
            .fit(&x, &y, &Hyperparams::new(), &names)
            .expect("fit");
        assert!(artifact.predict(&[70.0, 1.0, 1.0]) > 0.7);
        assert!(artifact.predict(&[5.0, 1.0, 1.0]) < 0.3);
    }

    #[test]
    fn test_extra_trees_learns_a_step_function() {
        let (x, y) = step_data();
        let names = vec!["amount".to_string(), "a".to_string(), "b".to_string()];
        let artifact = ExtraTreesLearner
            .fit(&x, &y, &Hyperparams::new(), &names)
            .expect("fit");
        assert!(artifact.predict(&[70.0, 1.0, 1.0]) > 0.6);
        assert!(artifact.predict(&[5.0, 1.0, 1.0]) < 0.4);
    }

    #[test]
    fn test_forest_training_is_deterministic() {
        let (x, y) = step_data();
        let names = vec!["amount".to_string(), "a".to_string(), "b".to_string()];
        let first = RandomForestLearner
            .fit(&x, &y, &Hyperparams::new(), &names)
            .expect("fit")
            .to_bytes()
            .expect("bytes");
        let second = RandomForestLearner
            .fit(&x, &y, &Hyperparams::new(), &names)
            .expect("fit")
            .to_bytes()
            .expect("bytes");
        assert_eq!(first, second);
    }
}
