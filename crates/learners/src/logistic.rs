//! Logistic regression trained by full-batch gradient descent on
//! standardized features.

use model_specs::{Algorithm, CoreError, CoreResult, Hyperparams};

use crate::artifact::{LinearModel, ModelArtifact, sigmoid};
use crate::{Learner, column_means, param_f32, param_usize};

pub struct LogRegLearner;

impl Learner for LogRegLearner {
    fn algorithm(&self) -> Algorithm {
        Algorithm::LogReg
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
                "no training rows for logistic regression".into(),
            ));
        }

        let epochs = param_usize(hyperparams, "epochs", 300);
        let learning_rate = param_f32(hyperparams, "learning_rate", 0.3);
        let l2 = param_f32(hyperparams, "l2", 1e-3);

        let feature_count = feature_names.len();
        let n = x.len() as f32;
        let means = column_means(x, feature_count);
        let stds = column_stds(x, &means);

        // Pre-standardize once; the loop only touches the z matrix.
        let z: Vec<Vec<f32>> = x
            .iter()
            .map(|row| {
                (0..feature_count)
                    .map(|i| (row.get(i).copied().unwrap_or(0.0) - means[i]) / stds[i])
                    .collect()
            })
            .collect();

        let mut weights = vec![0.0f32; feature_count];
        let mut bias = 0.0f32;

        for _ in 0..epochs {
            let mut grad_w = vec![0.0f32; feature_count];
            let mut grad_b = 0.0f32;

            for (row, &label) in z.iter().zip(y) {
                let mut logit = bias;
                for i in 0..feature_count {
                    logit += weights[i] * row[i];
                }
                let err = sigmoid(logit) - label;
                for i in 0..feature_count {
                    grad_w[i] += err * row[i];
                }
                grad_b += err;
            }

            for i in 0..feature_count {
                weights[i] -= learning_rate * (grad_w[i] / n + l2 * weights[i]);
            }
            bias -= learning_rate * grad_b / n;
        }

        Ok(ModelArtifact::Linear(LinearModel {
            feature_names: feature_names.to_vec(),
            means,
            stds,
            weights,
            bias,
        }))
    }
}

fn column_stds(x: &[Vec<f32>], means: &[f32]) -> Vec<f32> {
    let n = x.len() as f32;
    means
        .iter()
        .enumerate()
        .map(|(i, mean)| {
            let var = x
                .iter()
                .map(|row| {
                    let d = row.get(i).copied().unwrap_or(0.0) - mean;
                    d * d
                })
                .sum::<f32>()
                / n;
            let std = var.sqrt();
            // Constant columns get unit scale instead of a divide-by-zero.
            if std > 1e-9 { std } else { 1.0 }
        })
        .collect()
}
