//! Per-finding reason codes from a model's local explanation.

use learners::ModelArtifact;
use model_specs::{Direction, ReasonCode};

/// Reason codes carry at most this many features.
pub const MAX_REASON_CODES: usize = 3;

/// The top contributing features for one scored row, by contribution
/// magnitude. Features with no effect on the score are omitted.
#[must_use]
pub fn reason_codes(artifact: &ModelArtifact, features: &[f32]) -> Vec<ReasonCode> {
    let contributions = artifact.contributions(features);

    let mut codes: Vec<ReasonCode> = artifact
        .feature_names()
        .iter()
        .zip(&contributions)
        .filter(|(_, &c)| c.abs() > f32::EPSILON)
        .map(|(feature, &contribution)| ReasonCode {
            feature: feature.clone(),
            direction: if contribution > 0.0 {
                Direction::Increase
            } else {
                Direction::Decrease
            },
            contribution,
        })
        .collect();

    codes.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));
    codes.truncate(MAX_REASON_CODES);
    codes
}
