//! Candidate algorithm identifiers.

use serde::{Deserialize, Serialize};

/// The learning algorithms a bake-off candidate can be configured with.
///
/// Each variant has exactly one `Learner` implementation registered in the
/// `learners` crate; the orchestrator never branches on algorithm names.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Algorithm {
    LogReg,
    DecisionTree,
    RandomForest,
    ExtraTrees,
    GradientBoosted,
}

impl Algorithm {
    /// Fixed explainability score in [0, 1] used by the rubric.
    ///
    /// Linear models expose their weights directly; single trees are readable;
    /// ensembles trade transparency for accuracy.
    #[must_use]
    pub const fn explainability(self) -> f32 {
        match self {
            Self::LogReg => 1.0,
            Self::DecisionTree => 0.9,
            Self::RandomForest | Self::ExtraTrees => 0.6,
            Self::GradientBoosted => 0.5,
        }
    }
}
