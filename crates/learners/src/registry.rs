//! Maps each algorithm to its learner implementation.

use model_specs::Algorithm;

use crate::boosted::GradientBoostedLearner;
use crate::forest::{ExtraTreesLearner, RandomForestLearner};
use crate::logistic::LogRegLearner;
use crate::tree::DecisionTreeLearner;
use crate::Learner;

static LOG_REG: LogRegLearner = LogRegLearner;
static DECISION_TREE: DecisionTreeLearner = DecisionTreeLearner;
static RANDOM_FOREST: RandomForestLearner = RandomForestLearner;
static EXTRA_TREES: ExtraTreesLearner = ExtraTreesLearner;
static GRADIENT_BOOSTED: GradientBoostedLearner = GradientBoostedLearner;

#[must_use]
pub fn learner_for(algorithm: Algorithm) -> &'static dyn Learner {
    match algorithm {
        Algorithm::LogReg => &LOG_REG,
        Algorithm::DecisionTree => &DECISION_TREE,
        Algorithm::RandomForest => &RANDOM_FOREST,
        Algorithm::ExtraTrees => &EXTRA_TREES,
        Algorithm::GradientBoosted => &GRADIENT_BOOSTED,
    }
}
