//! The scoring pipeline: apply a model version, rank findings, explain them.

pub mod explain;
pub mod pipeline;
pub mod threshold;

pub use explain::reason_codes;
pub use pipeline::{ScoreOutcome, ScoreRequest, ScoringPipeline};
pub use threshold::threshold_for_review_rate;
