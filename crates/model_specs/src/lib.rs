//! Shared domain types for the wirebench model bake-off and scoring service.
//!
//! Everything in this crate is plain data: algorithm identifiers, candidate
//! configurations, rubric settings, metric bundles and the error taxonomy
//! used across all other crates.

pub mod algorithm;
pub mod candidate;
pub mod error;
pub mod progress;
pub mod rubric;
pub mod schema;
pub mod summary;

pub use algorithm::Algorithm;
pub use candidate::{CandidateConfig, CandidateMetrics, CandidateResult, FeatureWeight, Hyperparams};
pub use error::{CoreError, CoreResult};
pub use progress::BakeoffProgress;
pub use rubric::{RubricConfig, RubricConstraints, RubricWeights};
pub use schema::{FeatureSchema, SourceFormat};
pub use summary::{Direction, LabelMetrics, ReasonCode, ScoreSummary};
