//! Durable bake-off progress, persisted alongside the bakeoff record.

use serde::{Deserialize, Serialize};

use crate::candidate::CandidateConfig;

/// Side-channel state that lets training resume across independent
/// invocations or process restarts.
///
/// Lives in a dedicated `progress` column, separate from the error column:
/// control-flow state and failure state are never conflated. The order of
/// `candidate_configs` defines candidate indices, the unit of idempotency for
/// `train_one`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakeoffProgress {
    /// Object-store location of the materialized feature matrix.
    pub features_blob_url: String,
    pub candidate_configs: Vec<CandidateConfig>,
    pub review_rate: f32,
    pub label_column: String,
}
