//! Scoring-run summaries and finding explanations.

use serde::{Deserialize, Serialize};

/// Whether a feature pushed a row's risk score up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increase,
    Decrease,
}

/// One top-contributing feature attached to a finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasonCode {
    pub feature: String,
    pub direction: Direction,
    /// Signed score contribution relative to the feature's training mean.
    pub contribution: f32,
}

/// Quality metrics computed when the scored dataset carries ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelMetrics {
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
}

/// Aggregate outcome of one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub review_rate: f32,
    pub threshold_used: f32,
    pub flagged_count: usize,
    pub row_count: usize,
    /// Present only when the dataset declares a label column.
    #[serde(default)]
    pub label_metrics: Option<LabelMetrics>,
}
