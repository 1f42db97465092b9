//! Database model types.

use std::str::FromStr;

use sqlx::types::Json;
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use model_specs::{
    Algorithm, BakeoffProgress, CandidateMetrics, CoreError, CoreResult, FeatureWeight,
    Hyperparams, ReasonCode, RubricConfig, ScoreSummary, SourceFormat,
};

/// Bake-off lifecycle status matching the `PostgreSQL` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "bakeoff_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BakeoffStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl BakeoffStatus {
    /// `completed` and `failed` accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Scoring-run lifecycle status matching the `PostgreSQL` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "run_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Created,
    Scoring,
    Scored,
    Failed,
}

/// A registered dataset and where its raw bytes live.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Dataset {
    pub id: Uuid,
    pub name: String,
    pub blob_url: String,
    pub source_format: String,
    pub columns: Json<Vec<String>>,
    pub label_column: Option<String>,
    pub row_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Dataset {
    /// Parses the stored source format.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the stored value is unknown.
    pub fn source_format(&self) -> CoreResult<SourceFormat> {
        SourceFormat::from_str(&self.source_format).map_err(|_| {
            CoreError::validation(format!("unknown source format: {}", self.source_format))
        })
    }
}

/// A bake-off record: lifecycle state plus additive training progress.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Bakeoff {
    pub id: Uuid,
    pub model_id: Uuid,
    pub dataset_id: Uuid,
    pub rubric: Json<RubricConfig>,
    pub status: BakeoffStatus,
    /// Durable side-channel state; dedicated column, never stored in `error`.
    pub progress: Option<Json<BakeoffProgress>>,
    /// Grows by exactly one id per attempted candidate, in candidate order.
    pub candidate_version_ids: Json<Vec<Uuid>>,
    pub champion_version_id: Option<Uuid>,
    pub narrative_short: Option<String>,
    pub narrative_long: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bakeoff {
    /// Number of candidates already attempted.
    #[must_use]
    pub fn trained_count(&self) -> usize {
        self.candidate_version_ids.0.len()
    }
}

/// One trained (or failed) candidate, persisted per bake-off attempt.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ModelVersion {
    pub id: Uuid,
    pub model_id: Uuid,
    pub algorithm: String,
    pub hyperparams: Json<Hyperparams>,
    pub artifact_blob_url: String,
    pub metrics: Json<CandidateMetrics>,
    pub importance: Json<Vec<FeatureWeight>>,
    pub failed: bool,
    pub is_champion: bool,
    pub created_at: DateTime<Utc>,
}

impl ModelVersion {
    /// Parses the stored algorithm name.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the stored value is unknown.
    pub fn algorithm(&self) -> CoreResult<Algorithm> {
        Algorithm::from_str(&self.algorithm)
            .map_err(|_| CoreError::validation(format!("unknown algorithm: {}", self.algorithm)))
    }
}

/// One scoring run of a model version against a dataset.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Run {
    pub id: Uuid,
    pub dataset_id: Uuid,
    pub model_version_id: Uuid,
    pub status: RunStatus,
    pub review_rate: f32,
    pub threshold: Option<f32>,
    pub outputs_blob_url: Option<String>,
    pub summary: Option<Json<ScoreSummary>>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One flagged row from a scoring run. Rank 1 is the highest risk.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Finding {
    pub id: Uuid,
    pub run_id: Uuid,
    pub wire_id: String,
    pub rank: i32,
    pub score: f32,
    pub predicted_label: bool,
    pub reason_codes: Json<Vec<ReasonCode>>,
    pub local_explain_blob_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a dataset.
#[derive(Debug, Clone)]
pub struct CreateDataset {
    pub name: String,
    pub blob_url: String,
    pub source_format: SourceFormat,
    pub columns: Vec<String>,
    pub label_column: Option<String>,
    pub row_count: i64,
}

/// Input for creating a bake-off in `queued`.
///
/// The caller supplies the id: the features blob is uploaded under the
/// bake-off id before the row exists.
#[derive(Debug, Clone)]
pub struct CreateBakeoff {
    pub id: Uuid,
    pub model_id: Uuid,
    pub dataset_id: Uuid,
    pub rubric: RubricConfig,
    pub progress: BakeoffProgress,
}

/// Input for persisting one attempted candidate.
#[derive(Debug, Clone)]
pub struct CreateModelVersion {
    pub model_id: Uuid,
    pub algorithm: Algorithm,
    pub hyperparams: Hyperparams,
    pub artifact_blob_url: String,
    pub metrics: CandidateMetrics,
    pub importance: Vec<FeatureWeight>,
    pub failed: bool,
}

/// Input for creating a scoring run in `created`.
#[derive(Debug, Clone)]
pub struct CreateRun {
    pub dataset_id: Uuid,
    pub model_version_id: Uuid,
    pub review_rate: f32,
    pub threshold: Option<f32>,
}

/// Input for one finding row; findings for a run are inserted as one batch.
#[derive(Debug, Clone)]
pub struct CreateFinding {
    pub wire_id: String,
    pub rank: i32,
    pub score: f32,
    pub predicted_label: bool,
    pub reason_codes: Vec<ReasonCode>,
    pub local_explain_blob_url: Option<String>,
}
