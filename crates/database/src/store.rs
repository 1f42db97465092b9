//! The persistence contract consumed by the orchestrator and scoring pipeline.

use std::future::Future;

use uuid::Uuid;

use model_specs::{CoreResult, ScoreSummary};

use crate::models::{
    Bakeoff, BakeoffStatus, CreateBakeoff, CreateDataset, CreateFinding, CreateModelVersion,
    CreateRun, Dataset, Finding, ModelVersion, Run,
};

/// CRUD over bake-off, model-version, run and finding records.
///
/// Every write is durable and independently atomic per entity; the only
/// compound mutation is `append_candidate_version`, an atomic
/// compare-and-append keyed by bakeoff id and the expected list length.
/// Callers never hold locks across calls; the in-order guard in the
/// orchestrator plus the conditional append substitute for locking.
///
/// Implemented by [`crate::PgStore`] for production and
/// [`crate::MemoryStore`] for tests and local development.
pub trait Store: Send + Sync {
    fn create_dataset(
        &self,
        input: CreateDataset,
    ) -> impl Future<Output = CoreResult<Dataset>> + Send;

    fn get_dataset(&self, id: Uuid) -> impl Future<Output = CoreResult<Option<Dataset>>> + Send;

    fn create_bakeoff(
        &self,
        input: CreateBakeoff,
    ) -> impl Future<Output = CoreResult<Bakeoff>> + Send;

    fn get_bakeoff(&self, id: Uuid) -> impl Future<Output = CoreResult<Option<Bakeoff>>> + Send;

    fn set_bakeoff_status(
        &self,
        id: Uuid,
        status: BakeoffStatus,
    ) -> impl Future<Output = CoreResult<()>> + Send;

    /// Appends one version id to `candidate_version_ids`, but only while the
    /// list still holds exactly `expected_index` entries; otherwise the call
    /// is a `Conflict` and nothing changes. The length check and the append
    /// are a single atomic statement, so of two racing appends for the same
    /// candidate exactly one wins. Progress is additive only; ids are never
    /// removed.
    fn append_candidate_version(
        &self,
        id: Uuid,
        version_id: Uuid,
        expected_index: usize,
    ) -> impl Future<Output = CoreResult<()>> + Send;

    /// Transitions to `failed` and captures the error message.
    fn fail_bakeoff(&self, id: Uuid, error: &str) -> impl Future<Output = CoreResult<()>> + Send;

    /// Sets the champion, narratives, and transitions to `completed`.
    fn complete_bakeoff(
        &self,
        id: Uuid,
        champion_version_id: Uuid,
        narrative_short: &str,
        narrative_long: &str,
    ) -> impl Future<Output = CoreResult<()>> + Send;

    fn create_model_version(
        &self,
        input: CreateModelVersion,
    ) -> impl Future<Output = CoreResult<ModelVersion>> + Send;

    fn get_model_version(
        &self,
        id: Uuid,
    ) -> impl Future<Output = CoreResult<Option<ModelVersion>>> + Send;

    /// Fetches versions preserving the order of `ids`.
    fn list_model_versions(
        &self,
        ids: &[Uuid],
    ) -> impl Future<Output = CoreResult<Vec<ModelVersion>>> + Send;

    /// Flips `is_champion` to the given version, clearing it on every other
    /// version of the same model. At most one champion per model, always.
    fn set_champion(
        &self,
        model_id: Uuid,
        version_id: Uuid,
    ) -> impl Future<Output = CoreResult<()>> + Send;

    fn create_run(&self, input: CreateRun) -> impl Future<Output = CoreResult<Run>> + Send;

    fn get_run(&self, id: Uuid) -> impl Future<Output = CoreResult<Option<Run>>> + Send;

    fn mark_run_scoring(&self, id: Uuid) -> impl Future<Output = CoreResult<()>> + Send;

    fn complete_run(
        &self,
        id: Uuid,
        outputs_blob_url: &str,
        threshold: f32,
        summary: &ScoreSummary,
    ) -> impl Future<Output = CoreResult<()>> + Send;

    fn fail_run(&self, id: Uuid, error: &str) -> impl Future<Output = CoreResult<()>> + Send;

    /// Inserts all findings for a run as one batch; never partial.
    fn insert_findings(
        &self,
        run_id: Uuid,
        findings: Vec<CreateFinding>,
    ) -> impl Future<Output = CoreResult<usize>> + Send;

    fn list_findings(&self, run_id: Uuid) -> impl Future<Output = CoreResult<Vec<Finding>>> + Send;
}
