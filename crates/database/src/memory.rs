//! In-memory implementation of the [`Store`] contract.
//!
//! Used by tests and local development; mirrors the `PostgreSQL` semantics,
//! including the atomic progress append and champion exclusivity.

use std::collections::HashMap;
use std::sync::Mutex;

use sqlx::types::Json;
use sqlx::types::chrono::Utc;
use uuid::Uuid;

use model_specs::{CoreError, CoreResult, ScoreSummary};

use crate::models::{
    Bakeoff, BakeoffStatus, CreateBakeoff, CreateDataset, CreateFinding, CreateModelVersion,
    CreateRun, Dataset, Finding, ModelVersion, Run, RunStatus,
};
use crate::store::Store;

#[derive(Default)]
struct Inner {
    datasets: HashMap<Uuid, Dataset>,
    bakeoffs: HashMap<Uuid, Bakeoff>,
    versions: HashMap<Uuid, ModelVersion>,
    runs: HashMap<Uuid, Run>,
    findings: HashMap<Uuid, Vec<Finding>>,
}

/// Store keeping every entity in process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> CoreResult<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| CoreError::storage("memory store poisoned"))
    }
}

impl Store for MemoryStore {
    async fn create_dataset(&self, input: CreateDataset) -> CoreResult<Dataset> {
        let dataset = Dataset {
            id: Uuid::new_v4(),
            name: input.name,
            blob_url: input.blob_url,
            source_format: input.source_format.to_string(),
            columns: Json(input.columns),
            label_column: input.label_column,
            row_count: input.row_count,
            created_at: Utc::now(),
        };
        self.lock()?.datasets.insert(dataset.id, dataset.clone());
        Ok(dataset)
    }

    async fn get_dataset(&self, id: Uuid) -> CoreResult<Option<Dataset>> {
        Ok(self.lock()?.datasets.get(&id).cloned())
    }

    async fn create_bakeoff(&self, input: CreateBakeoff) -> CoreResult<Bakeoff> {
        let now = Utc::now();
        let bakeoff = Bakeoff {
            id: input.id,
            model_id: input.model_id,
            dataset_id: input.dataset_id,
            rubric: Json(input.rubric),
            status: BakeoffStatus::Queued,
            progress: Some(Json(input.progress)),
            candidate_version_ids: Json(Vec::new()),
            champion_version_id: None,
            narrative_short: None,
            narrative_long: None,
            error: None,
            created_at: now,
            updated_at: now,
        };
        self.lock()?.bakeoffs.insert(bakeoff.id, bakeoff.clone());
        Ok(bakeoff)
    }

    async fn get_bakeoff(&self, id: Uuid) -> CoreResult<Option<Bakeoff>> {
        Ok(self.lock()?.bakeoffs.get(&id).cloned())
    }

    async fn set_bakeoff_status(&self, id: Uuid, status: BakeoffStatus) -> CoreResult<()> {
        let mut inner = self.lock()?;
        let bakeoff = inner
            .bakeoffs
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("bakeoff", id))?;
        bakeoff.status = status;
        bakeoff.updated_at = Utc::now();
        Ok(())
    }

    async fn append_candidate_version(
        &self,
        id: Uuid,
        version_id: Uuid,
        expected_index: usize,
    ) -> CoreResult<()> {
        let mut inner = self.lock()?;
        let bakeoff = inner
            .bakeoffs
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("bakeoff", id))?;
        // Length check under the same lock as the push mirrors the Pg
        // single-statement compare-and-append.
        if bakeoff.candidate_version_ids.0.len() != expected_index {
            return Err(CoreError::conflict(format!(
                "candidate {expected_index} was already recorded for bakeoff {id}"
            )));
        }
        bakeoff.candidate_version_ids.0.push(version_id);
        bakeoff.updated_at = Utc::now();
        Ok(())
    }

    async fn fail_bakeoff(&self, id: Uuid, error: &str) -> CoreResult<()> {
        let mut inner = self.lock()?;
        let bakeoff = inner
            .bakeoffs
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("bakeoff", id))?;
        bakeoff.status = BakeoffStatus::Failed;
        bakeoff.error = Some(error.to_string());
        bakeoff.updated_at = Utc::now();
        Ok(())
    }

    async fn complete_bakeoff(
        &self,
        id: Uuid,
        champion_version_id: Uuid,
        narrative_short: &str,
        narrative_long: &str,
    ) -> CoreResult<()> {
        let mut inner = self.lock()?;
        let bakeoff = inner
            .bakeoffs
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("bakeoff", id))?;
        bakeoff.status = BakeoffStatus::Completed;
        bakeoff.champion_version_id = Some(champion_version_id);
        bakeoff.narrative_short = Some(narrative_short.to_string());
        bakeoff.narrative_long = Some(narrative_long.to_string());
        bakeoff.updated_at = Utc::now();
        Ok(())
    }

    async fn create_model_version(&self, input: CreateModelVersion) -> CoreResult<ModelVersion> {
        let version = ModelVersion {
            id: Uuid::new_v4(),
            model_id: input.model_id,
            algorithm: input.algorithm.to_string(),
            hyperparams: Json(input.hyperparams),
            artifact_blob_url: input.artifact_blob_url,
            metrics: Json(input.metrics),
            importance: Json(input.importance),
            failed: input.failed,
            is_champion: false,
            created_at: Utc::now(),
        };
        self.lock()?.versions.insert(version.id, version.clone());
        Ok(version)
    }

    async fn get_model_version(&self, id: Uuid) -> CoreResult<Option<ModelVersion>> {
        Ok(self.lock()?.versions.get(&id).cloned())
    }

    async fn list_model_versions(&self, ids: &[Uuid]) -> CoreResult<Vec<ModelVersion>> {
        let inner = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| inner.versions.get(id).cloned())
            .collect())
    }

    async fn set_champion(&self, model_id: Uuid, version_id: Uuid) -> CoreResult<()> {
        let mut inner = self.lock()?;
        for version in inner.versions.values_mut() {
            if version.model_id == model_id {
                version.is_champion = version.id == version_id;
            }
        }
        Ok(())
    }

    async fn create_run(&self, input: CreateRun) -> CoreResult<Run> {
        let now = Utc::now();
        let run = Run {
            id: Uuid::new_v4(),
            dataset_id: input.dataset_id,
            model_version_id: input.model_version_id,
            status: RunStatus::Created,
            review_rate: input.review_rate,
            threshold: input.threshold,
            outputs_blob_url: None,
            summary: None,
            error: None,
            created_at: now,
            updated_at: now,
        };
        self.lock()?.runs.insert(run.id, run.clone());
        Ok(run)
    }

    async fn get_run(&self, id: Uuid) -> CoreResult<Option<Run>> {
        Ok(self.lock()?.runs.get(&id).cloned())
    }

    async fn mark_run_scoring(&self, id: Uuid) -> CoreResult<()> {
        let mut inner = self.lock()?;
        let run = inner
            .runs
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("run", id))?;
        run.status = RunStatus::Scoring;
        run.updated_at = Utc::now();
        Ok(())
    }

    async fn complete_run(
        &self,
        id: Uuid,
        outputs_blob_url: &str,
        threshold: f32,
        summary: &ScoreSummary,
    ) -> CoreResult<()> {
        let mut inner = self.lock()?;
        let run = inner
            .runs
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("run", id))?;
        run.status = RunStatus::Scored;
        run.outputs_blob_url = Some(outputs_blob_url.to_string());
        run.threshold = Some(threshold);
        run.summary = Some(Json(summary.clone()));
        run.updated_at = Utc::now();
        Ok(())
    }

    async fn fail_run(&self, id: Uuid, error: &str) -> CoreResult<()> {
        let mut inner = self.lock()?;
        let run = inner
            .runs
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("run", id))?;
        run.status = RunStatus::Failed;
        run.error = Some(error.to_string());
        run.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_findings(
        &self,
        run_id: Uuid,
        findings: Vec<CreateFinding>,
    ) -> CoreResult<usize> {
        let rows: Vec<Finding> = findings
            .into_iter()
            .map(|finding| Finding {
                id: Uuid::new_v4(),
                run_id,
                wire_id: finding.wire_id,
                rank: finding.rank,
                score: finding.score,
                predicted_label: finding.predicted_label,
                reason_codes: Json(finding.reason_codes),
                local_explain_blob_url: finding.local_explain_blob_url,
                created_at: Utc::now(),
            })
            .collect();
        let count = rows.len();
        self.lock()?.findings.insert(run_id, rows);
        Ok(count)
    }

    async fn list_findings(&self, run_id: Uuid) -> CoreResult<Vec<Finding>> {
        Ok(self.lock()?.findings.get(&run_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use model_specs::{
        Algorithm, BakeoffProgress, CandidateConfig, CandidateMetrics, RubricConfig,
    };

    use super::*;

    fn progress() -> BakeoffProgress {
        BakeoffProgress {
            features_blob_url: "bakeoffs/x/features.json".into(),
            candidate_configs: vec![CandidateConfig::new(Algorithm::LogReg)],
            review_rate: 0.05,
            label_column: "is_fraud".into(),
        }
    }

    fn version_input(model_id: Uuid) -> CreateModelVersion {
        CreateModelVersion {
            model_id,
            algorithm: Algorithm::LogReg,
            hyperparams: Default::default(),
            artifact_blob_url: "artifacts/a.json".into(),
            metrics: CandidateMetrics::default(),
            importance: Vec::new(),
            failed: false,
        }
    }

    #[tokio::test]
    async fn test_candidate_version_ids_grow_one_at_a_time() {
        let store = MemoryStore::new();
        let bakeoff = store
            .create_bakeoff(CreateBakeoff {
                id: Uuid::new_v4(),
                model_id: Uuid::new_v4(),
                dataset_id: Uuid::new_v4(),
                rubric: RubricConfig::default(),
                progress: progress(),
            })
            .await
            .expect("create");

        assert_eq!(bakeoff.status, BakeoffStatus::Queued);
        assert_eq!(bakeoff.trained_count(), 0);

        for expected in 1..=3 {
            store
                .append_candidate_version(bakeoff.id, Uuid::new_v4(), expected - 1)
                .await
                .expect("append");
            let fetched = store.get_bakeoff(bakeoff.id).await.expect("get").expect("some");
            assert_eq!(fetched.trained_count(), expected);
        }
    }

    #[tokio::test]
    async fn test_append_candidate_version_rejects_stale_expected_index() {
        let store = MemoryStore::new();
        let bakeoff = store
            .create_bakeoff(CreateBakeoff {
                id: Uuid::new_v4(),
                model_id: Uuid::new_v4(),
                dataset_id: Uuid::new_v4(),
                rubric: RubricConfig::default(),
                progress: progress(),
            })
            .await
            .expect("create");

        let winner = Uuid::new_v4();
        store
            .append_candidate_version(bakeoff.id, winner, 0)
            .await
            .expect("append");

        // A second writer that also observed an empty list loses.
        assert!(matches!(
            store
                .append_candidate_version(bakeoff.id, Uuid::new_v4(), 0)
                .await,
            Err(CoreError::Conflict(_))
        ));
        let fetched = store.get_bakeoff(bakeoff.id).await.expect("get").expect("some");
        assert_eq!(fetched.candidate_version_ids.0, vec![winner]);
    }

    #[tokio::test]
    async fn test_set_champion_is_exclusive() {
        let store = MemoryStore::new();
        let model_id = Uuid::new_v4();
        let first = store
            .create_model_version(version_input(model_id))
            .await
            .expect("create");
        let second = store
            .create_model_version(version_input(model_id))
            .await
            .expect("create");

        store.set_champion(model_id, first.id).await.expect("set");
        store.set_champion(model_id, second.id).await.expect("set");

        let first = store.get_model_version(first.id).await.expect("get").expect("some");
        let second = store.get_model_version(second.id).await.expect("get").expect("some");
        assert!(!first.is_champion);
        assert!(second.is_champion);
    }

    #[tokio::test]
    async fn test_list_model_versions_preserves_id_order() {
        let store = MemoryStore::new();
        let model_id = Uuid::new_v4();
        let a = store.create_model_version(version_input(model_id)).await.expect("create");
        let b = store.create_model_version(version_input(model_id)).await.expect("create");

        let listed = store.list_model_versions(&[b.id, a.id]).await.expect("list");
        let ids: Vec<Uuid> = listed.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }
}
