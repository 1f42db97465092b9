//! The bake-off state machine.
//!
//! A bake-off moves `queued -> running -> completed | failed`. Training state
//! lives entirely in persistence (`BakeoffProgress` plus the additive
//! `candidate_version_ids` list), so every step can run in a fresh process:
//! `train_one` calls are independently idempotent through the in-order index
//! guard, and `finalize` reconstructs candidate results from stored versions.

use std::sync::Arc;

use object_store::ObjectStore;
use object_store::path::Path as ObjectStorePath;
use tracing::{info, warn};
use uuid::Uuid;

use database::{
    Bakeoff, BakeoffStatus, CreateBakeoff, CreateModelVersion, Store,
};
use dataset::FeatureMatrix;
use model_specs::{
    Algorithm, BakeoffProgress, CandidateConfig, CandidateMetrics, CandidateResult, CoreError,
    CoreResult, RubricConfig,
};

use crate::narrative::{long_narrative, short_narrative};
use crate::rubric::apply_rubric;

/// Request to start a bake-off over one labeled dataset.
#[derive(Debug, Clone)]
pub struct StartBakeoff {
    pub model_id: Uuid,
    pub dataset_id: Uuid,
    pub rubric: RubricConfig,
    pub candidates: Vec<CandidateConfig>,
    pub review_rate: f32,
}

/// Outcome of one `train_one` call.
#[derive(Debug, Clone)]
pub struct CandidateSummary {
    pub candidate_index: usize,
    pub version_id: Uuid,
    pub algorithm: Algorithm,
    pub metrics: CandidateMetrics,
    pub failed: bool,
}

/// Outcome of a completed bake-off.
#[derive(Debug, Clone)]
pub struct FinalizeOutcome {
    pub champion_version_id: Uuid,
    pub champion_algorithm: Algorithm,
    pub narrative_short: String,
    pub narrative_long: String,
    pub constraints_relaxed: bool,
}

/// Drives bake-offs against a [`Store`] and a blob store.
pub struct Orchestrator<S> {
    store: S,
    blobs: Arc<dyn ObjectStore>,
}

fn features_path(bakeoff_id: Uuid) -> String {
    format!("bakeoffs/{bakeoff_id}/features.json")
}

fn artifact_path(bakeoff_id: Uuid, candidate_index: usize) -> String {
    format!("bakeoffs/{bakeoff_id}/artifacts/candidate_{candidate_index}.json")
}

impl<S: Store> Orchestrator<S> {
    pub fn new(store: S, blobs: Arc<dyn ObjectStore>) -> Self {
        Self { store, blobs }
    }

    /// The underlying store, for read-only inspection.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Validates the request, materializes the feature matrix and creates the
    /// bake-off in `queued`. No training happens here.
    ///
    /// # Errors
    ///
    /// `Validation` for a bad review rate, rubric, empty candidate list,
    /// unlabeled dataset or non-numeric data; `NotFound` for an unknown
    /// dataset; `Storage` for blob or database failures.
    pub async fn start(&self, request: StartBakeoff) -> CoreResult<Bakeoff> {
        if !(request.review_rate > 0.0 && request.review_rate <= 1.0) {
            return Err(CoreError::validation(format!(
                "review rate must be in (0, 1], got {}",
                request.review_rate
            )));
        }
        request.rubric.validate()?;
        if request.candidates.is_empty() {
            return Err(CoreError::validation(
                "a bake-off needs at least one candidate",
            ));
        }

        let dataset = self
            .store
            .get_dataset(request.dataset_id)
            .await?
            .ok_or_else(|| CoreError::not_found("dataset", request.dataset_id))?;
        let label_column = dataset.label_column.clone().ok_or_else(|| {
            CoreError::validation("bake-off datasets must declare a label column")
        })?;

        let raw = self.get_bytes(&dataset.blob_url).await?;
        let table = dataset::parse(&raw, dataset.source_format()?)?;
        let schema = dataset::infer_schema(&table, Some(&label_column))?;
        let matrix = dataset::extract_matrix(&table, &schema)?;

        let bakeoff_id = Uuid::new_v4();
        let features_blob_url = features_path(bakeoff_id);
        let features = serde_json::to_vec(&matrix)
            .map_err(|e| CoreError::Pipeline(format!("failed to serialize features: {e}")))?;
        self.put(&features_blob_url, features).await?;

        let bakeoff = self
            .store
            .create_bakeoff(CreateBakeoff {
                id: bakeoff_id,
                model_id: request.model_id,
                dataset_id: request.dataset_id,
                rubric: request.rubric,
                progress: BakeoffProgress {
                    features_blob_url,
                    candidate_configs: request.candidates,
                    review_rate: request.review_rate,
                    label_column,
                },
            })
            .await?;

        info!(
            bakeoff_id = %bakeoff.id,
            dataset_id = %request.dataset_id,
            candidates = bakeoff.progress.as_ref().map_or(0, |p| p.candidate_configs.len()),
            rows = matrix.row_count(),
            "bake-off created"
        );
        Ok(bakeoff)
    }

    /// Trains the candidate at `candidate_index`, exactly once and in order.
    ///
    /// A training failure inside the learner is recorded as a failed version;
    /// the bake-off keeps going. Every call downloads the features blob
    /// fresh, so retried or resumed workers need no local state.
    ///
    /// # Errors
    ///
    /// `Conflict` when the bake-off is terminal, `candidate_index` is not
    /// the next untrained index, or a concurrent call recorded this index
    /// first; `NotFound` for an unknown bake-off.
    pub async fn train_one(
        &self,
        bakeoff_id: Uuid,
        candidate_index: usize,
    ) -> CoreResult<CandidateSummary> {
        let bakeoff = self.require_bakeoff(bakeoff_id).await?;
        if bakeoff.status.is_terminal() {
            return Err(CoreError::conflict(format!(
                "bakeoff {bakeoff_id} is {:?} and accepts no more training",
                bakeoff.status
            )));
        }

        let progress = require_progress(&bakeoff)?;
        let total = progress.candidate_configs.len();
        if candidate_index >= total {
            return Err(CoreError::conflict(format!(
                "candidate index {candidate_index} out of range for {total} candidates"
            )));
        }
        let trained = bakeoff.trained_count();
        if candidate_index != trained {
            return Err(CoreError::conflict(format!(
                "candidate {candidate_index} is not next: {trained} of {total} trained"
            )));
        }

        if bakeoff.status == BakeoffStatus::Queued {
            self.store
                .set_bakeoff_status(bakeoff_id, BakeoffStatus::Running)
                .await?;
        }

        let raw = self.get_bytes(&progress.features_blob_url).await?;
        let matrix: FeatureMatrix = serde_json::from_slice(&raw)
            .map_err(|e| CoreError::Pipeline(format!("corrupted features blob: {e}")))?;
        let y = matrix
            .y
            .as_deref()
            .ok_or_else(|| CoreError::Pipeline("features blob has no labels".into()))?;

        let config = &progress.candidate_configs[candidate_index];
        let version = match learners::train_candidate(
            config,
            &matrix.x,
            y,
            &matrix.feature_names,
            progress.review_rate,
        ) {
            Ok(outcome) => {
                let blob_url = artifact_path(bakeoff_id, candidate_index);
                self.put(&blob_url, outcome.artifact.to_bytes()?).await?;
                self.store
                    .create_model_version(CreateModelVersion {
                        model_id: bakeoff.model_id,
                        algorithm: config.algorithm,
                        hyperparams: config.hyperparams.clone(),
                        artifact_blob_url: blob_url,
                        metrics: outcome.metrics,
                        importance: outcome.importance,
                        failed: false,
                    })
                    .await?
            }
            Err(CoreError::CandidateTraining(message)) => {
                warn!(
                    bakeoff_id = %bakeoff_id,
                    candidate_index,
                    algorithm = %config.algorithm,
                    error = %message,
                    "candidate training failed; recording failed version"
                );
                self.store
                    .create_model_version(CreateModelVersion {
                        model_id: bakeoff.model_id,
                        algorithm: config.algorithm,
                        hyperparams: config.hyperparams.clone(),
                        artifact_blob_url: String::new(),
                        metrics: CandidateMetrics::default(),
                        importance: Vec::new(),
                        failed: true,
                    })
                    .await?
            }
            Err(other) => return Err(other),
        };

        // Conditional on the index so a racing duplicate that slipped past
        // the guard above loses here; its version row stays unreferenced.
        self.store
            .append_candidate_version(bakeoff_id, version.id, candidate_index)
            .await?;

        info!(
            bakeoff_id = %bakeoff_id,
            candidate_index,
            version_id = %version.id,
            algorithm = %config.algorithm,
            failed = version.failed,
            "candidate attempted"
        );
        Ok(CandidateSummary {
            candidate_index,
            version_id: version.id,
            algorithm: config.algorithm,
            metrics: version.metrics.0,
            failed: version.failed,
        })
    }

    /// Applies the rubric over all attempted candidates, crowns the champion
    /// and completes the bake-off.
    ///
    /// The features blob is deleted best-effort afterwards; a blob-store
    /// hiccup there is logged, never fatal. When every candidate failed the
    /// bake-off transitions to `failed` instead and the error is returned.
    ///
    /// # Errors
    ///
    /// `Conflict` unless the bake-off is `running` with every candidate
    /// attempted (state untouched); `NotFound` for an unknown bake-off.
    pub async fn finalize(&self, bakeoff_id: Uuid) -> CoreResult<FinalizeOutcome> {
        let bakeoff = self.require_bakeoff(bakeoff_id).await?;
        if bakeoff.status != BakeoffStatus::Running {
            return Err(CoreError::conflict(format!(
                "bakeoff {bakeoff_id} is {:?}, not running",
                bakeoff.status
            )));
        }

        let progress = require_progress(&bakeoff)?;
        let total = progress.candidate_configs.len();
        let trained = bakeoff.trained_count();
        if trained != total {
            return Err(CoreError::conflict(format!(
                "cannot finalize: {trained} of {total} candidates trained"
            )));
        }

        let versions = self
            .store
            .list_model_versions(&bakeoff.candidate_version_ids.0)
            .await?;
        if versions.len() != total {
            return Err(CoreError::Pipeline(format!(
                "bakeoff {bakeoff_id} references missing model versions"
            )));
        }

        let mut results = Vec::with_capacity(total);
        for version in &versions {
            results.push(CandidateResult {
                algorithm: version.algorithm()?,
                hyperparams: version.hyperparams.0.clone(),
                metrics: version.metrics.0,
                importance: version.importance.0.clone(),
                artifact: Vec::new(),
                failed: version.failed,
            });
        }

        let outcome = match apply_rubric(&results, &bakeoff.rubric.0) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.store.fail_bakeoff(bakeoff_id, &err.to_string()).await?;
                return Err(err);
            }
        };

        let champion_version_id = bakeoff.candidate_version_ids.0[outcome.champion_index];
        let narrative_short = short_narrative(&results, &outcome);
        let narrative_long = long_narrative(&results, &outcome);

        self.store
            .set_champion(bakeoff.model_id, champion_version_id)
            .await?;
        self.store
            .complete_bakeoff(
                bakeoff_id,
                champion_version_id,
                &narrative_short,
                &narrative_long,
            )
            .await?;

        let features = ObjectStorePath::from(progress.features_blob_url.as_str());
        if let Err(err) = self.blobs.delete(&features).await {
            warn!(bakeoff_id = %bakeoff_id, error = %err, "could not delete features blob");
        }

        info!(
            bakeoff_id = %bakeoff_id,
            champion_version_id = %champion_version_id,
            algorithm = %results[outcome.champion_index].algorithm,
            constraints_relaxed = outcome.constraints_relaxed,
            "bake-off completed"
        );
        Ok(FinalizeOutcome {
            champion_version_id,
            champion_algorithm: results[outcome.champion_index].algorithm,
            narrative_short,
            narrative_long,
            constraints_relaxed: outcome.constraints_relaxed,
        })
    }

    /// Trains every remaining candidate in order, then finalizes.
    ///
    /// The background entry point: its only input is the bake-off id, all
    /// remaining state comes from persistence, so it also resumes a bake-off
    /// abandoned mid-training. Any unrecoverable error marks the bake-off
    /// `failed`; version ids already appended are kept.
    ///
    /// # Errors
    ///
    /// `Conflict` for a terminal bake-off; otherwise whatever training or
    /// finalization raised, after the bake-off is marked failed.
    pub async fn run_batch(&self, bakeoff_id: Uuid) -> CoreResult<FinalizeOutcome> {
        let bakeoff = self.require_bakeoff(bakeoff_id).await?;
        if bakeoff.status.is_terminal() {
            return Err(CoreError::conflict(format!(
                "bakeoff {bakeoff_id} is already {:?}",
                bakeoff.status
            )));
        }

        match self.train_remaining_and_finalize(bakeoff_id).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                if let Err(store_err) =
                    self.store.fail_bakeoff(bakeoff_id, &err.to_string()).await
                {
                    warn!(
                        bakeoff_id = %bakeoff_id,
                        error = %store_err,
                        "could not mark bakeoff failed"
                    );
                }
                Err(err)
            }
        }
    }

    async fn train_remaining_and_finalize(&self, bakeoff_id: Uuid) -> CoreResult<FinalizeOutcome> {
        loop {
            let bakeoff = self.require_bakeoff(bakeoff_id).await?;
            let progress = require_progress(&bakeoff)?;
            let next = bakeoff.trained_count();
            if next >= progress.candidate_configs.len() {
                break;
            }
            self.train_one(bakeoff_id, next).await?;
        }
        self.finalize(bakeoff_id).await
    }

    async fn require_bakeoff(&self, bakeoff_id: Uuid) -> CoreResult<Bakeoff> {
        self.store
            .get_bakeoff(bakeoff_id)
            .await?
            .ok_or_else(|| CoreError::not_found("bakeoff", bakeoff_id))
    }

    async fn put(&self, location: &str, data: Vec<u8>) -> CoreResult<()> {
        self.blobs
            .put(&ObjectStorePath::from(location), data.into())
            .await
            .map_err(CoreError::storage)?;
        Ok(())
    }

    async fn get_bytes(&self, location: &str) -> CoreResult<Vec<u8>> {
        let result = self
            .blobs
            .get(&ObjectStorePath::from(location))
            .await
            .map_err(CoreError::storage)?;
        let bytes = result.bytes().await.map_err(CoreError::storage)?;
        Ok(bytes.to_vec())
    }
}

fn require_progress(bakeoff: &Bakeoff) -> CoreResult<BakeoffProgress> {
    bakeoff
        .progress
        .as_ref()
        .map(|p| p.0.clone())
        .ok_or_else(|| {
            CoreError::Pipeline(format!("bakeoff {} has no stored progress", bakeoff.id))
        })
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use database::{CreateDataset, Dataset, MemoryStore};
    use model_specs::SourceFormat;
    use object_store::memory::InMemory;

    use super::*;

    fn blobs() -> Arc<dyn ObjectStore> {
        Arc::new(InMemory::new())
    }

    async fn seed_dataset(orchestrator: &Orchestrator<MemoryStore>, rows: usize) -> Dataset {
        let mut csv = String::from("wire_id,amount,velocity_24h,is_fraud\n");
        for i in 0..rows {
            let amount = i * 100;
            let fraud = u8::from(amount > rows * 50);
            let _ = writeln!(csv, "w{i},{amount},{},{fraud}", i % 7);
        }
        orchestrator
            .put("datasets/test.csv", csv.into_bytes())
            .await
            .expect("upload");
        orchestrator
            .store()
            .create_dataset(CreateDataset {
                name: "test".into(),
                blob_url: "datasets/test.csv".into(),
                source_format: SourceFormat::Csv,
                columns: ["wire_id", "amount", "velocity_24h", "is_fraud"]
                    .map(String::from)
                    .to_vec(),
                label_column: Some("is_fraud".into()),
                row_count: rows as i64,
            })
            .await
            .expect("dataset")
    }

    fn request(dataset_id: Uuid) -> StartBakeoff {
        StartBakeoff {
            model_id: Uuid::new_v4(),
            dataset_id,
            rubric: RubricConfig::default(),
            candidates: vec![
                CandidateConfig::new(Algorithm::LogReg),
                CandidateConfig::new(Algorithm::DecisionTree),
            ],
            review_rate: 0.2,
        }
    }

    #[tokio::test]
    async fn test_start_creates_queued_bakeoff_with_features_blob() {
        let orchestrator = Orchestrator::new(MemoryStore::new(), blobs());
        let dataset = seed_dataset(&orchestrator, 60).await;

        let bakeoff = orchestrator.start(request(dataset.id)).await.expect("start");

        assert_eq!(bakeoff.status, BakeoffStatus::Queued);
        assert_eq!(bakeoff.trained_count(), 0);
        let progress = bakeoff.progress.expect("progress").0;
        assert_eq!(progress.label_column, "is_fraud");
        let features = orchestrator
            .get_bytes(&progress.features_blob_url)
            .await
            .expect("features blob");
        let matrix: FeatureMatrix = serde_json::from_slice(&features).expect("matrix json");
        assert_eq!(matrix.row_count(), 60);
    }

    #[tokio::test]
    async fn test_start_rejects_bad_inputs() {
        let orchestrator = Orchestrator::new(MemoryStore::new(), blobs());
        let dataset = seed_dataset(&orchestrator, 20).await;

        let mut bad_rate = request(dataset.id);
        bad_rate.review_rate = 0.0;
        assert!(matches!(
            orchestrator.start(bad_rate).await,
            Err(CoreError::Validation(_))
        ));

        let mut empty = request(dataset.id);
        empty.candidates.clear();
        assert!(matches!(
            orchestrator.start(empty).await,
            Err(CoreError::Validation(_))
        ));

        assert!(matches!(
            orchestrator.start(request(Uuid::new_v4())).await,
            Err(CoreError::NotFound(_, _))
        ));
    }

    #[tokio::test]
    async fn test_train_one_is_exactly_once_and_in_order() {
        let orchestrator = Orchestrator::new(MemoryStore::new(), blobs());
        let dataset = seed_dataset(&orchestrator, 60).await;
        let bakeoff = orchestrator.start(request(dataset.id)).await.expect("start");

        // Out of order first.
        assert!(matches!(
            orchestrator.train_one(bakeoff.id, 1).await,
            Err(CoreError::Conflict(_))
        ));

        let first = orchestrator.train_one(bakeoff.id, 0).await.expect("train");
        assert_eq!(first.candidate_index, 0);
        assert!(!first.failed);

        let current = orchestrator
            .store()
            .get_bakeoff(bakeoff.id)
            .await
            .expect("get")
            .expect("some");
        assert_eq!(current.status, BakeoffStatus::Running);
        assert_eq!(current.trained_count(), 1);

        // Duplicate call: conflict, no new version id.
        assert!(matches!(
            orchestrator.train_one(bakeoff.id, 0).await,
            Err(CoreError::Conflict(_))
        ));
        let current = orchestrator
            .store()
            .get_bakeoff(bakeoff.id)
            .await
            .expect("get")
            .expect("some");
        assert_eq!(current.trained_count(), 1);
    }

    #[tokio::test]
    async fn test_racing_duplicate_train_one_records_one_version() {
        let orchestrator = Orchestrator::new(MemoryStore::new(), blobs());
        let dataset = seed_dataset(&orchestrator, 60).await;
        let bakeoff = orchestrator.start(request(dataset.id)).await.expect("start");

        // Two workers grab candidate 0 concurrently. Whichever interleaving
        // the scheduler picks, exactly one append lands.
        let (a, b) = tokio::join!(
            orchestrator.train_one(bakeoff.id, 0),
            orchestrator.train_one(bakeoff.id, 0)
        );
        assert!(a.is_ok() != b.is_ok());
        let winner = a.or(b).expect("one winner");

        let current = orchestrator
            .store()
            .get_bakeoff(bakeoff.id)
            .await
            .expect("get")
            .expect("some");
        assert_eq!(current.trained_count(), 1);
        assert_eq!(current.candidate_version_ids.0, vec![winner.version_id]);
    }

    #[tokio::test]
    async fn test_training_failure_records_failed_version_and_bakeoff_continues() {
        let orchestrator = Orchestrator::new(MemoryStore::new(), blobs());
        let dataset = seed_dataset(&orchestrator, 60).await;
        let bakeoff = orchestrator.start(request(dataset.id)).await.expect("start");
        let progress = bakeoff.progress.clone().expect("progress").0;

        // Break the stored features for the first attempt: labels no longer
        // line up with the rows, which the learner rejects.
        let good = orchestrator
            .get_bytes(&progress.features_blob_url)
            .await
            .expect("features");
        let mut matrix: FeatureMatrix = serde_json::from_slice(&good).expect("matrix json");
        matrix.y = Some(vec![0.0]);
        let broken = serde_json::to_vec(&matrix).expect("serialize");
        orchestrator
            .put(&progress.features_blob_url, broken)
            .await
            .expect("upload");

        let first = orchestrator.train_one(bakeoff.id, 0).await.expect("train");
        assert!(first.failed);

        let current = orchestrator
            .store()
            .get_bakeoff(bakeoff.id)
            .await
            .expect("get")
            .expect("some");
        assert_eq!(current.trained_count(), 1);
        assert_eq!(current.candidate_version_ids.0, vec![first.version_id]);
        let version = orchestrator
            .store()
            .get_model_version(first.version_id)
            .await
            .expect("get")
            .expect("some");
        assert!(version.failed);
        assert!(version.artifact_blob_url.is_empty());

        // Restore the blob; the remaining candidate trains and wins.
        orchestrator
            .put(&progress.features_blob_url, good)
            .await
            .expect("restore");
        let outcome = orchestrator.run_batch(bakeoff.id).await.expect("run");

        assert_eq!(outcome.champion_algorithm, Algorithm::DecisionTree);
        assert_ne!(outcome.champion_version_id, first.version_id);
        let current = orchestrator
            .store()
            .get_bakeoff(bakeoff.id)
            .await
            .expect("get")
            .expect("some");
        assert_eq!(current.status, BakeoffStatus::Completed);
        assert_eq!(current.champion_version_id, Some(outcome.champion_version_id));
    }

    #[tokio::test]
    async fn test_finalize_before_all_trained_is_conflict() {
        let orchestrator = Orchestrator::new(MemoryStore::new(), blobs());
        let dataset = seed_dataset(&orchestrator, 60).await;
        let bakeoff = orchestrator.start(request(dataset.id)).await.expect("start");
        orchestrator.train_one(bakeoff.id, 0).await.expect("train");

        assert!(matches!(
            orchestrator.finalize(bakeoff.id).await,
            Err(CoreError::Conflict(_))
        ));
        let current = orchestrator
            .store()
            .get_bakeoff(bakeoff.id)
            .await
            .expect("get")
            .expect("some");
        assert_eq!(current.status, BakeoffStatus::Running);
    }

    #[tokio::test]
    async fn test_run_batch_completes_and_crowns_a_champion() {
        let orchestrator = Orchestrator::new(MemoryStore::new(), blobs());
        let dataset = seed_dataset(&orchestrator, 80).await;
        let bakeoff = orchestrator.start(request(dataset.id)).await.expect("start");

        let outcome = orchestrator.run_batch(bakeoff.id).await.expect("run");

        let current = orchestrator
            .store()
            .get_bakeoff(bakeoff.id)
            .await
            .expect("get")
            .expect("some");
        assert_eq!(current.status, BakeoffStatus::Completed);
        assert_eq!(current.champion_version_id, Some(outcome.champion_version_id));
        assert_eq!(current.trained_count(), 2);
        assert!(current.narrative_short.is_some());
        assert!(current.narrative_long.is_some());

        let champion = orchestrator
            .store()
            .get_model_version(outcome.champion_version_id)
            .await
            .expect("get")
            .expect("some");
        assert!(champion.is_champion);
        assert!(!champion.failed);

        // Champion exclusivity across all attempted versions.
        let versions = orchestrator
            .store()
            .list_model_versions(&current.candidate_version_ids.0)
            .await
            .expect("list");
        assert_eq!(versions.iter().filter(|v| v.is_champion).count(), 1);

        // The features blob was cleaned up.
        let progress = current.progress.expect("progress").0;
        assert!(orchestrator.get_bytes(&progress.features_blob_url).await.is_err());

        // Terminal bake-offs accept no further transitions.
        assert!(matches!(
            orchestrator.train_one(bakeoff.id, 0).await,
            Err(CoreError::Conflict(_))
        ));
        assert!(matches!(
            orchestrator.run_batch(bakeoff.id).await,
            Err(CoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_resumed_run_batch_only_trains_the_remainder() {
        let orchestrator = Orchestrator::new(MemoryStore::new(), blobs());
        let dataset = seed_dataset(&orchestrator, 60).await;
        let bakeoff = orchestrator.start(request(dataset.id)).await.expect("start");

        let first = orchestrator.train_one(bakeoff.id, 0).await.expect("train");
        orchestrator.run_batch(bakeoff.id).await.expect("resume");

        let current = orchestrator
            .store()
            .get_bakeoff(bakeoff.id)
            .await
            .expect("get")
            .expect("some");
        assert_eq!(current.trained_count(), 2);
        assert_eq!(current.candidate_version_ids.0[0], first.version_id);
    }
}
