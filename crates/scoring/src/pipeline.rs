//! Applies a trained model version to a dataset and persists the results.
//!
//! A run moves `created -> scoring -> scored | failed`. Every validation
//! happens before the run row exists, so a rejected request leaves no
//! partial state behind.

use std::sync::Arc;

use object_store::ObjectStore;
use object_store::path::Path as ObjectStorePath;
use tracing::{info, warn};
use uuid::Uuid;

use database::{CreateFinding, CreateRun, Finding, Run, Store};
use dataset::{FeatureMatrix, Table};
use learners::ModelArtifact;
use model_specs::{CoreError, CoreResult, ScoreSummary};

use crate::explain::reason_codes;
use crate::threshold::threshold_for_review_rate;

/// Request to score one dataset with one model version.
#[derive(Debug, Clone)]
pub struct ScoreRequest {
    pub dataset_id: Uuid,
    pub model_version_id: Uuid,
    pub review_rate: f32,
    /// Explicit score cutoff; derived from the review rate when absent.
    pub threshold: Option<f32>,
    /// Caps the findings returned in the response. Persistence always keeps
    /// every finding.
    pub preview_limit: Option<usize>,
}

/// A completed scoring run with its ranked findings.
#[derive(Debug, Clone)]
pub struct ScoreOutcome {
    pub run: Run,
    pub summary: ScoreSummary,
    pub findings: Vec<Finding>,
}

/// Drives scoring runs against a [`Store`] and a blob store.
pub struct ScoringPipeline<S> {
    store: S,
    blobs: Arc<dyn ObjectStore>,
}

fn outputs_path(run_id: Uuid) -> String {
    format!("runs/{run_id}/scored.csv")
}

impl<S: Store> ScoringPipeline<S> {
    pub fn new(store: S, blobs: Arc<dyn ObjectStore>) -> Self {
        Self { store, blobs }
    }

    /// The underlying store, for read-only inspection.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Scores a dataset with a model version.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown version or dataset; `Validation` for a bad
    /// review rate, a failed version, or a dataset missing model feature
    /// columns — all raised before any run row exists. Errors after the run
    /// is created mark it `failed` and propagate.
    pub async fn run(&self, request: ScoreRequest) -> CoreResult<ScoreOutcome> {
        if !(request.review_rate > 0.0 && request.review_rate <= 1.0) {
            return Err(CoreError::validation(format!(
                "review rate must be in (0, 1], got {}",
                request.review_rate
            )));
        }

        let version = self
            .store
            .get_model_version(request.model_version_id)
            .await?
            .ok_or_else(|| CoreError::not_found("model version", request.model_version_id))?;
        if version.failed {
            return Err(CoreError::validation(format!(
                "model version {} failed training and cannot score",
                version.id
            )));
        }

        let dataset = self
            .store
            .get_dataset(request.dataset_id)
            .await?
            .ok_or_else(|| CoreError::not_found("dataset", request.dataset_id))?;

        let raw = self.get_bytes(&dataset.blob_url).await?;
        let table = dataset::parse(&raw, dataset.source_format()?)?;

        let artifact_bytes = self.get_bytes(&version.artifact_blob_url).await?;
        let artifact = ModelArtifact::from_bytes(&artifact_bytes)?;

        // The dataset must cover the model's schema; labels ride along when
        // the dataset declares them.
        let mut schema = artifact.feature_schema();
        schema.label_column = dataset.label_column.clone();
        let matrix = dataset::extract_matrix(&table, &schema)?;
        if matrix.row_count() == 0 {
            return Err(CoreError::validation("dataset has no rows to score"));
        }

        let run = self
            .store
            .create_run(CreateRun {
                dataset_id: request.dataset_id,
                model_version_id: request.model_version_id,
                review_rate: request.review_rate,
                threshold: request.threshold,
            })
            .await?;
        self.store.mark_run_scoring(run.id).await?;
        info!(run_id = %run.id, rows = matrix.row_count(), "scoring run started");

        match self.score(run.id, &table, &matrix, &artifact, &request).await {
            Ok(summary) => {
                let run = self
                    .store
                    .get_run(run.id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("run", run.id))?;
                let mut findings = self.store.list_findings(run.id).await?;
                if let Some(limit) = request.preview_limit {
                    findings.truncate(limit);
                }
                Ok(ScoreOutcome {
                    run,
                    summary,
                    findings,
                })
            }
            Err(err) => {
                if let Err(store_err) = self.store.fail_run(run.id, &err.to_string()).await {
                    warn!(run_id = %run.id, error = %store_err, "could not mark run failed");
                }
                Err(err)
            }
        }
    }

    async fn score(
        &self,
        run_id: Uuid,
        table: &Table,
        matrix: &FeatureMatrix,
        artifact: &ModelArtifact,
        request: &ScoreRequest,
    ) -> CoreResult<ScoreSummary> {
        let scores: Vec<f32> = matrix.x.iter().map(|row| artifact.predict(row)).collect();
        let threshold_used = request
            .threshold
            .unwrap_or_else(|| threshold_for_review_rate(&scores, request.review_rate));

        // Flagged rows ranked by descending score; equal scores keep original
        // row order so ranks are deterministic.
        let mut flagged: Vec<usize> = (0..scores.len())
            .filter(|&idx| scores[idx] >= threshold_used)
            .collect();
        flagged.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));

        let findings: Vec<CreateFinding> = flagged
            .iter()
            .enumerate()
            .map(|(rank, &idx)| CreateFinding {
                wire_id: matrix.wire_ids[idx].clone(),
                rank: rank as i32 + 1,
                score: scores[idx],
                predicted_label: true,
                reason_codes: reason_codes(artifact, &matrix.x[idx]),
                local_explain_blob_url: None,
            })
            .collect();
        let flagged_count = findings.len();

        let outputs_blob_url = outputs_path(run_id);
        let csv_bytes = scored_csv(table, &scores, threshold_used)?;
        self.put(&outputs_blob_url, csv_bytes).await?;

        let label_metrics = matrix
            .y
            .as_deref()
            .map(|labels| learners::metrics_at_threshold(&scores, labels, threshold_used));

        let summary = ScoreSummary {
            review_rate: request.review_rate,
            threshold_used,
            flagged_count,
            row_count: matrix.row_count(),
            label_metrics,
        };

        self.store.insert_findings(run_id, findings).await?;
        self.store
            .complete_run(run_id, &outputs_blob_url, threshold_used, &summary)
            .await?;

        info!(
            run_id = %run_id,
            flagged = flagged_count,
            threshold = threshold_used,
            "scoring run completed"
        );
        Ok(summary)
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

/// The original table with `score` and `flagged` columns appended, in the
/// original row order.
fn scored_csv(table: &Table, scores: &[f32], threshold: f32) -> CoreResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<String> = table.headers.clone();
    header.push("score".into());
    header.push("flagged".into());
    writer
        .write_record(&header)
        .map_err(|e| CoreError::Pipeline(format!("failed to write scored csv: {e}")))?;

    for (row, score) in table.rows.iter().zip(scores) {
        let mut record: Vec<String> = row.clone();
        record.push(format!("{score:.6}"));
        record.push((*score >= threshold).to_string());
        writer
            .write_record(&record)
            .map_err(|e| CoreError::Pipeline(format!("failed to write scored csv: {e}")))?;
    }

    writer
        .into_inner()
        .map_err(|e| CoreError::Pipeline(format!("failed to flush scored csv: {e}")))
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use database::{CreateDataset, CreateModelVersion, Dataset, MemoryStore, ModelVersion, RunStatus};
    use learners::LinearModel;
    use model_specs::{Algorithm, CandidateMetrics, SourceFormat};
    use object_store::memory::InMemory;

    use super::*;

    fn pipeline() -> ScoringPipeline<MemoryStore> {
        ScoringPipeline::new(MemoryStore::new(), Arc::new(InMemory::new()))
    }

    /// 1000 rows, amounts 0..1000, the top ten amounts labeled anomalous.
    async fn seed_dataset(pipeline: &ScoringPipeline<MemoryStore>) -> Dataset {
        let mut csv = String::from("wire_id,amount,is_fraud\n");
        for i in 0..1000 {
            let _ = writeln!(csv, "w{i},{i},{}", u8::from(i >= 990));
        }
        pipeline
            .put("datasets/wires.csv", csv.into_bytes())
            .await
            .expect("upload");
        pipeline
            .store()
            .create_dataset(CreateDataset {
                name: "wires".into(),
                blob_url: "datasets/wires.csv".into(),
                source_format: SourceFormat::Csv,
                columns: ["wire_id", "amount", "is_fraud"].map(String::from).to_vec(),
                label_column: Some("is_fraud".into()),
                row_count: 1000,
            })
            .await
            .expect("dataset")
    }

    async fn seed_version(
        pipeline: &ScoringPipeline<MemoryStore>,
        feature_names: &[&str],
        failed: bool,
    ) -> ModelVersion {
        let artifact = ModelArtifact::Linear(LinearModel {
            feature_names: feature_names.iter().map(|&s| s.to_string()).collect(),
            means: vec![500.0; feature_names.len()],
            stds: vec![288.0; feature_names.len()],
            weights: vec![1.0; feature_names.len()],
            bias: 0.0,
        });
        pipeline
            .put("artifacts/v.json", artifact.to_bytes().expect("bytes"))
            .await
            .expect("upload");
        pipeline
            .store()
            .create_model_version(CreateModelVersion {
                model_id: Uuid::new_v4(),
                algorithm: Algorithm::LogReg,
                hyperparams: Default::default(),
                artifact_blob_url: "artifacts/v.json".into(),
                metrics: CandidateMetrics::default(),
                importance: Vec::new(),
                failed,
            })
            .await
            .expect("version")
    }

    fn request(dataset_id: Uuid, version_id: Uuid) -> ScoreRequest {
        ScoreRequest {
            dataset_id,
            model_version_id: version_id,
            review_rate: 0.01,
            threshold: None,
            preview_limit: None,
        }
    }

    #[tokio::test]
    async fn test_one_percent_of_a_thousand_rows_yields_ten_ranked_findings() {
        let pipeline = pipeline();
        let dataset = seed_dataset(&pipeline).await;
        let version = seed_version(&pipeline, &["amount"], false).await;

        let outcome = pipeline
            .run(request(dataset.id, version.id))
            .await
            .expect("run");

        assert_eq!(outcome.summary.flagged_count, 10);
        assert_eq!(outcome.summary.row_count, 1000);
        assert_eq!(outcome.findings.len(), 10);
        assert_eq!(outcome.run.status, RunStatus::Scored);

        for (i, finding) in outcome.findings.iter().enumerate() {
            assert_eq!(finding.rank, i as i32 + 1);
        }
        for pair in outcome.findings.windows(2) {
            assert!(pair[0].score > pair[1].score, "ranking must strictly descend");
        }
        // The highest amounts are exactly the labeled anomalies.
        assert_eq!(outcome.findings[0].wire_id, "w999");
        let labels = outcome.summary.label_metrics.expect("labels");
        assert!((labels.precision - 1.0).abs() < 1e-6);
        assert!((labels.recall - 1.0).abs() < 1e-6);

        // Scored CSV landed in the blob store.
        let outputs = outcome.run.outputs_blob_url.expect("outputs url");
        let csv_bytes = pipeline.get_bytes(&outputs).await.expect("csv");
        let text = String::from_utf8(csv_bytes).expect("utf8");
        assert!(text.starts_with("wire_id,amount,is_fraud,score,flagged\n"));
        assert_eq!(text.lines().count(), 1001);
    }

    #[tokio::test]
    async fn test_schema_superset_is_rejected_before_any_run_exists() {
        let pipeline = pipeline();
        let dataset = seed_dataset(&pipeline).await;
        let version = seed_version(&pipeline, &["amount", "beneficiary_risk"], false).await;

        let err = pipeline
            .run(request(dataset.id, version.id))
            .await
            .expect_err("must fail");
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(err.to_string().contains("beneficiary_risk"));
    }

    #[tokio::test]
    async fn test_failed_versions_cannot_score() {
        let pipeline = pipeline();
        let dataset = seed_dataset(&pipeline).await;
        let version = seed_version(&pipeline, &["amount"], true).await;

        assert!(matches!(
            pipeline.run(request(dataset.id, version.id)).await,
            Err(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_preview_limit_truncates_the_response_only() {
        let pipeline = pipeline();
        let dataset = seed_dataset(&pipeline).await;
        let version = seed_version(&pipeline, &["amount"], false).await;

        let mut req = request(dataset.id, version.id);
        req.preview_limit = Some(3);
        let outcome = pipeline.run(req).await.expect("run");

        assert_eq!(outcome.findings.len(), 3);
        assert_eq!(outcome.summary.flagged_count, 10);
        let persisted = pipeline
            .store()
            .list_findings(outcome.run.id)
            .await
            .expect("findings");
        assert_eq!(persisted.len(), 10);
    }

    #[tokio::test]
    async fn test_explicit_threshold_overrides_the_review_rate() {
        let pipeline = pipeline();
        let dataset = seed_dataset(&pipeline).await;
        let version = seed_version(&pipeline, &["amount"], false).await;

        let mut req = request(dataset.id, version.id);
        req.threshold = Some(0.5);
        let outcome = pipeline.run(req).await.expect("run");

        assert!((outcome.summary.threshold_used - 0.5).abs() < f32::EPSILON);
        // amounts above the mean score past 0.5.
        assert_eq!(outcome.summary.flagged_count, 500);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let pipeline = pipeline();
        let dataset = seed_dataset(&pipeline).await;
        let version = seed_version(&pipeline, &["amount"], false).await;

        assert!(matches!(
            pipeline.run(request(dataset.id, Uuid::new_v4())).await,
            Err(CoreError::NotFound(_, _))
        ));
        assert!(matches!(
            pipeline.run(request(Uuid::new_v4(), version.id)).await,
            Err(CoreError::NotFound(_, _))
        ));
    }
}
