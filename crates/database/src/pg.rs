//! `PostgreSQL` implementation of the [`Store`] contract.
//!
//! Queries are runtime-checked so the workspace builds without a live
//! database; the schema lives in `migrations/`.

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use model_specs::{CoreError, CoreResult, ScoreSummary};

use crate::models::{
    Bakeoff, BakeoffStatus, CreateBakeoff, CreateDataset, CreateFinding, CreateModelVersion,
    CreateRun, Dataset, Finding, ModelVersion, Run,
};
use crate::store::Store;

/// Store backed by a `PostgreSQL` connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl Store for PgStore {
    async fn create_dataset(&self, input: CreateDataset) -> CoreResult<Dataset> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Dataset>(
            r"
            INSERT INTO datasets (id, name, blob_url, source_format, columns, label_column, row_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, blob_url, source_format, columns, label_column, row_count, created_at
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.blob_url)
        .bind(input.source_format.to_string())
        .bind(Json(&input.columns))
        .bind(&input.label_column)
        .bind(input.row_count)
        .fetch_one(&self.pool)
        .await
        .map_err(CoreError::storage)
    }

    async fn get_dataset(&self, id: Uuid) -> CoreResult<Option<Dataset>> {
        sqlx::query_as::<_, Dataset>(
            r"
            SELECT id, name, blob_url, source_format, columns, label_column, row_count, created_at
            FROM datasets
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CoreError::storage)
    }

    async fn create_bakeoff(&self, input: CreateBakeoff) -> CoreResult<Bakeoff> {
        sqlx::query_as::<_, Bakeoff>(
            r"
            INSERT INTO bakeoffs (id, model_id, dataset_id, rubric, status, progress, candidate_version_ids)
            VALUES ($1, $2, $3, $4, 'queued', $5, '[]'::jsonb)
            RETURNING id, model_id, dataset_id, rubric, status, progress, candidate_version_ids,
                      champion_version_id, narrative_short, narrative_long, error, created_at, updated_at
            ",
        )
        .bind(input.id)
        .bind(input.model_id)
        .bind(input.dataset_id)
        .bind(Json(&input.rubric))
        .bind(Json(&input.progress))
        .fetch_one(&self.pool)
        .await
        .map_err(CoreError::storage)
    }

    async fn get_bakeoff(&self, id: Uuid) -> CoreResult<Option<Bakeoff>> {
        sqlx::query_as::<_, Bakeoff>(
            r"
            SELECT id, model_id, dataset_id, rubric, status, progress, candidate_version_ids,
                   champion_version_id, narrative_short, narrative_long, error, created_at, updated_at
            FROM bakeoffs
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CoreError::storage)
    }

    async fn set_bakeoff_status(&self, id: Uuid, status: BakeoffStatus) -> CoreResult<()> {
        sqlx::query(
            r"
            UPDATE bakeoffs
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;

        Ok(())
    }

    async fn append_candidate_version(
        &self,
        id: Uuid,
        version_id: Uuid,
        expected_index: usize,
    ) -> CoreResult<()> {
        // Compare-and-append in one statement: the length predicate and the
        // append cannot interleave with a racing call.
        let result = sqlx::query(
            r"
            UPDATE bakeoffs
            SET candidate_version_ids = candidate_version_ids || $2,
                updated_at = NOW()
            WHERE id = $1 AND jsonb_array_length(candidate_version_ids) = $3
            ",
        )
        .bind(id)
        .bind(Json(vec![version_id]))
        .bind(expected_index as i32)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::conflict(format!(
                "candidate {expected_index} was already recorded for bakeoff {id}"
            )));
        }
        Ok(())
    }

    async fn fail_bakeoff(&self, id: Uuid, error: &str) -> CoreResult<()> {
        sqlx::query(
            r"
            UPDATE bakeoffs
            SET status = 'failed', error = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;

        Ok(())
    }

    async fn complete_bakeoff(
        &self,
        id: Uuid,
        champion_version_id: Uuid,
        narrative_short: &str,
        narrative_long: &str,
    ) -> CoreResult<()> {
        sqlx::query(
            r"
            UPDATE bakeoffs
            SET status = 'completed',
                champion_version_id = $2,
                narrative_short = $3,
                narrative_long = $4,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(champion_version_id)
        .bind(narrative_short)
        .bind(narrative_long)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;

        Ok(())
    }

    async fn create_model_version(&self, input: CreateModelVersion) -> CoreResult<ModelVersion> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, ModelVersion>(
            r"
            INSERT INTO model_versions
                (id, model_id, algorithm, hyperparams, artifact_blob_url, metrics, importance, failed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, model_id, algorithm, hyperparams, artifact_blob_url, metrics, importance,
                      failed, is_champion, created_at
            ",
        )
        .bind(id)
        .bind(input.model_id)
        .bind(input.algorithm.to_string())
        .bind(Json(&input.hyperparams))
        .bind(&input.artifact_blob_url)
        .bind(Json(&input.metrics))
        .bind(Json(&input.importance))
        .bind(input.failed)
        .fetch_one(&self.pool)
        .await
        .map_err(CoreError::storage)
    }

    async fn get_model_version(&self, id: Uuid) -> CoreResult<Option<ModelVersion>> {
        sqlx::query_as::<_, ModelVersion>(
            r"
            SELECT id, model_id, algorithm, hyperparams, artifact_blob_url, metrics, importance,
                   failed, is_champion, created_at
            FROM model_versions
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CoreError::storage)
    }

    async fn list_model_versions(&self, ids: &[Uuid]) -> CoreResult<Vec<ModelVersion>> {
        let rows = sqlx::query_as::<_, ModelVersion>(
            r"
            SELECT id, model_id, algorithm, hyperparams, artifact_blob_url, metrics, importance,
                   failed, is_champion, created_at
            FROM model_versions
            WHERE id = ANY($1)
            ",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(CoreError::storage)?;

        // Callers depend on candidate-index order, not query order.
        let mut ordered = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(row) = rows.iter().find(|v| v.id == *id) {
                ordered.push(row.clone());
            }
        }
        Ok(ordered)
    }

    async fn set_champion(&self, model_id: Uuid, version_id: Uuid) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(CoreError::storage)?;

        sqlx::query(
            r"
            UPDATE model_versions
            SET is_champion = FALSE
            WHERE model_id = $1 AND is_champion
            ",
        )
        .bind(model_id)
        .execute(&mut *tx)
        .await
        .map_err(CoreError::storage)?;

        sqlx::query(
            r"
            UPDATE model_versions
            SET is_champion = TRUE
            WHERE id = $1 AND model_id = $2
            ",
        )
        .bind(version_id)
        .bind(model_id)
        .execute(&mut *tx)
        .await
        .map_err(CoreError::storage)?;

        tx.commit().await.map_err(CoreError::storage)
    }

    async fn create_run(&self, input: CreateRun) -> CoreResult<Run> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Run>(
            r"
            INSERT INTO runs (id, dataset_id, model_version_id, status, review_rate, threshold)
            VALUES ($1, $2, $3, 'created', $4, $5)
            RETURNING id, dataset_id, model_version_id, status, review_rate, threshold,
                      outputs_blob_url, summary, error, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(input.dataset_id)
        .bind(input.model_version_id)
        .bind(input.review_rate)
        .bind(input.threshold)
        .fetch_one(&self.pool)
        .await
        .map_err(CoreError::storage)
    }

    async fn get_run(&self, id: Uuid) -> CoreResult<Option<Run>> {
        sqlx::query_as::<_, Run>(
            r"
            SELECT id, dataset_id, model_version_id, status, review_rate, threshold,
                   outputs_blob_url, summary, error, created_at, updated_at
            FROM runs
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CoreError::storage)
    }

    async fn mark_run_scoring(&self, id: Uuid) -> CoreResult<()> {
        sqlx::query(
            r"
            UPDATE runs
            SET status = 'scoring', updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;

        Ok(())
    }

    async fn complete_run(
        &self,
        id: Uuid,
        outputs_blob_url: &str,
        threshold: f32,
        summary: &ScoreSummary,
    ) -> CoreResult<()> {
        sqlx::query(
            r"
            UPDATE runs
            SET status = 'scored',
                outputs_blob_url = $2,
                threshold = $3,
                summary = $4,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(outputs_blob_url)
        .bind(threshold)
        .bind(Json(summary))
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;

        Ok(())
    }

    async fn fail_run(&self, id: Uuid, error: &str) -> CoreResult<()> {
        sqlx::query(
            r"
            UPDATE runs
            SET status = 'failed', error = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;

        Ok(())
    }

    async fn insert_findings(
        &self,
        run_id: Uuid,
        findings: Vec<CreateFinding>,
    ) -> CoreResult<usize> {
        // One transaction: either every finding lands or none do.
        let mut tx = self.pool.begin().await.map_err(CoreError::storage)?;
        let count = findings.len();

        for finding in findings {
            sqlx::query(
                r"
                INSERT INTO findings
                    (id, run_id, wire_id, rank, score, predicted_label, reason_codes, local_explain_blob_url)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(Uuid::new_v4())
            .bind(run_id)
            .bind(&finding.wire_id)
            .bind(finding.rank)
            .bind(finding.score)
            .bind(finding.predicted_label)
            .bind(Json(&finding.reason_codes))
            .bind(&finding.local_explain_blob_url)
            .execute(&mut *tx)
            .await
            .map_err(CoreError::storage)?;
        }

        tx.commit().await.map_err(CoreError::storage)?;
        Ok(count)
    }

    async fn list_findings(&self, run_id: Uuid) -> CoreResult<Vec<Finding>> {
        sqlx::query_as::<_, Finding>(
            r"
            SELECT id, run_id, wire_id, rank, score, predicted_label, reason_codes,
                   local_explain_blob_url, created_at
            FROM findings
            WHERE run_id = $1
            ORDER BY rank
            ",
        )
        .bind(run_id)
        .fetch_all(&self.pool)
        .await
        .map_err(CoreError::storage)
    }
}
