//! Score command - applies a model version to a dataset.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use database::PgStore;
use object_store::ObjectStore;
use object_store::path::Path as ObjectStorePath;
use scoring::{ScoreRequest, ScoringPipeline};
use uuid::Uuid;

/// Runs the score command.
///
/// # Errors
///
/// Returns an error if the scoring run fails or the scored CSV cannot be
/// written to `output`.
#[expect(clippy::too_many_arguments)]
pub async fn run(
    store: &PgStore,
    blobs: &Arc<dyn ObjectStore>,
    dataset_id: Uuid,
    version_id: Uuid,
    review_rate: f32,
    threshold: Option<f32>,
    preview: usize,
    output: Option<&Path>,
) -> Result<()> {
    let pipeline = ScoringPipeline::new(store.clone(), blobs.clone());
    let outcome = pipeline
        .run(ScoreRequest {
            dataset_id,
            model_version_id: version_id,
            review_rate,
            threshold,
            preview_limit: Some(preview),
        })
        .await?;

    let summary = &outcome.summary;
    println!("Run {} scored", outcome.run.id);
    println!(
        "  {} of {} rows flagged at threshold {:.4}",
        summary.flagged_count, summary.row_count, summary.threshold_used
    );
    if let Some(labels) = summary.label_metrics {
        println!(
            "  precision {:.3}, recall {:.3}, f1 {:.3}",
            labels.precision, labels.recall, labels.f1
        );
    }

    for finding in &outcome.findings {
        let reasons: Vec<String> = finding
            .reason_codes
            .0
            .iter()
            .map(|r| format!("{} ({:+.3})", r.feature, r.contribution))
            .collect();
        println!(
            "  #{:<3} {} score {:.4}  {}",
            finding.rank,
            finding.wire_id,
            finding.score,
            reasons.join(", ")
        );
    }

    if let Some(path) = output {
        let blob_url = outcome
            .run
            .outputs_blob_url
            .context("run has no scored output")?;
        let result = blobs
            .get(&ObjectStorePath::from(blob_url.as_str()))
            .await
            .context("failed to download scored csv")?;
        let bytes = result.bytes().await.context("failed to download scored csv")?;
        std::fs::write(path, &bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Scored CSV written to {}", path.display());
    }

    Ok(())
}
