//! Ingest command - registers a CSV dataset.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use database::{CreateDataset, PgStore, Store};
use model_specs::SourceFormat;
use object_store::ObjectStore;
use object_store::path::Path as ObjectStorePath;
use uuid::Uuid;

/// Runs the ingest command.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid CSV, or the
/// declared label column is absent.
pub async fn run(
    store: &PgStore,
    blobs: &Arc<dyn ObjectStore>,
    file: &Path,
    name: Option<String>,
    label_column: Option<String>,
) -> Result<()> {
    let extension = file.extension().and_then(|e| e.to_str()).unwrap_or("");
    if extension.eq_ignore_ascii_case("xlsx") {
        anyhow::bail!("xlsx files must be converted to csv before ingestion");
    }
    if !extension.eq_ignore_ascii_case("csv") {
        anyhow::bail!("unsupported file type: {}", file.display());
    }

    let bytes = std::fs::read(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let table = dataset::parse(&bytes, SourceFormat::Csv).context("invalid csv file")?;

    if let Some(label) = &label_column {
        if table.column_index(label).is_none() {
            anyhow::bail!("label column '{label}' not present in the file");
        }
    }

    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("dataset.csv");
    let name = name.unwrap_or_else(|| {
        file.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset")
            .to_string()
    });

    let blob_url = format!("datasets/{}/{file_name}", Uuid::new_v4());
    blobs
        .put(&ObjectStorePath::from(blob_url.as_str()), bytes.into())
        .await
        .context("failed to upload dataset")?;

    let dataset = store
        .create_dataset(CreateDataset {
            name,
            blob_url,
            source_format: SourceFormat::Csv,
            columns: table.headers.clone(),
            label_column,
            row_count: table.total_rows() as i64,
        })
        .await?;

    println!("Registered dataset {}", dataset.id);
    println!(
        "  {} rows, {} columns, label column: {}",
        dataset.row_count,
        dataset.columns.0.len(),
        dataset.label_column.as_deref().unwrap_or("(none)")
    );

    Ok(())
}
