//! Bake-off commands - create, train, finalize and inspect bake-offs.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use bakeoff::{FinalizeOutcome, Orchestrator, StartBakeoff};
use database::{PgStore, Store};
use model_specs::{Algorithm, CandidateConfig, CoreResult, RubricConfig};
use object_store::ObjectStore;
use strum::IntoEnumIterator;
use uuid::Uuid;

/// Runs the bake-off start command.
///
/// With `--run` the training worker is spawned immediately; its only input is
/// the bake-off id, everything else comes from persistence.
///
/// # Errors
///
/// Returns an error if the candidate list or rubric is invalid, or starting
/// the bake-off fails.
#[expect(clippy::too_many_arguments)]
pub async fn start(
    store: &PgStore,
    blobs: &Arc<dyn ObjectStore>,
    dataset_id: Uuid,
    model_id: Option<Uuid>,
    candidates: &str,
    review_rate: f32,
    rubric: Option<&Path>,
    run_now: bool,
) -> Result<()> {
    let candidates = parse_candidates(candidates)?;
    let rubric = match rubric {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<RubricConfig>(&raw).context("invalid rubric json")?
        }
        None => RubricConfig::default(),
    };
    let model_id = model_id.unwrap_or_else(Uuid::new_v4);

    let orchestrator = Orchestrator::new(store.clone(), blobs.clone());
    let bakeoff = orchestrator
        .start(StartBakeoff {
            model_id,
            dataset_id,
            rubric,
            candidates,
            review_rate,
        })
        .await?;

    println!("Created bake-off {} (model {model_id})", bakeoff.id);

    if run_now {
        let handle = tokio::spawn(worker(store.clone(), blobs.clone(), bakeoff.id));
        let outcome = handle.await.context("training worker panicked")??;
        print_outcome(&outcome);
    } else {
        println!("Run it with: wirebench bakeoff run --id {}", bakeoff.id);
    }

    Ok(())
}

/// The deferred training entry point: trains every remaining candidate and
/// finalizes, reading all state from persistence.
async fn worker(
    store: PgStore,
    blobs: Arc<dyn ObjectStore>,
    bakeoff_id: Uuid,
) -> CoreResult<FinalizeOutcome> {
    Orchestrator::new(store, blobs).run_batch(bakeoff_id).await
}

/// Runs the bake-off run command.
///
/// # Errors
///
/// Returns an error if training or finalization fails.
pub async fn run(store: &PgStore, blobs: &Arc<dyn ObjectStore>, id: Uuid) -> Result<()> {
    let outcome = Orchestrator::new(store.clone(), blobs.clone())
        .run_batch(id)
        .await?;
    print_outcome(&outcome);
    Ok(())
}

/// Runs the train-one command.
///
/// # Errors
///
/// Returns an error if the index is not the next untrained candidate.
pub async fn train_one(
    store: &PgStore,
    blobs: &Arc<dyn ObjectStore>,
    id: Uuid,
    index: usize,
) -> Result<()> {
    let summary = Orchestrator::new(store.clone(), blobs.clone())
        .train_one(id, index)
        .await?;

    if summary.failed {
        println!(
            "Candidate {} ({}) failed training; recorded as version {}",
            summary.candidate_index, summary.algorithm, summary.version_id
        );
    } else {
        let m = summary.metrics;
        println!(
            "Candidate {} ({}) trained as version {}",
            summary.candidate_index, summary.algorithm, summary.version_id
        );
        println!(
            "  recall@rate {:.3}, pr_auc {:.3}, precision@rate {:.3}, stability {:.3}",
            m.recall_at_review_rate, m.pr_auc, m.precision_at_review_rate, m.stability
        );
    }
    Ok(())
}

/// Runs the finalize command.
///
/// # Errors
///
/// Returns an error unless every candidate has been attempted.
pub async fn finalize(store: &PgStore, blobs: &Arc<dyn ObjectStore>, id: Uuid) -> Result<()> {
    let outcome = Orchestrator::new(store.clone(), blobs.clone())
        .finalize(id)
        .await?;
    print_outcome(&outcome);
    Ok(())
}

/// Runs the status command.
///
/// # Errors
///
/// Returns an error if the bake-off does not exist.
pub async fn status(store: &PgStore, id: Uuid) -> Result<()> {
    let bakeoff = store
        .get_bakeoff(id)
        .await?
        .with_context(|| format!("bakeoff {id} not found"))?;

    let total = bakeoff
        .progress
        .as_ref()
        .map_or(0, |p| p.0.candidate_configs.len());
    println!("Bake-off {}", bakeoff.id);
    println!("  status:  {:?}", bakeoff.status);
    println!("  trained: {}/{total}", bakeoff.trained_count());
    if let Some(champion) = bakeoff.champion_version_id {
        println!("  champion: {champion}");
    }
    if let Some(narrative) = &bakeoff.narrative_short {
        println!("  {narrative}");
    }
    if let Some(error) = &bakeoff.error {
        println!("  error: {error}");
    }
    Ok(())
}

fn parse_candidates(raw: &str) -> Result<Vec<CandidateConfig>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| {
            Algorithm::from_str(name)
                .map(CandidateConfig::new)
                .map_err(|_| {
                    let known: Vec<String> =
                        Algorithm::iter().map(|a| a.to_string()).collect();
                    anyhow::anyhow!(
                        "unknown algorithm '{name}'; expected one of: {}",
                        known.join(", ")
                    )
                })
        })
        .collect()
}

fn print_outcome(outcome: &FinalizeOutcome) {
    println!(
        "Champion: {} (version {})",
        outcome.champion_algorithm, outcome.champion_version_id
    );
    println!("{}", outcome.narrative_long);
}
