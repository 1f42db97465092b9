//! Wirebench
//!
//! Model bake-off and scoring service for anomaly detection over tabular
//! wire-transaction datasets.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use database::{PgStore, create_pool, run_migrations};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod commands;

/// Wirebench anomaly-detection bake-off tool
#[derive(Parser)]
#[command(name = "wirebench")]
#[command(about = "Model bake-off and scoring for wire-transaction anomaly detection")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a CSV dataset
    Ingest {
        /// Path to the CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Dataset name (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Ground-truth label column, required for bake-off datasets
        #[arg(short, long)]
        label_column: Option<String>,
    },

    /// Manage model bake-offs
    Bakeoff {
        #[command(subcommand)]
        command: BakeoffCommands,
    },

    /// Score a dataset with a trained model version
    Score {
        /// Dataset to score
        #[arg(short, long)]
        dataset_id: Uuid,

        /// Model version to score with
        #[arg(long)]
        version_id: Uuid,

        /// Fraction of rows to flag for review
        #[arg(short, long, default_value = "0.05")]
        review_rate: f32,

        /// Explicit score threshold (overrides the review rate)
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Number of findings to print
        #[arg(short, long, default_value = "10")]
        preview: usize,

        /// Write the scored CSV to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run database migrations
    Migrate,
}

#[derive(Subcommand)]
enum BakeoffCommands {
    /// Create a bake-off over a labeled dataset
    Start {
        /// Dataset to train on
        #[arg(short, long)]
        dataset_id: Uuid,

        /// Model the versions belong to (defaults to a new id)
        #[arg(short, long)]
        model_id: Option<Uuid>,

        /// Comma-separated algorithms, e.g. "log_reg,random_forest"
        #[arg(short, long)]
        candidates: String,

        /// Fraction of rows to flag for review
        #[arg(short, long, default_value = "0.05")]
        review_rate: f32,

        /// Path to a JSON rubric config (defaults apply when omitted)
        #[arg(long)]
        rubric: Option<PathBuf>,

        /// Train and finalize immediately after creating the bake-off
        #[arg(long)]
        run: bool,
    },

    /// Train all remaining candidates and finalize
    Run {
        #[arg(short, long)]
        id: Uuid,
    },

    /// Train a single candidate by index
    TrainOne {
        #[arg(short, long)]
        id: Uuid,

        #[arg(long)]
        index: usize,
    },

    /// Apply the rubric and crown the champion
    Finalize {
        #[arg(short, long)]
        id: Uuid,
    },

    /// Show a bake-off's state
    Status {
        #[arg(short, long)]
        id: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // --verbose overrides RUST_LOG; otherwise RUST_LOG wins over the default.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let pool = create_pool(&config::CONFIG.database_url).await?;
    let store = PgStore::new(pool.clone());
    let blobs = config::OBJECT_STORE.clone();

    match cli.command {
        Commands::Ingest {
            file,
            name,
            label_column,
        } => {
            commands::ingest::run(&store, &blobs, &file, name, label_column).await?;
        }
        Commands::Bakeoff { command } => match command {
            BakeoffCommands::Start {
                dataset_id,
                model_id,
                candidates,
                review_rate,
                rubric,
                run,
            } => {
                commands::bakeoff::start(
                    &store,
                    &blobs,
                    dataset_id,
                    model_id,
                    &candidates,
                    review_rate,
                    rubric.as_deref(),
                    run,
                )
                .await?;
            }
            BakeoffCommands::Run { id } => {
                commands::bakeoff::run(&store, &blobs, id).await?;
            }
            BakeoffCommands::TrainOne { id, index } => {
                commands::bakeoff::train_one(&store, &blobs, id, index).await?;
            }
            BakeoffCommands::Finalize { id } => {
                commands::bakeoff::finalize(&store, &blobs, id).await?;
            }
            BakeoffCommands::Status { id } => {
                commands::bakeoff::status(&store, id).await?;
            }
        },
        Commands::Score {
            dataset_id,
            version_id,
            review_rate,
            threshold,
            preview,
            output,
        } => {
            commands::score::run(
                &store,
                &blobs,
                dataset_id,
                version_id,
                review_rate,
                threshold,
                preview,
                output.as_deref(),
            )
            .await?;
        }
        Commands::Migrate => {
            run_migrations(&pool).await?;
            info!("Migrations completed successfully");
        }
    }

    Ok(())
}
