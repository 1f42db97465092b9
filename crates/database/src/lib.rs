//! Persistence for bake-offs, model versions, scoring runs and findings.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub mod memory;
pub mod models;
pub mod pg;
pub mod store;

pub use memory::MemoryStore;
pub use models::{
    Bakeoff, BakeoffStatus, CreateBakeoff, CreateDataset, CreateFinding, CreateModelVersion,
    CreateRun, Dataset, Finding, ModelVersion, Run, RunStatus,
};
pub use pg::PgStore;
pub use store::Store;

/// Creates a connection pool to the `PostgreSQL` database.
///
/// # Errors
///
/// Returns an error if the connection to the database fails.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

/// Runs all pending migrations.
///
/// # Errors
///
/// Returns an error if running migrations fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
