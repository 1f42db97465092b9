//! Environment configuration and the shared object store.

use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use anyhow::Context;
use object_store::ObjectStore;
use object_store::local::LocalFileSystem;

/// Returns the base path for the object store.
#[must_use]
pub fn get_base_path() -> PathBuf {
    dotenvy::dotenv().ok();

    std::env::var("WIREBENCH_DATA_PATH")
        .map_or_else(|_| PathBuf::from("./data"), PathBuf::from)
}

/// Global object store instance, lazily initialized.
///
/// Datasets, feature matrices, model artifacts and scored outputs all live
/// under this store, addressed by relative forward-slash paths.
pub static OBJECT_STORE: LazyLock<Arc<dyn ObjectStore>> = LazyLock::new(|| {
    let base_path = get_base_path();

    std::fs::create_dir_all(&base_path).expect("Failed to create object store directory");

    Arc::new(LocalFileSystem::new_with_prefix(&base_path).expect("Failed to create object store"))
});

pub static CONFIG: LazyLock<Config> =
    LazyLock::new(|| Config::from_env().expect("Failed to create config"));

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `DATABASE_URL`: `PostgreSQL` connection string
    ///
    /// Optional environment variables:
    /// - `WIREBENCH_DATA_PATH`: Base directory for blob storage (default: `./data`)
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing.
    fn from_env() -> anyhow::Result<Self> {
        // Load .env file
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL environment variable not set")?;

        Ok(Self { database_url })
    }
}
