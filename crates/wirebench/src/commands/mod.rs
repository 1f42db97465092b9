//! CLI command implementations.

pub mod bakeoff;
pub mod ingest;
pub mod score;
