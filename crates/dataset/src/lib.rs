//! Dataset materialization: tabular file parsing, schema inference and
//! feature-matrix extraction for training and scoring.

pub mod features;
pub mod table;

pub use features::{FeatureMatrix, extract_matrix, infer_schema};
pub use table::{Table, parse};
