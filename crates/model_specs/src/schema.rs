//! Dataset source formats and feature schemas.

use serde::{Deserialize, Serialize};

/// File format a dataset was ingested from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceFormat {
    Csv,
    /// Recorded for provenance; XLSX files are converted to CSV upstream
    /// before ingestion, so the core never parses this format.
    Xlsx,
}

/// The feature columns a model was trained on, plus the optional label.
///
/// Persisted inside every model artifact so that scoring can reject datasets
/// whose columns do not cover the model's inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub features: Vec<String>,
    #[serde(default)]
    pub label_column: Option<String>,
}

impl FeatureSchema {
    /// Features declared by the schema but absent from `headers`.
    #[must_use]
    pub fn missing_columns(&self, headers: &[String]) -> Vec<String> {
        self.features
            .iter()
            .filter(|feature| !headers.contains(feature))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns() {
        let schema = FeatureSchema {
            features: vec!["amount".into(), "velocity_24h".into()],
            label_column: Some("is_fraud".into()),
        };
        let headers = vec!["wire_id".into(), "amount".into()];
        assert_eq!(schema.missing_columns(&headers), vec!["velocity_24h".to_string()]);
        assert!(schema.missing_columns(&["amount".into(), "velocity_24h".into()]).is_empty());
    }

    #[test]
    fn test_source_format_parses() {
        use std::str::FromStr;
        assert_eq!(SourceFormat::from_str("csv").ok(), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::Csv.to_string(), "csv");
    }
}
