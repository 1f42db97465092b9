//! Feature-matrix extraction from parsed tables.

use serde::{Deserialize, Serialize};

use model_specs::{CoreError, CoreResult, FeatureSchema};

use crate::table::Table;

/// Column used as the row identifier when present.
pub const WIRE_ID_COLUMN: &str = "wire_id";

/// An ML-ready matrix: one f32 vector per row, optional labels, row ids.
///
/// Serialized as JSON into the object store at bake-off start so that
/// per-candidate training calls can re-download it without re-parsing the
/// source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub feature_names: Vec<String>,
    pub x: Vec<Vec<f32>>,
    #[serde(default)]
    pub y: Option<Vec<f32>>,
    pub wire_ids: Vec<String>,
}

impl FeatureMatrix {
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.x.len()
    }
}

/// Infers the feature schema of a table: every fully numeric column except
/// the row identifier and the label.
///
/// # Errors
///
/// Returns a validation error if the label column is absent or no numeric
/// feature column remains.
pub fn infer_schema(table: &Table, label_column: Option<&str>) -> CoreResult<FeatureSchema> {
    if let Some(label) = label_column {
        if table.column_index(label).is_none() {
            return Err(CoreError::validation(format!(
                "label column '{label}' not present in dataset"
            )));
        }
    }

    let features: Vec<String> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, name)| name.as_str() != WIRE_ID_COLUMN && Some(name.as_str()) != label_column)
        .filter(|(idx, _)| is_numeric_column(table, *idx))
        .map(|(_, name)| name.clone())
        .collect();

    if features.is_empty() {
        return Err(CoreError::validation(
            "dataset has no numeric feature columns",
        ));
    }

    Ok(FeatureSchema {
        features,
        label_column: label_column.map(str::to_string),
    })
}

/// Extracts the feature matrix for `schema` from `table`.
///
/// Unparsable or empty cells inside a numeric column become 0.0; whole
/// missing columns are a hard error.
///
/// # Errors
///
/// Returns a validation error if the table lacks any schema feature, or the
/// schema's label column.
pub fn extract_matrix(table: &Table, schema: &FeatureSchema) -> CoreResult<FeatureMatrix> {
    let missing = schema.missing_columns(&table.headers);
    if !missing.is_empty() {
        return Err(CoreError::validation(format!(
            "dataset is missing model feature columns: {}",
            missing.join(", ")
        )));
    }

    let feature_indices: Vec<usize> = schema
        .features
        .iter()
        .filter_map(|name| table.column_index(name))
        .collect();

    let label_index = match schema.label_column.as_deref() {
        Some(label) => Some(table.column_index(label).ok_or_else(|| {
            CoreError::validation(format!("label column '{label}' not present in dataset"))
        })?),
        None => None,
    };
    let id_index = table.column_index(WIRE_ID_COLUMN);

    let mut x = Vec::with_capacity(table.rows.len());
    let mut y = label_index.map(|_| Vec::with_capacity(table.rows.len()));
    let mut wire_ids = Vec::with_capacity(table.rows.len());

    for (row_idx, row) in table.rows.iter().enumerate() {
        let vector: Vec<f32> = feature_indices
            .iter()
            .map(|&col| parse_cell(row.get(col)))
            .collect();
        x.push(vector);

        if let (Some(labels), Some(col)) = (y.as_mut(), label_index) {
            labels.push(parse_label(row.get(col)));
        }

        let wire_id = id_index
            .and_then(|col| row.get(col))
            .filter(|cell| !cell.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("row_{row_idx}"));
        wire_ids.push(wire_id);
    }

    Ok(FeatureMatrix {
        feature_names: schema.features.clone(),
        x,
        y,
        wire_ids,
    })
}

/// A column is numeric when every non-empty cell parses as f32.
fn is_numeric_column(table: &Table, index: usize) -> bool {
    let mut saw_value = false;
    for row in &table.rows {
        match row.get(index) {
            Some(cell) if !cell.is_empty() => {
                if cell.parse::<f32>().is_err() {
                    return false;
                }
                saw_value = true;
            }
            _ => {}
        }
    }
    saw_value
}

fn parse_cell(cell: Option<&String>) -> f32 {
    cell.and_then(|c| c.parse::<f32>().ok()).unwrap_or(0.0)
}

/// Accepts numeric labels plus common boolean spellings; anything positive
/// is an anomaly.
fn parse_label(cell: Option<&String>) -> f32 {
    match cell.map(String::as_str) {
        Some("true" | "TRUE" | "True" | "yes" | "y") => 1.0,
        Some(other) => {
            if other.parse::<f32>().is_ok_and(|v| v > 0.0) {
                1.0
            } else {
                0.0
            }
        }
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use model_specs::SourceFormat;

    use super::*;
    use crate::table::parse;

    fn sample_table() -> Table {
        let data = b"wire_id,amount,country,velocity_24h,is_fraud\n\
                     w1,100.0,US,2,0\n\
                     w2,9500.5,GB,14,1\n\
                     w3,42.0,US,1,false\n";
        parse(data, SourceFormat::Csv).expect("parse")
    }

    #[test]
    fn test_infer_schema_keeps_numeric_columns_only() {
        let table = sample_table();
        let schema = infer_schema(&table, Some("is_fraud")).expect("schema");
        assert_eq!(schema.features, vec!["amount", "velocity_24h"]);
        assert_eq!(schema.label_column.as_deref(), Some("is_fraud"));
    }

    #[test]
    fn test_infer_schema_rejects_missing_label() {
        let table = sample_table();
        let err = infer_schema(&table, Some("fraud_flag")).expect_err("must fail");
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_extract_matrix() {
        let table = sample_table();
        let schema = infer_schema(&table, Some("is_fraud")).expect("schema");
        let matrix = extract_matrix(&table, &schema).expect("matrix");

        assert_eq!(matrix.row_count(), 3);
        assert_eq!(matrix.x[1], vec![9500.5, 14.0]);
        assert_eq!(matrix.y.as_deref(), Some(&[0.0, 1.0, 0.0][..]));
        assert_eq!(matrix.wire_ids, vec!["w1", "w2", "w3"]);
    }

    #[test]
    fn test_extract_matrix_rejects_schema_superset() {
        let table = sample_table();
        let schema = FeatureSchema {
            features: vec!["amount".into(), "beneficiary_risk".into()],
            label_column: None,
        };
        let err = extract_matrix(&table, &schema).expect_err("must fail");
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(err.to_string().contains("beneficiary_risk"));
    }

    #[test]
    fn test_wire_ids_fall_back_to_row_index() {
        let table = parse(b"amount\n1.0\n2.0\n", SourceFormat::Csv).expect("parse");
        let schema = infer_schema(&table, None).expect("schema");
        let matrix = extract_matrix(&table, &schema).expect("matrix");
        assert_eq!(matrix.wire_ids, vec!["row_0", "row_1"]);
        assert!(matrix.y.is_none());
    }
}
