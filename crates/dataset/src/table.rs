//! Raw tabular data parsed from an ingested file.

use model_specs::{CoreError, CoreResult, SourceFormat};

/// A parsed table: header row plus string cells.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    /// Index of a header, if present.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Parses raw file bytes into a [`Table`].
///
/// XLSX datasets are converted to CSV upstream before ingestion; the format
/// is kept only for provenance, so seeing it here is a caller error.
///
/// # Errors
///
/// Returns a validation error for malformed CSV or a non-CSV format.
pub fn parse(bytes: &[u8], format: SourceFormat) -> CoreResult<Table> {
    match format {
        SourceFormat::Csv => parse_csv(bytes),
        SourceFormat::Xlsx => Err(CoreError::validation(
            "xlsx datasets must be converted to csv before ingestion",
        )),
    }
}

fn parse_csv(bytes: &[u8]) -> CoreResult<Table> {
    let mut reader = csv::Reader::from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CoreError::validation(format!("invalid csv header: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() {
        return Err(CoreError::validation("csv file has no header row"));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| CoreError::validation(format!("invalid csv record: {e}")))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv() {
        let data = b"wire_id,amount,is_fraud\nw1,100.0,0\nw2,9500.5,1\n";
        let table = parse(data, SourceFormat::Csv).expect("parse");
        assert_eq!(table.headers, vec!["wire_id", "amount", "is_fraud"]);
        assert_eq!(table.total_rows(), 2);
        assert_eq!(table.rows[1][1], "9500.5");
        assert_eq!(table.column_index("amount"), Some(1));
        assert_eq!(table.column_index("missing"), None);
    }

    #[test]
    fn test_parse_rejects_xlsx() {
        let err = parse(b"whatever", SourceFormat::Xlsx).expect_err("must reject");
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_parse_empty_csv_has_no_rows() {
        let table = parse(b"a,b\n", SourceFormat::Csv).expect("parse");
        assert_eq!(table.total_rows(), 0);
    }
}
