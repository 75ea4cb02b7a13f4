//! Raw tabular input: column names plus untyped string cells.

use std::io::Read;

use csv::{ReaderBuilder, Trim};

use crate::ReportResult;

/// An untyped table as uploaded: a header row and string cells.
///
/// Cells are addressed by column name through [`RawTable::cell`]; nothing is
/// parsed or coerced at this layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        RawTable { columns, rows }
    }

    /// Read delimited text with a header row.
    ///
    /// Headers and fields are trimmed. A row whose field count disagrees with
    /// the header is an error, not a silently padded row.
    pub fn from_csv_reader<R: Read>(reader: R) -> ReportResult<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                if i == 0 {
                    h.trim_start_matches('\u{feff}').to_string()
                } else {
                    h.to_string()
                }
            })
            .collect();

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(RawTable { columns, rows })
    }

    pub fn from_csv_bytes(bytes: &[u8]) -> ReportResult<Self> {
        Self::from_csv_reader(bytes)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Raw value of `column` in data row `row`, if both exist.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReportError;

    #[test]
    fn test_reads_header_and_rows() {
        let csv = "Equipment Name,Type,Flowrate\nP-1,Pump,10\nV-1,Valve,2.5\n";
        let table = RawTable::from_csv_bytes(csv.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["Equipment Name", "Type", "Flowrate"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, "Type"), Some("Valve"));
        assert_eq!(table.cell(0, "Flowrate"), Some("10"));
        assert_eq!(table.cell(0, "Pressure"), None);
        assert_eq!(table.cell(2, "Type"), None);
    }

    #[test]
    fn test_trims_whitespace_and_bom() {
        let csv = "\u{feff}Equipment Name , Type\n  P-1 ,  Pump \n";
        let table = RawTable::from_csv_bytes(csv.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["Equipment Name", "Type"]);
        assert_eq!(table.cell(0, "Equipment Name"), Some("P-1"));
        assert_eq!(table.cell(0, "Type"), Some("Pump"));
    }

    #[test]
    fn test_header_only_is_empty_table() {
        let table = RawTable::from_csv_bytes(b"Equipment Name,Type\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 2);
    }

    #[test]
    fn test_ragged_row_is_rejected() {
        let csv = "A,B,C\n1,2,3\n4,5\n";
        let err = RawTable::from_csv_bytes(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ReportError::Csv(_)));
    }

    #[test]
    fn test_quoted_fields_keep_delimiters() {
        let csv = "Equipment Name,Type\n\"Pump, main\",\"Heat Exchanger\"\n";
        let table = RawTable::from_csv_bytes(csv.as_bytes()).unwrap();
        assert_eq!(table.cell(0, "Equipment Name"), Some("Pump, main"));
    }
}
