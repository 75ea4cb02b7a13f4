//! CSV export for the history listing.

use std::io::Write;
use std::path::Path;

use time::format_description::well_known::Rfc3339;

use crate::ReportError;
use crate::history::HistoryEntry;

/// CSV column headers in deterministic order.
pub const CSV_HEADERS: &[&str] = &["id", "name", "uploaded_at", "total"];

/// CSV exporter for history entries.
#[derive(Debug, Clone, Default)]
pub struct CsvExporter;

impl CsvExporter {
    /// Create a new CsvExporter.
    pub fn new() -> Self {
        CsvExporter
    }

    /// Export entries to a CSV file.
    ///
    /// # Errors
    /// Returns an error if file operations or CSV writing fails.
    pub fn export(&self, entries: &[HistoryEntry], output: &Path) -> Result<(), ReportError> {
        // Ensure parent directory exists
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ReportError::Message(format!("failed to create directory: {e}")))?;
            }
        }

        let file = std::fs::File::create(output)
            .map_err(|e| ReportError::Message(format!("failed to create file: {e}")))?;

        self.export_to_writer(entries, file)
    }

    /// Export entries to stdout.
    pub fn export_to_stdout(&self, entries: &[HistoryEntry]) -> Result<(), ReportError> {
        let stdout = std::io::stdout();
        let handle = stdout.lock();
        self.export_to_writer(entries, handle)
    }

    /// Export entries to any writer implementing Write.
    pub fn export_to_writer<W: Write>(
        &self,
        entries: &[HistoryEntry],
        writer: W,
    ) -> Result<(), ReportError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer
            .write_record(CSV_HEADERS)
            .map_err(|e| ReportError::Message(format!("failed to write CSV headers: {e}")))?;

        for entry in entries {
            csv_writer
                .write_record(self.entry_to_row(entry))
                .map_err(|e| ReportError::Message(format!("failed to write CSV row: {e}")))?;
        }

        csv_writer
            .flush()
            .map_err(|e| ReportError::Message(format!("failed to flush CSV writer: {e}")))?;

        Ok(())
    }

    fn entry_to_row(&self, entry: &HistoryEntry) -> Vec<String> {
        vec![
            entry.id.to_string(),
            entry.name.clone(),
            entry.uploaded_at.format(&Rfc3339).unwrap_or_default(),
            entry.total.to_string(),
        ]
    }
}
