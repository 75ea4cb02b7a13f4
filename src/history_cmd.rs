//! CLI command handler for `history`.
//!
//! Lists the retained datasets, newest first, as a text table (default),
//! pretty JSON or CSV, on stdout or into a file.

use std::path::PathBuf;

use crate::config::AppConfig;
use crate::history::{HistoryEntry, build_history, render_history_table, write_history_json};
use crate::storage::{CsvExporter, RetentionManager};
use crate::{ReportError, ReportResult, write_output};

/// Output format for the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// Run the `history` command.
///
/// # Arguments
/// * `format` - table, JSON or CSV
/// * `out` - write the listing to this file instead of stdout
pub fn run(config: &AppConfig, format: HistoryFormat, out: Option<PathBuf>) -> ReportResult<()> {
    let manager = RetentionManager::open(&config.store_path, config.retention_limit)?;
    let entries = build_history(&manager);

    match (format, out) {
        (HistoryFormat::Table, None) => print!("{}", render_history_table(&entries)),
        (HistoryFormat::Json, None) => println!("{}", to_json(&entries)?),
        (HistoryFormat::Csv, None) => CsvExporter::new().export_to_stdout(&entries)?,
        (format, Some(path)) => {
            match format {
                HistoryFormat::Table => write_output(&path, render_history_table(&entries))?,
                HistoryFormat::Json => write_history_json(&entries, &path)?,
                HistoryFormat::Csv => CsvExporter::new().export(&entries, &path)?,
            }
            eprintln!("Wrote {} history entries to: {}", entries.len(), path.display());
        }
    }
    Ok(())
}

fn to_json(entries: &[HistoryEntry]) -> ReportResult<String> {
    serde_json::to_string_pretty(entries)
        .map_err(|e| ReportError::Message(format!("failed to serialize history: {e}")))
}
