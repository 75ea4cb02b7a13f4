//! CLI command handler for `ingest`.
//!
//! Validates and summarizes a CSV upload, hands the summary to the retention
//! window and prints the ingest response (`id` plus summary) as JSON.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::ingest::summarize_csv;
use crate::model::{Dataset, IngestResponse};
use crate::storage::RetentionManager;
use crate::{ReportError, ReportResult, sha256_hex, write_output};

/// Run the `ingest` command.
///
/// # Arguments
/// * `csv_path` - CSV file with the five required columns
/// * `name` - dataset name; defaults to the file name
/// * `json_out` - write the response here instead of stdout
pub fn run(
    config: &AppConfig,
    csv_path: PathBuf,
    name: Option<String>,
    json_out: Option<PathBuf>,
) -> ReportResult<()> {
    let manager = RetentionManager::open(&config.store_path, config.retention_limit)?;
    let dataset = ingest_file(&manager, &csv_path, name)?;

    let json = serde_json::to_string_pretty(&IngestResponse::from(&dataset))
        .map_err(|e| ReportError::Message(format!("failed to serialize response: {e}")))?;

    match json_out {
        Some(path) => {
            write_output(&path, json)?;
            eprintln!("Wrote ingest response to: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Read, summarize and retain one CSV file.
///
/// Nothing is persisted if validation fails.
pub fn ingest_file(
    manager: &RetentionManager,
    csv_path: &Path,
    name: Option<String>,
) -> ReportResult<Dataset> {
    let bytes = std::fs::read(csv_path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => {
            ReportError::Message(format!("CSV file not found: {}", csv_path.display()))
        }
        _ => ReportError::Io(e),
    })?;

    let summary = summarize_csv(bytes.as_slice())?;
    let name = name.unwrap_or_else(|| {
        csv_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| csv_path.display().to_string())
    });

    manager.ingest_with_source(name, summary, Some(sha256_hex(&bytes)))
}
