//! CLI command handler for `show`: print one retained dataset's summary.

use crate::config::AppConfig;
use crate::model::IngestResponse;
use crate::storage::RetentionManager;
use crate::{ReportError, ReportResult};

/// Run the `show` command.
///
/// # Errors
/// `NotFound` when `id` was never assigned or has been evicted.
pub fn run(config: &AppConfig, id: u64) -> ReportResult<()> {
    println!("{}", summary_json(config, id)?);
    Ok(())
}

fn summary_json(config: &AppConfig, id: u64) -> ReportResult<String> {
    let manager = RetentionManager::open(&config.store_path, config.retention_limit)?;
    let dataset = manager.get(id)?;
    serde_json::to_string_pretty(&IngestResponse::from(&dataset))
        .map_err(|e| ReportError::Message(format!("failed to serialize summary: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::summarize_csv;
    use tempfile::TempDir;

    #[test]
    fn test_show_known_and_unknown_ids() {
        let temp = TempDir::new().unwrap();
        let cfg = AppConfig {
            store_path: temp.path().join("datasets.jsonl"),
            ..Default::default()
        };
        let manager = RetentionManager::open(&cfg.store_path, cfg.retention_limit).unwrap();
        let summary = summarize_csv(
            "Equipment Name,Type,Flowrate,Pressure,Temperature\nP-1,Pump,1.5,2,3\n".as_bytes(),
        )
        .unwrap();
        manager.ingest("one.csv", summary).unwrap();

        let json = summary_json(&cfg, 1).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["avg_flowrate"], 1.5);
        assert_eq!(value["table"][0]["Equipment Name"], "P-1");

        let err = summary_json(&cfg, 42).unwrap_err();
        assert!(err.is_not_found());
    }
}
