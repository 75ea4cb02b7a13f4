//! Build the history listing from the retained window.

use std::fs;
use std::path::Path;

use time::format_description::well_known::Rfc3339;

use crate::ReportError;
use crate::storage::RetentionManager;

use super::schema::HistoryEntry;

/// Derive the listing, newest first (the manager's window order).
pub fn build_history(manager: &RetentionManager) -> Vec<HistoryEntry> {
    manager.list().iter().map(HistoryEntry::from).collect()
}

/// Write entries as pretty JSON.
pub fn write_history_json(entries: &[HistoryEntry], path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .map_err(|e| ReportError::Message(format!("failed to create directory: {e}")))?;
        }
    }

    let json = serde_json::to_string_pretty(entries)
        .map_err(|e| ReportError::Message(format!("failed to serialize history: {e}")))?;

    fs::write(path, json)
        .map_err(|e| ReportError::Message(format!("failed to write history json: {e}")))?;

    Ok(())
}

/// Render entries as an aligned plain-text table for terminals.
pub fn render_history_table(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No datasets retained.\n".to_string();
    }

    let rows: Vec<[String; 4]> = entries
        .iter()
        .map(|e| {
            [
                e.id.to_string(),
                e.name.clone(),
                e.uploaded_at.format(&Rfc3339).unwrap_or_default(),
                e.total.to_string(),
            ]
        })
        .collect();

    let headers = ["ID", "NAME", "UPLOADED_AT", "TOTAL"];
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_row = |cells: [&str; 4]| {
        let line = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    };
    push_row(headers);
    for row in &rows {
        push_row([row[0].as_str(), row[1].as_str(), row[2].as_str(), row[3].as_str()]);
    }
    out
}
