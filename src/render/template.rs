//! Report template filling.
//!
//! Templates are plain LaTeX with double-brace placeholders such as
//! `{{TOTAL}}`. Substitution is a single left-to-right pass: substituted text
//! is never rescanned, and a placeholder-shaped token with no value is an
//! error rather than being left in the output.

use std::io::ErrorKind;
use std::path::Path;

use time::OffsetDateTime;
use time::macros::format_description;

use crate::model::Summary;
use crate::{ReportError, ReportResult};

pub const REPORT_ID: &str = "REPORT_ID";
pub const TOTAL: &str = "TOTAL";
pub const AVG_FLOWRATE: &str = "AVG_FLOWRATE";
pub const AVG_PRESSURE: &str = "AVG_PRESSURE";
pub const AVG_TEMPERATURE: &str = "AVG_TEMPERATURE";
pub const TYPE_ROWS: &str = "TYPE_ROWS";

/// Every placeholder the renderer knows how to fill.
pub const PLACEHOLDERS: [&str; 6] = [
    REPORT_ID,
    TOTAL,
    AVG_FLOWRATE,
    AVG_PRESSURE,
    AVG_TEMPERATURE,
    TYPE_ROWS,
];

/// Read a template from disk; a missing file is `TemplateMissing`.
pub fn load_template(path: &Path) -> ReportResult<String> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ReportError::TemplateMissing {
            path: path.to_path_buf(),
        },
        _ => ReportError::Io(e),
    })
}

/// `REP-YYYYMMDD-HHMMSS` in UTC.
pub fn new_report_id(now: OffsetDateTime) -> String {
    let stamp = now
        .to_offset(time::UtcOffset::UTC)
        .format(format_description!(
            "[year][month][day]-[hour][minute][second]"
        ))
        .unwrap_or_default();
    format!("REP-{stamp}")
}

/// Escape LaTeX special characters in free text.
///
/// Text without specials is returned unchanged.
pub fn latex_escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => result.push_str("\\textbackslash{}"),
            '&' => result.push_str("\\&"),
            '%' => result.push_str("\\%"),
            '$' => result.push_str("\\$"),
            '#' => result.push_str("\\#"),
            '_' => result.push_str("\\_"),
            '{' => result.push_str("\\{"),
            '}' => result.push_str("\\}"),
            '~' => result.push_str("\\textasciitilde{}"),
            '^' => result.push_str("\\textasciicircum{}"),
            _ => result.push(c),
        }
    }
    result
}

/// One `label & count \\` table line per distribution entry, most common first.
pub fn format_type_rows(summary: &Summary) -> String {
    let mut rows = String::new();
    for (label, count) in summary.distribution_by_count() {
        rows.push_str(&format!("{} & {} \\\\\n", latex_escape(label), count));
    }
    rows
}

/// Placeholder values for `summary`, averages to 2 decimal places.
pub fn placeholder_values(summary: &Summary, report_id: &str) -> Vec<(&'static str, String)> {
    vec![
        (REPORT_ID, report_id.to_string()),
        (TOTAL, summary.total_count.to_string()),
        (AVG_FLOWRATE, format!("{:.2}", summary.avg_flowrate)),
        (AVG_PRESSURE, format!("{:.2}", summary.avg_pressure)),
        (AVG_TEMPERATURE, format!("{:.2}", summary.avg_temperature)),
        (TYPE_ROWS, format_type_rows(summary)),
    ]
}

fn is_placeholder_name(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Substitute `{{NAME}}` tokens from `values`.
///
/// # Errors
/// `UnresolvedPlaceholder` for the first token whose name has no value.
pub fn substitute(template: &str, values: &[(&str, String)]) -> ReportResult<String> {
    let mut out = String::with_capacity(template.len() + 1024);
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) if is_placeholder_name(&after[..end]) => {
                let name = &after[..end];
                let value = values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, v)| v.as_str())
                    .ok_or_else(|| ReportError::UnresolvedPlaceholder(name.to_string()))?;
                out.push_str(value);
                rest = &after[end + 2..];
            }
            // Plain LaTeX grouping like `{{\bf x}}`: keep one brace and move on.
            _ => {
                out.push('{');
                rest = &rest[start + 1..];
            }
        }
    }
    out.push_str(rest);

    Ok(out)
}

/// Fill `template` with the figures of `summary`.
pub fn fill_template(template: &str, summary: &Summary, report_id: &str) -> ReportResult<String> {
    substitute(template, &placeholder_values(summary, report_id))
}

/// First placeholder-shaped token left in `text`, if any.
pub fn find_unresolved(text: &str) -> Option<String> {
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        if let Some(end) = after.find("}}") {
            if is_placeholder_name(&after[..end]) {
                return Some(after[..end].to_string());
            }
        }
        rest = &rest[start + 1..];
    }
    None
}
