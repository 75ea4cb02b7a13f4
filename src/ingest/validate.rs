//! Record validation: raw table -> typed equipment records.

use crate::model::{
    COL_EQUIPMENT_NAME, COL_FLOWRATE, COL_PRESSURE, COL_TEMPERATURE, COL_TYPE, EquipmentRecord,
    REQUIRED_COLUMNS,
};
use crate::{ReportError, ReportResult};

use super::table::RawTable;

/// Column positions resolved once from the table header.
struct ColumnIndex {
    name: usize,
    equipment_type: usize,
    flowrate: usize,
    pressure: usize,
    temperature: usize,
}

impl ColumnIndex {
    fn resolve(table: &RawTable) -> ReportResult<Self> {
        // Report the first missing column in canonical order.
        for column in REQUIRED_COLUMNS {
            if table.column_index(column).is_none() {
                return Err(ReportError::MissingColumn {
                    column: column.to_string(),
                });
            }
        }
        let idx = |column: &str| table.column_index(column).unwrap_or_default();
        Ok(ColumnIndex {
            name: idx(COL_EQUIPMENT_NAME),
            equipment_type: idx(COL_TYPE),
            flowrate: idx(COL_FLOWRATE),
            pressure: idx(COL_PRESSURE),
            temperature: idx(COL_TEMPERATURE),
        })
    }
}

/// Validate every row of `table`, preserving input order.
///
/// # Errors
/// - `MissingColumn` if the header lacks a required column (checked before any row)
/// - `MalformedValue` for the first cell that is empty, non-numeric, or non-finite
///   where a number or category is required; `row` is the 0-based data row index
pub fn validate(table: &RawTable) -> ReportResult<Vec<EquipmentRecord>> {
    let columns = ColumnIndex::resolve(table)?;

    let mut records = Vec::with_capacity(table.len());
    for (row, cells) in table.rows().iter().enumerate() {
        let cell = |idx: usize| cells.get(idx).map(String::as_str).unwrap_or("");

        let name = cell(columns.name).to_string();

        let equipment_type = cell(columns.equipment_type);
        if equipment_type.is_empty() {
            return Err(ReportError::MalformedValue {
                row,
                column: COL_TYPE.to_string(),
                value: String::new(),
            });
        }

        let flowrate = parse_metric(row, COL_FLOWRATE, cell(columns.flowrate))?;
        let pressure = parse_metric(row, COL_PRESSURE, cell(columns.pressure))?;
        let temperature = parse_metric(row, COL_TEMPERATURE, cell(columns.temperature))?;

        records.push(EquipmentRecord {
            name,
            equipment_type: equipment_type.to_string(),
            flowrate,
            pressure,
            temperature,
        });
    }

    Ok(records)
}

/// Parse a metric cell as a finite real number; no zero-fill for blanks.
fn parse_metric(row: usize, column: &str, raw: &str) -> ReportResult<f64> {
    let malformed = || ReportError::MalformedValue {
        row,
        column: column.to_string(),
        value: raw.to_string(),
    };
    let value: f64 = raw.trim().parse().map_err(|_| malformed())?;
    if !value.is_finite() {
        return Err(malformed());
    }
    Ok(value)
}
