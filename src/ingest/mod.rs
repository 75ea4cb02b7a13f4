//! Ingestion: raw delimited text -> validated records -> summary.
//!
//! - `table`: untyped `RawTable` read with the `csv` crate
//! - `validate`: required-column and per-cell checks
//! - `aggregate`: counts, averages, type distribution

pub mod aggregate;
pub mod table;
pub mod validate;

use std::io::Read;

use tracing::debug;

use crate::ReportResult;
use crate::model::Summary;

pub use aggregate::aggregate;
pub use table::RawTable;
pub use validate::validate;

/// Validate and aggregate a raw table in one step.
pub fn summarize_table(table: &RawTable) -> ReportResult<Summary> {
    let records = validate(table)?;
    let summary = aggregate(&records);
    debug!(
        rows = summary.total_count,
        types = summary.type_distribution.len(),
        "summarized table"
    );
    Ok(summary)
}

/// Read delimited text, validate it and aggregate it.
pub fn summarize_csv<R: Read>(reader: R) -> ReportResult<Summary> {
    let table = RawTable::from_csv_reader(reader)?;
    summarize_table(&table)
}
