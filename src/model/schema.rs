//! Dataset schema v1 - canonical schema for stored ingests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Schema version for forward compatibility
pub const SCHEMA_VERSION: u32 = 1;

pub const COL_EQUIPMENT_NAME: &str = "Equipment Name";
pub const COL_TYPE: &str = "Type";
pub const COL_FLOWRATE: &str = "Flowrate";
pub const COL_PRESSURE: &str = "Pressure";
pub const COL_TEMPERATURE: &str = "Temperature";

/// Columns every uploaded table must carry, in header order of the source format.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    COL_EQUIPMENT_NAME,
    COL_TYPE,
    COL_FLOWRATE,
    COL_PRESSURE,
    COL_TEMPERATURE,
];

/// One validated row of an equipment table.
///
/// Serializes with the source column names so the `table` field of a summary
/// mirrors the uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    #[serde(rename = "Equipment Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub equipment_type: String,
    #[serde(rename = "Flowrate")]
    pub flowrate: f64,
    #[serde(rename = "Pressure")]
    pub pressure: f64,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
}

/// Aggregate statistics for one ingested table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "total_equipment")]
    pub total_count: u64,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    /// Category label -> number of records of that type
    pub type_distribution: BTreeMap<String, u64>,
    /// Validated records in input order
    pub table: Vec<EquipmentRecord>,
}

impl Summary {
    /// Distribution entries ordered by count (descending), then label.
    pub fn distribution_by_count(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self
            .type_distribution
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// JSON has no encoding for NaN or infinity, so only finite averages
    /// can be stored and read back.
    pub fn averages_are_finite(&self) -> bool {
        [self.avg_flowrate, self.avg_pressure, self.avg_temperature]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// A retained summary plus identity and upload metadata.
///
/// Only the dataset store constructs these; callers receive them read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    schema_version: u32,
    id: u64,
    name: String,
    #[serde(with = "time::serde::rfc3339")]
    uploaded_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_sha256: Option<String>,
    summary: Summary,
}

impl Dataset {
    pub(crate) fn new(
        id: u64,
        name: String,
        uploaded_at: OffsetDateTime,
        source_sha256: Option<String>,
        summary: Summary,
    ) -> Self {
        Dataset {
            schema_version: SCHEMA_VERSION,
            id,
            name,
            uploaded_at,
            source_sha256,
            summary,
        }
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uploaded_at(&self) -> OffsetDateTime {
        self.uploaded_at
    }

    pub fn source_sha256(&self) -> Option<&str> {
        self.source_sha256.as_deref()
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Number of records in the wrapped summary.
    pub fn total(&self) -> u64 {
        self.summary.total_count
    }
}

/// Response body for an accepted ingest: the summary plus the new dataset id.
#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse<'a> {
    pub id: u64,
    #[serde(flatten)]
    pub summary: &'a Summary,
}

impl<'a> From<&'a Dataset> for IngestResponse<'a> {
    fn from(dataset: &'a Dataset) -> Self {
        IngestResponse {
            id: dataset.id,
            summary: &dataset.summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_summary() -> Summary {
        let mut type_distribution = BTreeMap::new();
        type_distribution.insert("Pump".to_string(), 2);
        type_distribution.insert("Valve".to_string(), 1);
        type_distribution.insert("Compressor".to_string(), 1);
        Summary {
            total_count: 4,
            avg_flowrate: 12.5,
            avg_pressure: 3.0,
            avg_temperature: 80.0,
            type_distribution,
            table: vec![EquipmentRecord {
                name: "P-101".to_string(),
                equipment_type: "Pump".to_string(),
                flowrate: 12.5,
                pressure: 3.0,
                temperature: 80.0,
            }],
        }
    }

    #[test]
    fn test_summary_json_uses_external_field_names() {
        let json = serde_json::to_value(sample_summary()).unwrap();
        assert_eq!(json["total_equipment"], 4);
        assert_eq!(json["type_distribution"]["Pump"], 2);
        let row = &json["table"][0];
        assert_eq!(row["Equipment Name"], "P-101");
        assert_eq!(row["Type"], "Pump");
        assert_eq!(row["Flowrate"], 12.5);
        assert!(json.get("total_count").is_none());
    }

    #[test]
    fn test_distribution_by_count_orders_deterministically() {
        let summary = sample_summary();
        let entries = summary.distribution_by_count();
        assert_eq!(
            entries,
            vec![("Pump", 2), ("Compressor", 1), ("Valve", 1)]
        );
    }

    #[test]
    fn test_dataset_serializes_rfc3339_timestamp() {
        let dataset = Dataset::new(
            7,
            "plant-a.csv".to_string(),
            datetime!(2024-01-15 12:00:00 UTC),
            None,
            sample_summary(),
        );
        let json = serde_json::to_string(&dataset).unwrap();
        assert!(json.contains("\"uploaded_at\":\"2024-01-15T12:00:00Z\""));
        // source_sha256 should not appear when None
        assert!(!json.contains("source_sha256"));

        let parsed: Dataset = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, dataset);
        assert_eq!(parsed.schema_version(), SCHEMA_VERSION);
        assert_eq!(parsed.total(), 4);
    }

    #[test]
    fn test_ingest_response_flattens_summary() {
        let dataset = Dataset::new(
            3,
            "plant-b.csv".to_string(),
            datetime!(2024-01-15 12:00:00 UTC),
            Some("abc".to_string()),
            sample_summary(),
        );
        let json = serde_json::to_value(IngestResponse::from(&dataset)).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["total_equipment"], 4);
        assert!(json.get("summary").is_none());
    }
}
