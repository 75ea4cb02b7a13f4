//! History listing record.
//!
//! This is a summarized view of a retained `Dataset`, suitable for listing.
//! It is NOT the stored format - that remains JSONL with `Dataset`.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::model::Dataset;

/// One row of the history listing: `{id, name, uploaded_at, total}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: u64,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    /// Number of equipment records in the dataset
    pub total: u64,
}

impl From<&Dataset> for HistoryEntry {
    fn from(dataset: &Dataset) -> Self {
        HistoryEntry {
            id: dataset.id(),
            name: dataset.name().to_string(),
            uploaded_at: dataset.uploaded_at(),
            total: dataset.total(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_history_entry_json_shape() {
        let entry = HistoryEntry {
            id: 12,
            name: "plant-a.csv".to_string(),
            uploaded_at: datetime!(2024-01-15 12:00:00 UTC),
            total: 42,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], 12);
        assert_eq!(json["name"], "plant-a.csv");
        assert_eq!(json["uploaded_at"], "2024-01-15T12:00:00Z");
        assert_eq!(json["total"], 42);
        assert_eq!(json.as_object().unwrap().len(), 4);
    }
}
