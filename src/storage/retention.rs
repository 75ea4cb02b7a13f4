//! Retention manager: owns the dataset collection and its most-recent-K window.
//!
//! Every mutation goes through [`RetentionManager::ingest`], which persists the
//! new dataset and evicts everything outside the window as one step:
//!
//! 1. take the in-process write guard (and the store's file lock, if durable)
//! 2. re-read the durable window, assign the next id and timestamp
//! 3. order newest first, split off everything past `limit`
//! 4. write the surviving window, then publish it to readers
//!
//! Readers (`get`, `list`) clone an `im::Vector` snapshot under a read guard and
//! never observe a half-evicted window.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::RwLock;

use im::Vector;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::model::{Dataset, Summary};
use crate::{ReportError, ReportResult};

use super::jsonl::JsonlStore;

/// Default number of datasets kept alive.
pub const DEFAULT_RETENTION_LIMIT: usize = 5;

/// Newest first: later `uploaded_at`, then higher id.
fn newest_first(a: &Dataset, b: &Dataset) -> Ordering {
    b.uploaded_at()
        .cmp(&a.uploaded_at())
        .then_with(|| b.id().cmp(&a.id()))
}

pub struct RetentionManager {
    limit: usize,
    store: Option<JsonlStore>,
    window: RwLock<Vector<Dataset>>,
}

impl RetentionManager {
    /// A manager with no durable backing, for tests and embedding.
    pub fn in_memory(limit: usize) -> ReportResult<Self> {
        check_limit(limit)?;
        Ok(RetentionManager {
            limit,
            store: None,
            window: RwLock::new(Vector::new()),
        })
    }

    /// Open (or lazily create) a JSONL-backed manager.
    ///
    /// Loading never evicts; an over-full store is trimmed by the next ingest.
    pub fn open(path: impl AsRef<Path>, limit: usize) -> ReportResult<Self> {
        check_limit(limit)?;
        let store = JsonlStore::new(path);
        let mut datasets = store.read_all()?;
        datasets.sort_by(newest_first);
        debug!(
            path = %store.path().display(),
            retained = datasets.len(),
            "opened dataset store"
        );
        Ok(RetentionManager {
            limit,
            store: Some(store),
            window: RwLock::new(Vector::from(datasets)),
        })
    }

    /// The retention window size K.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Persist a new dataset for `summary` and evict everything outside the window.
    pub fn ingest(&self, name: impl Into<String>, summary: Summary) -> ReportResult<Dataset> {
        self.ingest_with_source(name, summary, None)
    }

    /// Like [`ingest`](Self::ingest), recording a digest of the uploaded bytes.
    pub fn ingest_with_source(
        &self,
        name: impl Into<String>,
        summary: Summary,
        source_sha256: Option<String>,
    ) -> ReportResult<Dataset> {
        let name = name.into();
        if !summary.averages_are_finite() {
            return Err(ReportError::Storage(format!(
                "refusing to store dataset '{name}': summary has a non-finite average"
            )));
        }

        // Published state is only replaced at the very end, so a poisoned
        // guard still holds a consistent window.
        let mut window = self.window.write().unwrap_or_else(|e| e.into_inner());
        let _file_lock = match &self.store {
            Some(store) => Some(store.lock()?),
            None => None,
        };

        let mut datasets: Vec<Dataset> = match &self.store {
            Some(store) => store.read_all()?,
            None => window.iter().cloned().collect(),
        };

        let next_id = datasets.iter().map(Dataset::id).max().unwrap_or(0) + 1;
        // Never stamp a new dataset earlier than one already retained, so the
        // newest ingest is always inside the window.
        let now = OffsetDateTime::now_utc();
        let uploaded_at = datasets
            .iter()
            .map(Dataset::uploaded_at)
            .max()
            .map_or(now, |newest| newest.max(now));

        let dataset = Dataset::new(next_id, name, uploaded_at, source_sha256, summary);
        datasets.push(dataset.clone());
        datasets.sort_by(newest_first);

        let evicted = if datasets.len() > self.limit {
            datasets.split_off(self.limit)
        } else {
            Vec::new()
        };

        if let Some(store) = &self.store {
            store.write_all(&datasets)?;
        }
        *window = Vector::from(datasets);

        for old in &evicted {
            debug!(id = old.id(), name = old.name(), "evicted dataset");
        }
        info!(
            id = dataset.id(),
            name = dataset.name(),
            rows = dataset.total(),
            evicted = evicted.len(),
            "dataset ingested"
        );

        Ok(dataset)
    }

    /// Look up a retained dataset.
    ///
    /// # Errors
    /// `NotFound` if `id` was never assigned or has been evicted.
    pub fn get(&self, id: u64) -> ReportResult<Dataset> {
        self.snapshot()
            .into_iter()
            .find(|d| d.id() == id)
            .ok_or(ReportError::NotFound(id))
    }

    /// All retained datasets, newest first.
    pub fn list(&self) -> Vec<Dataset> {
        self.snapshot().into_iter().collect()
    }

    /// Cheap copy of the current window, newest first.
    pub fn snapshot(&self) -> Vector<Dataset> {
        self.window
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.window.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_limit(limit: usize) -> ReportResult<()> {
    if limit == 0 {
        return Err(ReportError::Config(
            "retention_limit must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::aggregate;
    use crate::model::EquipmentRecord;

    fn summary_with_rows(n: usize) -> Summary {
        let records: Vec<EquipmentRecord> = (0..n)
            .map(|i| EquipmentRecord {
                name: format!("E-{i}"),
                equipment_type: "Pump".to_string(),
                flowrate: i as f64,
                pressure: 1.0,
                temperature: 50.0,
            })
            .collect();
        aggregate(&records)
    }

    fn names(datasets: &[Dataset]) -> Vec<String> {
        datasets.iter().map(|d| d.name().to_string()).collect()
    }

    #[test]
    fn test_non_finite_summary_is_not_stored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datasets.jsonl");
        let manager = RetentionManager::open(&path, 5).unwrap();
        let mut summary = summary_with_rows(1);
        summary.avg_pressure = f64::INFINITY;

        let err = manager.ingest("broken", summary).unwrap_err();
        assert!(matches!(err, ReportError::Storage(_)));
        assert!(manager.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(matches!(
            RetentionManager::in_memory(0),
            Err(ReportError::Config(_))
        ));
    }

    #[test]
    fn test_ids_are_unique_and_monotonic() {
        let manager = RetentionManager::in_memory(DEFAULT_RETENTION_LIMIT).unwrap();
        let a = manager.ingest("a.csv", summary_with_rows(1)).unwrap();
        let b = manager.ingest("b.csv", summary_with_rows(2)).unwrap();
        assert_eq!(a.id(), 1);
        assert_eq!(b.id(), 2);
        assert!(b.uploaded_at() >= a.uploaded_at());
    }

    #[test]
    fn test_seven_ingests_keep_latest_five() {
        let manager = RetentionManager::in_memory(5).unwrap();
        for i in 1..=7 {
            manager.ingest(format!("D{i}"), summary_with_rows(i)).unwrap();
        }
        assert_eq!(names(&manager.list()), vec!["D7", "D6", "D5", "D4", "D3"]);
        assert_eq!(manager.len(), 5);
    }

    #[test]
    fn test_get_evicted_is_not_found() {
        let manager = RetentionManager::in_memory(2).unwrap();
        let first = manager.ingest("first", summary_with_rows(1)).unwrap();
        assert_eq!(manager.get(first.id()).unwrap(), first);

        manager.ingest("second", summary_with_rows(1)).unwrap();
        manager.ingest("third", summary_with_rows(1)).unwrap();

        let err = manager.get(first.id()).unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(manager.get(999), Err(ReportError::NotFound(999))));
    }

    #[test]
    fn test_below_limit_never_evicts() {
        let manager = RetentionManager::in_memory(5).unwrap();
        manager.ingest("only", summary_with_rows(3)).unwrap();
        manager.ingest("two", summary_with_rows(3)).unwrap();
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_reads_do_not_evict() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datasets.jsonl");
        {
            let manager = RetentionManager::open(&path, 5).unwrap();
            for i in 1..=4 {
                manager.ingest(format!("D{i}"), summary_with_rows(1)).unwrap();
            }
        }
        // Reopen with a smaller window: loading and reading leave all four.
        let manager = RetentionManager::open(&path, 2).unwrap();
        assert_eq!(manager.list().len(), 4);
        assert!(manager.get(1).is_ok());

        // The next ingest trims to the new window.
        manager.ingest("D5", summary_with_rows(1)).unwrap();
        assert_eq!(names(&manager.list()), vec!["D5", "D4"]);
        assert!(manager.get(1).is_err());
    }

    #[test]
    fn test_ids_not_reused_after_eviction() {
        let manager = RetentionManager::in_memory(1).unwrap();
        for _ in 0..4 {
            manager.ingest("x", summary_with_rows(1)).unwrap();
        }
        let survivor = manager.list();
        assert_eq!(survivor.len(), 1);
        assert_eq!(survivor[0].id(), 4);
        let next = manager.ingest("y", summary_with_rows(1)).unwrap();
        assert_eq!(next.id(), 5);
    }

    #[test]
    fn test_source_digest_is_recorded() {
        let manager = RetentionManager::in_memory(5).unwrap();
        let digest = crate::sha256_hex(b"Equipment Name,Type\n");
        let dataset = manager
            .ingest_with_source("a.csv", summary_with_rows(0), Some(digest.clone()))
            .unwrap();
        assert_eq!(dataset.source_sha256(), Some(digest.as_str()));
    }
}
