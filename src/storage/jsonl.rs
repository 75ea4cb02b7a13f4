//! JSONL (JSON Lines) storage for retained datasets.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tempfile::NamedTempFile;

use crate::ReportError;
use crate::model::{Dataset, SCHEMA_VERSION};

/// JSONL file holding the current dataset window, one dataset per line.
///
/// The file is only ever replaced wholesale (temp file + rename), so a reader
/// sees either the previous window or the next one.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    path: PathBuf,
}

/// Exclusive advisory lock on the store, released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl JsonlStore {
    /// Create a new JsonlStore for the given path.
    ///
    /// Nothing is created on disk until the first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonlStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the path to the JSONL file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn ensure_parent(&self) -> Result<(), ReportError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ReportError::Storage(format!("failed to create directory: {e}"))
                })?;
            }
        }
        Ok(())
    }

    /// Take the cross-process writer lock (blocks until available).
    pub fn lock(&self) -> Result<StoreLock, ReportError> {
        self.ensure_parent()?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())
            .map_err(|e| ReportError::Storage(format!("failed to open lock file: {e}")))?;
        file.lock_exclusive()
            .map_err(|e| ReportError::Storage(format!("failed to lock dataset store: {e}")))?;
        Ok(StoreLock { file })
    }

    /// Read every dataset in file order.
    ///
    /// A store that has never been written reads as empty.
    ///
    /// # Errors
    /// Returns an error if:
    /// - File operations fail
    /// - JSON deserialization fails for any line
    /// - A line's schema_version doesn't match SCHEMA_VERSION
    pub fn read_all(&self) -> Result<Vec<Dataset>, ReportError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .map_err(|e| ReportError::Storage(format!("failed to open file: {e}")))?;

        let reader = BufReader::new(file);
        let mut datasets = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.map_err(|e| {
                ReportError::Storage(format!("failed to read line {}: {e}", line_num + 1))
            })?;

            // Skip empty lines
            if line.trim().is_empty() {
                continue;
            }

            let dataset: Dataset = serde_json::from_str(&line).map_err(|e| {
                ReportError::Storage(format!("failed to parse line {}: {e}", line_num + 1))
            })?;

            if dataset.schema_version() != SCHEMA_VERSION {
                return Err(ReportError::Storage(format!(
                    "schema version mismatch on line {}: dataset has v{}, expected v{}",
                    line_num + 1,
                    dataset.schema_version(),
                    SCHEMA_VERSION
                )));
            }

            datasets.push(dataset);
        }

        Ok(datasets)
    }

    /// Replace the file contents with `datasets`.
    ///
    /// Written to a temp file in the same directory, flushed, then renamed
    /// over the store.
    pub fn write_all(&self, datasets: &[Dataset]) -> Result<(), ReportError> {
        self.ensure_parent()?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let tmp = NamedTempFile::new_in(&dir)
            .map_err(|e| ReportError::Storage(format!("failed to create temp file: {e}")))?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            for dataset in datasets {
                let json = serde_json::to_string(dataset).map_err(|e| {
                    ReportError::Storage(format!("failed to serialize dataset: {e}"))
                })?;
                writeln!(writer, "{}", json)
                    .map_err(|e| ReportError::Storage(format!("failed to write dataset: {e}")))?;
            }
            writer
                .flush()
                .map_err(|e| ReportError::Storage(format!("failed to flush store: {e}")))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| ReportError::Storage(format!("failed to sync store: {e}")))?;
        tmp.persist(&self.path)
            .map_err(|e| ReportError::Storage(format!("failed to replace store: {}", e.error)))?;

        Ok(())
    }
}
