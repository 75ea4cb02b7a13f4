pub mod config;
pub mod model;
pub mod history;
pub mod ingest;
pub mod render;
pub mod storage;

pub mod history_cmd;
pub mod ingest_cmd;
pub mod report_cmd;
pub mod show_cmd;

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    // --- input validation ---
    #[error("missing required column '{column}'")]
    MissingColumn { column: String },
    #[error("malformed value {value:?} in row {row}, column '{column}'")]
    MalformedValue {
        row: usize,
        column: String,
        value: String,
    },

    // --- retention ---
    #[error("dataset {0} not found")]
    NotFound(u64),

    // --- rendering ---
    #[error("report template not found: {}", path.display())]
    TemplateMissing { path: PathBuf },
    #[error("unresolved template placeholder {{{{{0}}}}}")]
    UnresolvedPlaceholder(String),
    #[error("typesetting compiler unavailable: {0}")]
    CompilerUnavailable(String),
    #[error("compilation failed ({status}):\n{diagnostics}")]
    CompilationFailed { status: String, diagnostics: String },
    #[error("compilation timed out after {0:?}")]
    CompilationTimeout(Duration),

    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("dataset store error: {0}")]
    Storage(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl ReportError {
    /// Compilation failures on well-formed input may succeed on a second attempt.
    /// Misconfiguration (missing template or compiler) never will.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReportError::CompilationFailed { .. } | ReportError::CompilationTimeout(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReportError::NotFound(_))
    }
}

pub type ReportResult<T> = Result<T, ReportError>;

pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha256::digest;
    digest(bytes)
}

/// Write a command's output file, creating parent directories.
pub(crate) fn write_output(path: &Path, contents: impl AsRef<[u8]>) -> anyhow::Result<()> {
    use anyhow::Context;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
