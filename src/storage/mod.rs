//! Storage layer for retained datasets.
//!
//! - `jsonl`: durable dataset file (atomic rewrite, cross-process lock)
//! - `retention`: the most-recent-K window that owns all datasets
//! - `csv`: CSV export of the history listing

pub mod csv;
pub mod jsonl;
pub mod retention;

// Re-export key types
pub use self::csv::{CSV_HEADERS, CsvExporter};
pub use jsonl::{JsonlStore, StoreLock};
pub use retention::{DEFAULT_RETENTION_LIMIT, RetentionManager};
