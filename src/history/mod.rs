//! History index: read-only listing of retained datasets.
//!
//! The listing is derived from the retention window on demand; it is never
//! stored separately.

pub mod build;
pub mod schema;

pub use build::{build_history, render_history_table, write_history_json};
pub use schema::HistoryEntry;
