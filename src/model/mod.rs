//! Core data model for equipment-report.
//!
//! This module contains the canonical `Dataset` schema (v1) persisted by the
//! dataset store, plus the records and summaries it wraps.

pub mod schema;

// Re-export key types for convenience
pub use schema::{
    COL_EQUIPMENT_NAME, COL_FLOWRATE, COL_PRESSURE, COL_TEMPERATURE, COL_TYPE, Dataset,
    EquipmentRecord, IngestResponse, REQUIRED_COLUMNS, SCHEMA_VERSION, Summary,
};
