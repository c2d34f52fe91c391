//! Shared types for the comparison dashboard.
//!
//! Query parameters, backend payloads, table column metadata and presets live
//! here so the orchestrator, gateway and any front end agree on one definition.

pub mod data;
pub mod formatting;
pub mod preset;
pub mod query;

pub use data::{
    AggFunc, CatalogField, CellValue, DimensionDef, FieldKind, FlatRow, MeasureDef,
    TableColumnConfig, TrendPoint, ValueFormat, table_columns,
};
pub use preset::{DEFAULT_PRESET_GROUP, Preset};
pub use query::{
    ChartWindow, ControlBarState, FieldConfig, KvOption, ParseWindowError, QuerySnapshot,
    SnapshotError, ValueSets,
};
