//! Query parameters: the editable control-bar state and the immutable
//! snapshot produced from it on every Apply.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Dimension name -> included (or excluded) values.
pub type ValueSets = BTreeMap<String, Vec<String>>;

// ─────────────────────────────────────────────────────────────────────────────
// Chart Window
// ─────────────────────────────────────────────────────────────────────────────

/// Look-back window for trend charts, ending at the as-of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChartWindow {
    #[default]
    #[serde(rename = "30d")]
    Days30,
    #[serde(rename = "60d")]
    Days60,
    #[serde(rename = "90d")]
    Days90,
    #[serde(rename = "1Y")]
    OneYear,
}

impl ChartWindow {
    pub const ALL: [ChartWindow; 4] = [
        ChartWindow::Days30,
        ChartWindow::Days60,
        ChartWindow::Days90,
        ChartWindow::OneYear,
    ];

    /// Wire code used by the backend and in saved presets
    pub fn code(&self) -> &'static str {
        match self {
            ChartWindow::Days30 => "30d",
            ChartWindow::Days60 => "60d",
            ChartWindow::Days90 => "90d",
            ChartWindow::OneYear => "1Y",
        }
    }

    /// Human-readable label for display
    pub fn label(&self) -> &'static str {
        match self {
            ChartWindow::Days30 => "30 Days",
            ChartWindow::Days60 => "60 Days",
            ChartWindow::Days90 => "90 Days",
            ChartWindow::OneYear => "1 Year",
        }
    }

    /// First date of the window that ends at `end`.
    ///
    /// The one-year window steps back a calendar year rather than 365 days.
    pub fn start_date(&self, end: NaiveDate) -> NaiveDate {
        let start = match self {
            ChartWindow::Days30 => end.checked_sub_days(Days::new(30)),
            ChartWindow::Days60 => end.checked_sub_days(Days::new(60)),
            ChartWindow::Days90 => end.checked_sub_days(Days::new(90)),
            ChartWindow::OneYear => end.checked_sub_months(Months::new(12)),
        };
        start.unwrap_or(NaiveDate::MIN)
    }
}

impl fmt::Display for ChartWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown chart window '{0}' (expected 30d, 60d, 90d or 1Y)")]
pub struct ParseWindowError(pub String);

impl FromStr for ChartWindow {
    type Err = ParseWindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartWindow::ALL
            .into_iter()
            .find(|w| w.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseWindowError(s.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Field Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// One grouping field and which panels it should produce.
///
/// Position in the containing list is the panel display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    pub field: String,
    pub show_table: bool,
    pub show_chart: bool,
}

impl FieldConfig {
    pub fn new(field: impl Into<String>, show_table: bool, show_chart: bool) -> Self {
        Self {
            field: field.into(),
            show_table,
            show_chart,
        }
    }

    pub fn table(field: impl Into<String>) -> Self {
        Self::new(field, true, false)
    }

    pub fn chart(field: impl Into<String>) -> Self {
        Self::new(field, false, true)
    }

    /// At least one of table/chart is requested
    pub fn is_active(&self) -> bool {
        self.show_table || self.show_chart
    }
}

/// A single `dimension = value` selection from the filter pickers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KvOption {
    pub key: String,
    pub value: String,
}

impl KvOption {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl FromStr for KvOption {
    type Err = String;

    /// Parses `key=value`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            return Err(format!("expected key=value, got '{s}'"));
        }
        Ok(Self::new(key, value))
    }
}

/// Collapse ordered pairs into `key -> [values]`, keeping first-seen value order.
fn collapse(pairs: &[KvOption]) -> ValueSets {
    pairs.iter().fold(ValueSets::new(), |mut acc, kv| {
        acc.entry(kv.key.clone()).or_default().push(kv.value.clone());
        acc
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Control Bar State (editable draft)
// ─────────────────────────────────────────────────────────────────────────────

/// Draft query parameters as edited in the control bar and stored in presets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControlBarState {
    pub asof_date: Option<NaiveDate>,
    pub prev_date: Option<NaiveDate>,
    pub filters: Vec<KvOption>,
    pub exclusions: Vec<KvOption>,
    pub chart_window: ChartWindow,
    pub measure: Option<String>,
    pub field_configs: Vec<FieldConfig>,
}

impl ControlBarState {
    /// Set the table/chart flags for a field.
    ///
    /// Unknown fields are appended at the end. A field left with neither flag
    /// is removed, so the list only ever holds active fields.
    pub fn set_field(&mut self, field: &str, show_table: bool, show_chart: bool) {
        match self.field_configs.iter_mut().find(|c| c.field == field) {
            Some(config) => {
                config.show_table = show_table;
                config.show_chart = show_chart;
            }
            None => self
                .field_configs
                .push(FieldConfig::new(field, show_table, show_chart)),
        }
        self.field_configs.retain(FieldConfig::is_active);
    }

    /// Move a field config from one position to another (drag-reorder).
    /// Out-of-range indices leave the order unchanged.
    pub fn move_field(&mut self, from: usize, to: usize) {
        if from >= self.field_configs.len() || to >= self.field_configs.len() {
            return;
        }
        let moved = self.field_configs.remove(from);
        self.field_configs.insert(to, moved);
    }

    /// Freeze the draft into an immutable snapshot for one Apply.
    pub fn to_snapshot(&self) -> Result<QuerySnapshot, SnapshotError> {
        QuerySnapshot::new(
            self.asof_date,
            self.prev_date,
            collapse(&self.filters),
            collapse(&self.exclusions),
            self.chart_window,
            self.measure.clone(),
            self.field_configs.clone(),
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Query Snapshot (immutable, one per Apply)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("field '{0}' is configured more than once")]
    DuplicateField(String),
}

/// Applied query parameters.
///
/// Fields are private so a snapshot can only be built through [`QuerySnapshot::new`],
/// which enforces unique field ids. Nothing mutates a snapshot after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySnapshot {
    asof_date: Option<NaiveDate>,
    prev_date: Option<NaiveDate>,
    filters: ValueSets,
    exclusions: ValueSets,
    chart_window: ChartWindow,
    measure: Option<String>,
    field_configs: Vec<FieldConfig>,
}

impl QuerySnapshot {
    pub fn new(
        asof_date: Option<NaiveDate>,
        prev_date: Option<NaiveDate>,
        filters: ValueSets,
        exclusions: ValueSets,
        chart_window: ChartWindow,
        measure: Option<String>,
        field_configs: Vec<FieldConfig>,
    ) -> Result<Self, SnapshotError> {
        for (i, config) in field_configs.iter().enumerate() {
            if field_configs[..i].iter().any(|c| c.field == config.field) {
                return Err(SnapshotError::DuplicateField(config.field.clone()));
            }
        }
        Ok(Self {
            asof_date,
            prev_date,
            filters,
            exclusions,
            chart_window,
            measure,
            field_configs,
        })
    }

    /// Snapshot with only field configs set (no dates, filters or measure)
    pub fn with_fields(field_configs: Vec<FieldConfig>) -> Result<Self, SnapshotError> {
        Self::new(
            None,
            None,
            ValueSets::new(),
            ValueSets::new(),
            ChartWindow::default(),
            None,
            field_configs,
        )
    }

    pub fn asof_date(&self) -> Option<NaiveDate> {
        self.asof_date
    }

    pub fn prev_date(&self) -> Option<NaiveDate> {
        self.prev_date
    }

    pub fn filters(&self) -> &ValueSets {
        &self.filters
    }

    pub fn exclusions(&self) -> &ValueSets {
        &self.exclusions
    }

    pub fn chart_window(&self) -> ChartWindow {
        self.chart_window
    }

    pub fn measure(&self) -> Option<&str> {
        self.measure.as_deref()
    }

    pub fn field_configs(&self) -> &[FieldConfig] {
        &self.field_configs
    }
}
