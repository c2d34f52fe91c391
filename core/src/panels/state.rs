//! Per-panel view state and the reconciliation step that folds a fetch
//! outcome into it.

use std::fmt;

use dashboard_types::{FlatRow, TrendPoint};
use hashbrown::HashMap;

use super::derive::PanelDescriptor;

/// Which half of a panel a fetch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Table,
    Chart,
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelKind::Table => f.write_str("table"),
            PanelKind::Chart => f.write_str("chart"),
        }
    }
}

/// Result of one fetch. Failures carry the message shown on the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Table(Result<Vec<FlatRow>, String>),
    Chart(Result<Vec<TrendPoint>, String>),
}

impl FetchOutcome {
    pub fn kind(&self) -> PanelKind {
        match self {
            FetchOutcome::Table(_) => PanelKind::Table,
            FetchOutcome::Chart(_) => PanelKind::Chart,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Panel State
// ─────────────────────────────────────────────────────────────────────────────

/// View state of one field's panel.
///
/// `None` data means the view was never requested for this run; `Some(vec![])`
/// means it was requested and either has not arrived yet or came back empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PanelState {
    pub table: Option<Vec<FlatRow>>,
    pub chart: Option<Vec<TrendPoint>>,
    pub table_loading: bool,
    pub chart_loading: bool,
    /// Failure message of the table fetch, shown only on the table slice
    pub table_error: Option<String>,
    pub chart_error: Option<String>,
}

impl PanelState {
    /// Fresh state for the start of a run
    pub fn initial(descriptor: &PanelDescriptor) -> Self {
        Self {
            table: descriptor.wants_table.then(Vec::new),
            chart: descriptor.wants_chart.then(Vec::new),
            table_loading: descriptor.wants_table,
            chart_loading: descriptor.wants_chart,
            table_error: None,
            chart_error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.table_loading || self.chart_loading
    }

    /// Panel-level error: the table's message if it failed, else the chart's
    pub fn error(&self) -> Option<&str> {
        self.table_error.as_deref().or(self.chart_error.as_deref())
    }

    pub fn table_view(&self) -> SliceView<'_, FlatRow> {
        SliceView::classify(
            self.table.as_deref(),
            self.table_loading,
            self.table_error.as_deref(),
        )
    }

    pub fn chart_view(&self) -> SliceView<'_, TrendPoint> {
        SliceView::classify(
            self.chart.as_deref(),
            self.chart_loading,
            self.chart_error.as_deref(),
        )
    }
}

/// What a renderer should show for one (field, kind) slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SliceView<'a, T> {
    /// This kind was not requested for the panel
    Absent,
    Loading,
    Error(&'a str),
    Empty,
    Populated(&'a [T]),
}

impl<'a, T> SliceView<'a, T> {
    fn classify(data: Option<&'a [T]>, loading: bool, error: Option<&'a str>) -> Self {
        match (data, error) {
            (None, _) => SliceView::Absent,
            (Some(_), _) if loading => SliceView::Loading,
            (Some(_), Some(message)) => SliceView::Error(message),
            (Some([]), None) => SliceView::Empty,
            (Some(rows), None) => SliceView::Populated(rows),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Panel Board
// ─────────────────────────────────────────────────────────────────────────────

/// All panel state for one run: ordered descriptors plus state keyed by field.
///
/// The orchestrator replaces the whole board at the start of every run;
/// renderers only ever see clones.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PanelBoard {
    generation: u64,
    panels: Vec<PanelDescriptor>,
    states: HashMap<String, PanelState>,
}

impl PanelBoard {
    /// Board for a new run with every requested slice loading
    pub fn initial(generation: u64, panels: Vec<PanelDescriptor>) -> Self {
        let states = panels
            .iter()
            .map(|p| (p.field.clone(), PanelState::initial(p)))
            .collect();
        Self {
            generation,
            panels,
            states,
        }
    }

    /// Empty board that keeps the last generation number
    pub fn cleared(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    /// Generation of the run that produced this board
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn panels(&self) -> &[PanelDescriptor] {
        &self.panels
    }

    pub fn get(&self, field: &str) -> Option<&PanelState> {
        self.states.get(field)
    }

    /// Panels with their state, in display order
    pub fn iter(&self) -> impl Iterator<Item = (&PanelDescriptor, &PanelState)> {
        self.panels
            .iter()
            .filter_map(|p| self.states.get(&p.field).map(|s| (p, s)))
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_loading(&self) -> bool {
        self.states.values().any(PanelState::is_loading)
    }
}

/// Fold one fetch outcome into the board.
///
/// Only the `(field, kind)` slice named by the outcome changes: success stores
/// the payload, failure records the error. Either way that kind stops loading.
/// The other kind's data is never touched. Unknown fields leave the board as is.
pub fn apply_result(mut board: PanelBoard, field: &str, outcome: FetchOutcome) -> PanelBoard {
    let Some(state) = board.states.get_mut(field) else {
        return board;
    };
    match outcome {
        FetchOutcome::Table(Ok(rows)) => {
            state.table = Some(rows);
            state.table_loading = false;
        }
        FetchOutcome::Chart(Ok(points)) => {
            state.chart = Some(points);
            state.chart_loading = false;
        }
        FetchOutcome::Table(Err(message)) => {
            state.table_loading = false;
            state.table_error = Some(message);
        }
        FetchOutcome::Chart(Err(message)) => {
            state.chart_loading = false;
            state.chart_error = Some(message);
        }
    }
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_types::CellValue;

    fn descriptor(field: &str, wants_table: bool, wants_chart: bool) -> PanelDescriptor {
        PanelDescriptor {
            field: field.to_string(),
            wants_table,
            wants_chart,
        }
    }

    fn row(region: &str, value: f64) -> FlatRow {
        FlatRow::from([
            ("region".to_string(), CellValue::Text(region.to_string())),
            ("asofValue".to_string(), CellValue::Number(value)),
        ])
    }

    fn point(category: &str, value: f64) -> TrendPoint {
        TrendPoint {
            date: "2024-01-15".to_string(),
            category: category.to_string(),
            value,
        }
    }

    #[test]
    fn test_initial_state_matches_wants() {
        let table_only = PanelState::initial(&descriptor("region", true, false));
        assert_eq!(table_only.table, Some(vec![]));
        assert_eq!(table_only.chart, None);
        assert!(table_only.table_loading);
        assert!(!table_only.chart_loading);
        assert_eq!(table_only.error(), None);
    }

    #[test]
    fn test_apply_table_success() {
        let board = PanelBoard::initial(1, vec![descriptor("region", true, true)]);
        let board = apply_result(board, "region", FetchOutcome::Table(Ok(vec![row("EMEA", 1.0)])));
        let state = board.get("region").unwrap();
        assert_eq!(state.table.as_ref().map(Vec::len), Some(1));
        assert!(!state.table_loading);
        assert!(state.chart_loading);
        assert!(board.is_loading());
    }

    #[test]
    fn test_table_failure_keeps_chart_data() {
        let board = PanelBoard::initial(1, vec![descriptor("region", true, true)]);
        let board = apply_result(board, "region", FetchOutcome::Chart(Ok(vec![point("EMEA", 5.0)])));
        let board = apply_result(board, "region", FetchOutcome::Table(Err("boom".into())));
        let state = board.get("region").unwrap();
        assert_eq!(state.chart, Some(vec![point("EMEA", 5.0)]));
        assert_eq!(state.error(), Some("boom"));
        assert_eq!(state.chart_error, None);
        assert!(!state.table_loading);
        assert_eq!(state.table_view(), SliceView::Error("boom"));
        assert!(matches!(state.chart_view(), SliceView::Populated(p) if p.len() == 1));
    }

    #[test]
    fn test_each_kind_keeps_its_own_failure_message() {
        let board = PanelBoard::initial(1, vec![descriptor("region", true, true)]);
        let board = apply_result(board, "region", FetchOutcome::Table(Err("table 500".into())));
        let board = apply_result(board, "region", FetchOutcome::Chart(Err("chart timeout".into())));
        let state = board.get("region").unwrap();
        assert_eq!(state.table_view(), SliceView::Error("table 500"));
        assert_eq!(state.chart_view(), SliceView::Error("chart timeout"));
        assert_eq!(state.error(), Some("table 500"));
    }

    #[test]
    fn test_chart_failure_leaves_table_populated() {
        let board = PanelBoard::initial(1, vec![descriptor("region", true, true)]);
        let board = apply_result(board, "region", FetchOutcome::Table(Ok(vec![row("EMEA", 1.0)])));
        let board = apply_result(board, "region", FetchOutcome::Chart(Err("chart timeout".into())));
        let state = board.get("region").unwrap();
        assert!(matches!(state.table_view(), SliceView::Populated(r) if r.len() == 1));
        assert_eq!(state.error(), Some("chart timeout"));
    }

    #[test]
    fn test_apply_unknown_field_is_noop() {
        let board = PanelBoard::initial(3, vec![descriptor("region", true, false)]);
        let before = board.clone();
        let after = apply_result(board, "product", FetchOutcome::Table(Ok(vec![])));
        assert_eq!(after, before);
    }

    #[test]
    fn test_slice_views() {
        let mut state = PanelState::initial(&descriptor("region", true, false));
        assert_eq!(state.table_view(), SliceView::Loading);
        assert_eq!(state.chart_view(), SliceView::Absent);

        state.table_loading = false;
        assert_eq!(state.table_view(), SliceView::Empty);

        state.table = Some(vec![row("AMER", 2.0)]);
        assert!(matches!(state.table_view(), SliceView::Populated(_)));
    }

    #[test]
    fn test_board_iter_follows_descriptor_order() {
        let board = PanelBoard::initial(
            1,
            vec![
                descriptor("z", true, false),
                descriptor("a", false, true),
                descriptor("m", true, true),
            ],
        );
        let order: Vec<_> = board.iter().map(|(p, _)| p.field.as_str()).collect();
        assert_eq!(order, ["z", "a", "m"]);
        assert_eq!(board.len(), 3);
    }
}
