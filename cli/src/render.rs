//! Plain-text rendering of the applied parameters and a settled panel board.
//!
//! Each panel prints its table section and then its trend section, skipping
//! whichever kind was not requested.

use std::collections::BTreeMap;

use dashboard_core::{PanelBoard, SliceView, derive_panels};
use dashboard_types::formatting::format_compact;
use dashboard_types::{
    CatalogField, FlatRow, QuerySnapshot, TableColumnConfig, TrendPoint, ValueSets, table_columns,
};

pub const EMPTY_MESSAGE: &str = "Select fields and apply.";

/// Measure used for column labels when none is selected
const LABEL_MEASURE: &str = "revenue";

const SPARK_BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One line per non-empty parameter group, as shown above the panels.
pub fn applied_params(snapshot: &QuerySnapshot, catalog: &[CatalogField]) -> String {
    let mut lines = Vec::new();
    if let Some(date) = snapshot.asof_date() {
        lines.push(format!("AsOf     {date}"));
    }
    if let Some(date) = snapshot.prev_date() {
        lines.push(format!("Prev     {date}"));
    }
    if let Some(measure) = snapshot.measure() {
        lines.push(format!("Measure  {}", CatalogField::label_for(catalog, measure)));
    }

    let showing: Vec<String> = derive_panels(snapshot)
        .iter()
        .map(|p| {
            let kinds = match (p.wants_table, p.wants_chart) {
                (true, true) => "T+C",
                (true, false) => "T",
                _ => "C",
            };
            format!("{} ({kinds})", CatalogField::label_for(catalog, &p.field))
        })
        .collect();
    if !showing.is_empty() {
        lines.push(format!("Showing  {}", showing.join(", ")));
    }

    let chips = |sets: &ValueSets, prefix: &str| -> Vec<String> {
        sets.iter()
            .flat_map(|(key, values)| values.iter().map(move |v| format!("{prefix}{key}: {v}")))
            .collect()
    };
    let filters = chips(snapshot.filters(), "");
    if !filters.is_empty() {
        lines.push(format!("Filters  {}", filters.join(", ")));
    }
    let exclusions = chips(snapshot.exclusions(), "-");
    if !exclusions.is_empty() {
        lines.push(format!("Excl     {}", exclusions.join(", ")));
    }
    lines.join("\n")
}

pub fn render_board(
    board: &PanelBoard,
    snapshot: &QuerySnapshot,
    catalog: &[CatalogField],
    european: bool,
) -> String {
    if board.is_empty() {
        return EMPTY_MESSAGE.to_string();
    }
    let measure = snapshot.measure().unwrap_or(LABEL_MEASURE);
    let window = snapshot.chart_window().label();

    let mut sections = Vec::new();
    for (panel, state) in board.iter() {
        let label = CatalogField::label_for(catalog, &panel.field);
        if let Some(body) = slice_body(state.table_view(), |rows| {
            let columns = table_columns(&panel.field, label, measure);
            render_table(&columns, rows, european)
        }) {
            sections.push(format!("{label} — DoD Comparison\n{body}"));
        }
        if let Some(body) = slice_body(state.chart_view(), |points| {
            render_trend(points, european)
        }) {
            sections.push(format!("{label} — Trend ({window})\n{body}"));
        }
    }
    sections.join("\n\n")
}

/// Body text for one slice, or `None` when the slice was not requested
fn slice_body<T>(view: SliceView<'_, T>, populated: impl FnOnce(&[T]) -> String) -> Option<String> {
    match view {
        SliceView::Absent => None,
        SliceView::Loading => Some("  Loading...".to_string()),
        SliceView::Error(message) => Some(format!("  Error: {message}")),
        SliceView::Empty => Some("  No data.".to_string()),
        SliceView::Populated(items) => Some(populated(items)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Comparison table
// ─────────────────────────────────────────────────────────────────────────────

fn render_table(columns: &TableColumnConfig, rows: &[FlatRow], european: bool) -> String {
    let mut header: Vec<String> = columns
        .dimensions
        .iter()
        .map(|d| d.header_name.clone())
        .collect();
    header.extend(columns.measures.iter().map(|m| m.header_name.clone()));

    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let dims = columns.dimensions.iter().map(|d| {
                row.get(&d.field)
                    .map(ToString::to_string)
                    .unwrap_or_default()
            });
            let measures = columns.measures.iter().map(|m| {
                row.get(&m.field)
                    .and_then(|v| v.as_f64())
                    .map(|v| m.formatter.format(v, european))
                    .unwrap_or_else(|| "-".to_string())
            });
            dims.chain(measures).collect()
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let dim_count = columns.dimensions.len();
    let line = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &w))| {
                if i < dim_count {
                    format!("{cell:<w$}")
                } else {
                    format!("{cell:>w$}")
                }
            })
            .collect();
        format!("  {}", padded.join("  ").trim_end())
    };

    let mut out = vec![line(&header)];
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push(line(&rule));
    out.extend(body.iter().map(|row| line(row)));
    out.join("\n")
}

// ─────────────────────────────────────────────────────────────────────────────
// Trend summary
// ─────────────────────────────────────────────────────────────────────────────

fn render_trend(points: &[TrendPoint], european: bool) -> String {
    // Category -> values in date order
    let mut series: BTreeMap<&str, Vec<(&str, f64)>> = BTreeMap::new();
    for p in points {
        series
            .entry(p.category.as_str())
            .or_default()
            .push((p.date.as_str(), p.value));
    }

    let width = series.keys().map(|c| c.chars().count()).max().unwrap_or(0);
    series
        .into_iter()
        .map(|(category, mut values)| {
            values.sort_by(|a, b| a.0.cmp(b.0));
            let nums: Vec<f64> = values.iter().map(|(_, v)| *v).collect();
            let (min, max) = min_max(&nums);
            let last = nums.last().copied().unwrap_or_default();
            format!(
                "  {:<width$}  {}  last {}  min {}  max {}",
                category,
                sparkline(&nums),
                format_compact(last, european),
                format_compact(min, european),
                format_compact(max, european),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })
        .unwrap_or_default()
}

fn sparkline(values: &[f64]) -> String {
    let (min, max) = min_max(values);
    let range = max - min;
    values
        .iter()
        .map(|&v| {
            if range <= f64::EPSILON {
                return SPARK_BARS[SPARK_BARS.len() / 2];
            }
            let idx = ((v - min) / range * (SPARK_BARS.len() - 1) as f64).round() as usize;
            SPARK_BARS[idx.min(SPARK_BARS.len() - 1)]
        })
        .collect()
}
