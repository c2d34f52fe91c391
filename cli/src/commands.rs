use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use dashboard_core::{AppConfig, CatalogSource, HttpGateway, PanelDriver, PresetStore};
use dashboard_types::{ChartWindow, ControlBarState, FieldConfig, KvOption};

use crate::render;

/// Query parameters shared by `apply` and `presets save`
#[derive(Args, Debug, Default)]
pub struct QueryArgs {
    /// As-of date (YYYY-MM-DD)
    #[arg(long)]
    pub asof: Option<NaiveDate>,

    /// Comparison date (YYYY-MM-DD)
    #[arg(long)]
    pub prev: Option<NaiveDate>,

    /// Include only rows where key=value; repeat to add values
    #[arg(long)]
    pub filter: Vec<KvOption>,

    /// Drop rows where key=value
    #[arg(long)]
    pub exclude: Vec<KvOption>,

    /// Trend window: 30d, 60d, 90d or 1Y
    #[arg(long)]
    pub window: Option<ChartWindow>,

    #[arg(long)]
    pub measure: Option<String>,

    /// Field to show as a comparison table
    #[arg(long)]
    pub table: Vec<String>,

    /// Field to show as a trend chart
    #[arg(long)]
    pub chart: Vec<String>,
}

impl QueryArgs {
    /// Overlay the given flags on `state`. List flags replace, they never append.
    pub fn apply_to(&self, state: &mut ControlBarState) {
        if self.asof.is_some() {
            state.asof_date = self.asof;
        }
        if self.prev.is_some() {
            state.prev_date = self.prev;
        }
        if !self.filter.is_empty() {
            state.filters = self.filter.clone();
        }
        if !self.exclude.is_empty() {
            state.exclusions = self.exclude.clone();
        }
        if let Some(window) = self.window {
            state.chart_window = window;
        }
        if self.measure.is_some() {
            state.measure = self.measure.clone();
        }
        if !self.table.is_empty() || !self.chart.is_empty() {
            state.field_configs = self.field_configs();
        }
    }

    /// Field configs in first-mention order, tables before charts
    fn field_configs(&self) -> Vec<FieldConfig> {
        let mut configs: Vec<FieldConfig> = Vec::new();
        for field in &self.table {
            if !configs.iter().any(|c| c.field == *field) {
                configs.push(FieldConfig::table(field.as_str()));
            }
        }
        for field in &self.chart {
            match configs.iter_mut().find(|c| c.field == *field) {
                Some(config) => config.show_chart = true,
                None => configs.push(FieldConfig::chart(field.as_str())),
            }
        }
        configs
    }
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Start from a saved preset (id or name) instead of the default preset
    #[arg(long)]
    pub preset: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum PresetCommand {
    /// List presets by group
    List,
    /// Save a query as a new preset
    Save {
        name: String,
        #[arg(long, default_value = "")]
        group: String,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Delete a preset by id or name
    Delete { preset: String },
    /// Toggle the default preset
    Default { preset: String },
}

fn open_presets(config: &AppConfig) -> Result<PresetStore, String> {
    let path = config
        .presets_path()
        .ok_or("no config directory for presets; set presets_path")?;
    Ok(PresetStore::open(path))
}

fn print(text: &str) -> Result<(), String> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}").map_err(|e| e.to_string())?;
    stdout.flush().map_err(|e| e.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Apply
// ─────────────────────────────────────────────────────────────────────────────

pub async fn apply(args: &ApplyArgs, config: &AppConfig) -> Result<(), String> {
    let store = open_presets(config)?;
    let mut state = match &args.preset {
        Some(name) => store
            .find(name)
            .map(|p| p.state.clone())
            .ok_or_else(|| format!("no preset with id or name '{name}'"))?,
        None => store
            .default_preset()
            .map(|p| p.state.clone())
            .unwrap_or_default(),
    };
    args.query.apply_to(&mut state);
    let snapshot = state.to_snapshot().map_err(|e| e.to_string())?;

    let gateway = HttpGateway::from_config(config).map_err(|e| e.to_string())?;
    let catalog = match gateway.catalog_fields().await {
        Ok(fields) => fields,
        Err(e) => {
            tracing::warn!("[CLI] Catalog unavailable, using raw field names: {}", e);
            Vec::new()
        }
    };
    let snapshot = Arc::new(snapshot);
    let summary = render::applied_params(&snapshot, &catalog);
    if !summary.is_empty() {
        print(&format!("{summary}\n"))?;
    }

    let driver = PanelDriver::new(gateway, config.max_in_flight);
    let run = driver.apply(Arc::clone(&snapshot));
    run.finished().await;

    print(&render::render_board(
        &driver.board(),
        &snapshot,
        &catalog,
        config.european_numbers,
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

pub async fn catalog(config: &AppConfig) -> Result<(), String> {
    let gateway = HttpGateway::from_config(config).map_err(|e| e.to_string())?;
    let fields = gateway.catalog_fields().await.map_err(|e| e.to_string())?;
    let options = gateway.filter_options().await.map_err(|e| e.to_string())?;

    let mut values: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for option in &options {
        values.entry(&option.key).or_default().push(&option.value);
    }

    let mut out = String::from("Fields:\n");
    let width = fields.iter().map(|f| f.field.len()).max().unwrap_or(0);
    for field in &fields {
        out.push_str(&format!(
            "  {:<width$}  {:<12}  {:?}\n",
            field.field, field.label, field.kind
        ));
    }
    out.push_str("\nFilter values:\n");
    for (key, vals) in &values {
        out.push_str(&format!("  {}: {}\n", key, vals.join(", ")));
    }
    print(out.trim_end())
}

// ─────────────────────────────────────────────────────────────────────────────
// Presets
// ─────────────────────────────────────────────────────────────────────────────

pub fn presets(command: PresetCommand, config: &AppConfig) -> Result<(), String> {
    let mut store = open_presets(config)?;
    match command {
        PresetCommand::List => {
            if store.presets().is_empty() {
                return print("No presets saved.");
            }
            let mut out = String::new();
            for (group, presets) in store.grouped() {
                out.push_str(&format!("{group}\n"));
                for preset in presets {
                    let fields: Vec<&str> = preset
                        .state
                        .field_configs
                        .iter()
                        .map(|c| c.field.as_str())
                        .collect();
                    out.push_str(&format!(
                        "  {} {}  [{}]  {}\n",
                        if preset.is_default { "*" } else { " " },
                        preset.name,
                        fields.join(", "),
                        preset.id
                    ));
                }
            }
            print(out.trim_end())
        }
        PresetCommand::Save { name, group, query } => {
            let mut state = ControlBarState::default();
            query.apply_to(&mut state);
            // Reject what apply would reject before persisting it
            state.to_snapshot().map_err(|e| e.to_string())?;
            let preset = store
                .save(&name, &group, state)
                .map_err(|e| e.to_string())?;
            print(&format!("Saved '{}' in {} ({})", preset.name, preset.group, preset.id))
        }
        PresetCommand::Delete { preset } => {
            let removed = store.delete(&preset).map_err(|e| e.to_string())?;
            print(&format!("Deleted '{}'", removed.name))
        }
        PresetCommand::Default { preset } => {
            let now_default = store.set_default(&preset).map_err(|e| e.to_string())?;
            if now_default {
                print(&format!("'{preset}' is now the default preset"))
            } else {
                print(&format!("'{preset}' is no longer the default preset"))
            }
        }
    }
}

pub fn show_config(config: &AppConfig, override_path: Option<&Path>) -> Result<(), String> {
    let path = match override_path {
        Some(path) => path.display().to_string(),
        None => AppConfig::default_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "<unavailable>".to_string()),
    };
    let presets = config
        .presets_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unavailable>".to_string());
    let max_in_flight = match config.max_in_flight {
        0 => "unbounded".to_string(),
        n => n.to_string(),
    };

    let lines = [
        format!("Config file:       {path}"),
        format!("Base URL:          {}", config.base_url),
        format!("Request timeout:   {}s", config.request_timeout_secs),
        format!("Max in flight:     {max_in_flight}"),
        format!("Default measure:   {}", config.default_measure),
        format!("European numbers:  {}", config.european_numbers),
        format!(
            "Log directory:     {}",
            config.log_dir.as_deref().unwrap_or("<stderr>")
        ),
        format!("Presets file:      {presets}"),
    ];
    print(&lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 2, d)
    }

    #[test]
    fn test_field_flags_merge_in_mention_order() {
        let args = QueryArgs {
            table: vec!["region".into(), "product".into()],
            chart: vec!["channel".into(), "region".into()],
            ..Default::default()
        };
        assert_eq!(
            args.field_configs(),
            vec![
                FieldConfig::new("region", true, true),
                FieldConfig::table("product"),
                FieldConfig::chart("channel"),
            ]
        );
    }

    #[test]
    fn test_flags_override_preset_state() {
        let mut state = ControlBarState {
            asof_date: date(10),
            prev_date: date(9),
            filters: vec![KvOption::new("region", "EMEA")],
            field_configs: vec![FieldConfig::table("region")],
            ..Default::default()
        };
        let args = QueryArgs {
            asof: date(14),
            chart: vec!["product".into()],
            ..Default::default()
        };
        args.apply_to(&mut state);

        assert_eq!(state.asof_date, date(14));
        assert_eq!(state.prev_date, date(9));
        assert_eq!(state.filters, vec![KvOption::new("region", "EMEA")]);
        assert_eq!(state.field_configs, vec![FieldConfig::chart("product")]);
    }

    #[test]
    fn test_no_flags_keep_state() {
        let mut state = ControlBarState {
            chart_window: ChartWindow::Days90,
            field_configs: vec![FieldConfig::table("region")],
            ..Default::default()
        };
        let before = state.clone();
        QueryArgs::default().apply_to(&mut state);
        assert_eq!(state, before);
    }
}
