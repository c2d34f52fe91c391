mod commands;
mod logging;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::{ApplyArgs, PresetCommand};
use dashboard_core::AppConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), String> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_path(path),
        None => AppConfig::load(),
    }
    .map_err(|e| e.to_string())?;
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }

    let _log_guard = logging::init_logging(&config);

    // Panel fetches are spawned as local tasks
    tokio::task::LocalSet::new()
        .run_until(respond(cli.command, config, cli.config))
        .await
}

#[derive(Parser)]
#[command(version, about = "Day-over-day comparison dashboard")]
struct Cli {
    /// Config file to use instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Query server URL, overriding the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one query and print every active panel
    Apply(ApplyArgs),
    /// List catalog fields and filter values
    Catalog,
    /// Manage saved presets
    #[command(subcommand)]
    Presets(PresetCommand),
    /// Show the effective configuration
    Config,
}

async fn respond(
    command: Commands,
    config: AppConfig,
    config_path: Option<PathBuf>,
) -> Result<(), String> {
    match command {
        Commands::Apply(args) => commands::apply(&args, &config).await,
        Commands::Catalog => commands::catalog(&config).await,
        Commands::Presets(cmd) => commands::presets(cmd, &config),
        Commands::Config => commands::show_config(&config, config_path.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_types::ChartWindow;

    #[test]
    fn test_parse_apply_flags() {
        let cli = Cli::try_parse_from([
            "dashboard",
            "apply",
            "--asof",
            "2024-02-14",
            "--prev",
            "2024-02-13",
            "--filter",
            "region=EMEA",
            "--filter",
            "region=APAC",
            "--window",
            "1y",
            "--table",
            "region",
            "--chart",
            "region",
            "--chart",
            "product",
        ])
        .unwrap();
        let Commands::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(args.query.filter.len(), 2);
        assert_eq!(args.query.window, Some(ChartWindow::OneYear));
        assert_eq!(args.query.chart, ["region", "product"]);
        assert!(args.preset.is_none());
    }

    #[test]
    fn test_rejects_malformed_filter() {
        assert!(Cli::try_parse_from(["dashboard", "apply", "--filter", "region"]).is_err());
    }

    #[test]
    fn test_global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["dashboard", "presets", "list", "--config", "/tmp/d.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/d.toml")));
        assert!(matches!(cli.command, Commands::Presets(PresetCommand::List)));
    }
}
