use std::path::PathBuf;

use dashboard_core::AppConfig;
use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "dashboard.log";
const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

/// Install the global subscriber.
///
/// Logs go to a size-rolled file when `DASHBOARD_LOG_DIR` or `log_dir` is set,
/// otherwise to stderr so they never mix with rendered output. The returned
/// guard flushes the file writer on drop and must be held until exit.
pub fn init_logging(config: &AppConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    let log_dir = std::env::var("DASHBOARD_LOG_DIR")
        .ok()
        .or_else(|| config.log_dir.clone());

    if let Some(dir) = log_dir.map(PathBuf::from) {
        let appender = std::fs::create_dir_all(&dir).and_then(|_| {
            BasicRollingFileAppender::new(
                dir.join(LOG_FILE),
                RollingConditionBasic::new().max_size(MAX_LOG_BYTES),
                MAX_LOG_FILES,
            )
        });
        match appender {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(writer)
                    .init();
                return Some(guard);
            }
            Err(e) => eprintln!("Failed to open log directory {}: {}", dir.display(), e),
        }
    }

    // Fallback to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
    None
}
