//! Application configuration, persisted as TOML through `confy`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "comparison-dashboard";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Query server root, without trailing slash
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Upper bound on concurrent panel fetches; 0 means unbounded
    pub max_in_flight: usize,
    /// Measure sent when the snapshot has none selected
    pub default_measure: String,
    /// Swap `.` and `,` in rendered numbers
    pub european_numbers: bool,
    pub log_dir: Option<String>,
    pub presets_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5010".to_string(),
            request_timeout_secs: 30,
            max_in_flight: 8,
            default_measure: "total_revenue".to_string(),
            european_numbers: false,
            log_dir: None,
            presets_path: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("configuration error: {0}")]
pub struct ConfigError(#[from] confy::ConfyError);

impl AppConfig {
    /// Load from the platform config directory, creating defaults on first run
    pub fn load() -> Result<Self, ConfigError> {
        Ok(confy::load(APP_NAME, None)?)
    }

    pub fn load_path(path: &Path) -> Result<Self, ConfigError> {
        Ok(confy::load_path(path)?)
    }

    pub fn store(&self) -> Result<(), ConfigError> {
        Ok(confy::store(APP_NAME, None, self)?)
    }

    pub fn store_path(&self, path: &Path) -> Result<(), ConfigError> {
        Ok(confy::store_path(path, self)?)
    }

    /// Location of the TOML file [`AppConfig::load`] reads
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(confy::get_configuration_file_path(APP_NAME, None)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configured presets file, or `<config dir>/comparison-dashboard/presets.json`
    pub fn presets_path(&self) -> Option<PathBuf> {
        match &self.presets_path {
            Some(path) => Some(PathBuf::from(path)),
            None => dirs::config_dir().map(|p| p.join(APP_NAME).join("presets.json")),
        }
    }
}
